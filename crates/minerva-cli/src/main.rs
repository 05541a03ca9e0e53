use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use minerva_cli::pipeline::{self, OutputLayout};
use minerva_cli::{Command, Config};
use minerva_client::{GeminiClient, OersiDump, TessClient, OERSI_DUMP_URL};
use minerva_core::config::upload_target_url;
use minerva_core::jsonl::write_resources_jsonl;
use minerva_core::sources::dalia;
use minerva_core::{
    default_cache_dir, load_instances_config, AppError, BatchHarvestSummary, EducationalResource,
    Grounder, HarvestStats, HttpConfig, IndexConfig, InstanceEntry, NoGrounder,
    SimilarityConfig, SourceHarvestResult, TessConfig, TessCredentials, UnknownValues,
};
use minerva_db::FullTextIndex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for results)
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(config).await {
        match e.downcast_ref::<AppError>() {
            Some(app_error) => eprintln!("\nError: {}\n", app_error.user_message()),
            None => eprintln!("\nError: {:#}\n", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let layout = OutputLayout::new(&config.output_dir);
    let http = HttpConfig::default();
    let mut unknown = UnknownValues::new();

    match config.command {
        Command::Dalia {
            paths,
            similarities,
            embeddings,
            grounder,
        } => {
            let gemini = if embeddings {
                let key = config
                    .gemini_api_key
                    .as_deref()
                    .context("--embeddings needs a Gemini API key (GEMINI_API_KEY)")?;
                Some(GeminiClient::new(key, &http)?)
            } else {
                None
            };
            let grounder = pipeline::load_grounder(grounder.as_deref())?;
            run_dalia(
                &layout,
                &paths,
                grounder.as_ref(),
                similarities,
                gemini.as_ref(),
                &mut unknown,
            )
            .await?;
        }
        Command::Tess {
            instance,
            config: config_path,
            grounder,
        } => {
            let instances = select_instances(config_path.as_deref(), instance.as_deref())?;
            let grounder = pipeline::load_grounder(grounder.as_deref())?;
            let mut summary = BatchHarvestSummary::new();
            for entry in &instances {
                let result =
                    harvest_tess_instance(&layout, entry, &http, grounder.as_ref(), &mut unknown)
                        .await;
                summary.add(result);
            }
            print_batch_summary(&summary);
        }
        Command::Oersi { force, limit } => {
            let path = layout.jsonl("oersi");
            let (resources, stats) = load_oersi(&layout, &http, force, limit, &mut unknown).await?;
            write_resources_jsonl(&resources, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_source_result(&SourceHarvestResult::success("oersi", path, stats));
        }
        Command::All {
            dalia: dalia_paths,
            include_oersi,
            config: config_path,
            grounder,
        } => {
            let grounder = pipeline::load_grounder(grounder.as_deref())?;
            let instances = select_instances(config_path.as_deref(), None)?;
            let mut summary = BatchHarvestSummary::new();

            info!("Harvesting DALIA");
            let path = layout.jsonl("dalia");
            let result = match dalia::parse_paths(&dalia_paths, grounder.as_ref(), &mut unknown)
                .and_then(|resources| write_resources_jsonl(&resources, &path))
            {
                Ok(count) => SourceHarvestResult::success("dalia", path, processed(count)),
                Err(e) => SourceHarvestResult::failure("dalia", e.to_string()),
            };
            summary.add(result);

            for entry in &instances {
                info!("Harvesting TeSS instance {}", entry.name);
                let result =
                    harvest_tess_instance(&layout, entry, &http, grounder.as_ref(), &mut unknown)
                        .await;
                summary.add(result);
            }

            if include_oersi {
                info!("Harvesting OERSI");
                let path = layout.jsonl("oersi");
                let result = match load_oersi(&layout, &http, false, None, &mut unknown).await {
                    Ok((resources, stats)) => match write_resources_jsonl(&resources, &path) {
                        Ok(_) => SourceHarvestResult::success("oersi", path, stats),
                        Err(e) => SourceHarvestResult::failure("oersi", e.to_string()),
                    },
                    Err(e) => SourceHarvestResult::failure("oersi", e.to_string()),
                };
                summary.add(result);
            }

            print_batch_summary(&summary);
        }
        Command::UploadTess {
            dalia: dalia_paths,
            test,
            include_oersi,
            target_url,
            email,
            api_key,
        } => {
            let credentials = TessCredentials::new(email, api_key)?;

            let mut sources: Vec<(&str, Vec<EducationalResource>)> = Vec::new();
            let resources = dalia::parse_paths(&dalia_paths, &NoGrounder, &mut unknown)
                .context("Failed to read DALIA sheets")?;
            sources.push(("dalia", resources));
            if include_oersi {
                let (resources, _) = load_oersi(&layout, &http, false, None, &mut unknown).await?;
                sources.push(("oersi", resources));
            }

            let mut totals = HarvestStats::new();
            for (space, resources) in &sources {
                let space = if test { "test" } else { *space };
                let target = upload_target_url(&target_url, space);
                info!("Uploading {} resources to {}", resources.len(), target);
                let client = TessClient::new(space, &target, &http, &TessConfig::default())?;
                let stats = pipeline::upload_resources(resources, &client, &credentials).await;
                totals.merge(&stats);
            }

            println!("\nUpload complete");
            println!("  Uploaded:  {}", totals.processed);
            println!("  Skipped:   {}", totals.skipped);
            println!("  Failed:    {}", totals.failed);
        }
        Command::Search {
            index,
            query,
            limit,
        } => {
            search(&index, &query, limit).await?;
        }
    }

    print_unknown_values(&unknown);
    Ok(())
}

/// Converts DALIA sheets and writes the JSONL, full-text index and optional
/// similarity files.
async fn run_dalia(
    layout: &OutputLayout,
    paths: &[PathBuf],
    grounder: &dyn Grounder,
    similarities: bool,
    gemini: Option<&GeminiClient>,
    unknown: &mut UnknownValues,
) -> anyhow::Result<()> {
    let resources =
        dalia::parse_paths(paths, grounder, unknown).context("Failed to read DALIA sheets")?;
    if resources.is_empty() {
        warn!("No DALIA resources found in the given sheets");
    }

    let jsonl = layout.jsonl("dalia");
    write_resources_jsonl(&resources, &jsonl)
        .with_context(|| format!("Failed to write {}", jsonl.display()))?;
    info!("Wrote {} resources to {}", resources.len(), jsonl.display());

    let fts = layout.dalia_fts();
    pipeline::write_fts_index(&resources, &fts, &IndexConfig::default())
        .await
        .with_context(|| format!("Failed to build full-text index {}", fts.display()))?;
    info!("Wrote full-text index to {}", fts.display());

    let similarity_config = SimilarityConfig::default();
    if similarities {
        let (index_path, similarities_path) = layout.dalia_tfidf();
        pipeline::write_tfidf(&resources, &index_path, &similarities_path, &similarity_config)?;
    }
    if let Some(client) = gemini {
        let (index_path, similarities_path) = layout.dalia_embeddings();
        pipeline::write_embeddings(
            &resources,
            client,
            &index_path,
            &similarities_path,
            &similarity_config,
        )
        .await?;
    }

    print_source_result(&SourceHarvestResult::success(
        "dalia",
        jsonl,
        processed(resources.len()),
    ));
    Ok(())
}

/// Harvests one TeSS instance; failures are captured in the result.
async fn harvest_tess_instance(
    layout: &OutputLayout,
    entry: &InstanceEntry,
    http: &HttpConfig,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> SourceHarvestResult {
    let client = match TessClient::from_instance(entry, http, &TessConfig::default()) {
        Ok(client) => client,
        Err(e) => {
            error!("[{}] {}", entry.name, e);
            return SourceHarvestResult::failure(&entry.name, e.to_string());
        }
    };

    let path = layout.tess_jsonl(&entry.name);
    let outcome = match pipeline::harvest_tess(&client, grounder, unknown).await {
        Ok((resources, stats)) => write_resources_jsonl(&resources, &path).map(|_| stats),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(stats) => SourceHarvestResult::success(&entry.name, path, stats),
        Err(e) => {
            error!("[{}] harvest failed: {}", entry.name, e);
            SourceHarvestResult::failure(&entry.name, e.to_string())
        }
    }
}

async fn load_oersi(
    layout: &OutputLayout,
    http: &HttpConfig,
    force: bool,
    limit: Option<usize>,
    unknown: &mut UnknownValues,
) -> Result<(Vec<EducationalResource>, HarvestStats), AppError> {
    let cache_dir = default_cache_dir().unwrap_or_else(|| layout.source_dir(".cache"));
    let dump = OersiDump::new(OERSI_DUMP_URL, cache_dir, http)?;
    let path = dump.ensure(force).await?;
    pipeline::read_oersi(&path, limit, &NoGrounder, unknown)
}

/// Resolves which TeSS instances to harvest from the registry.
fn select_instances(
    config_path: Option<&Path>,
    name: Option<&str>,
) -> anyhow::Result<Vec<InstanceEntry>> {
    let registry = load_instances_config(config_path)?;
    match name {
        Some(name) => {
            let entry = registry.find_by_name(name).with_context(|| {
                let known: Vec<&str> = registry.instances.iter().map(|i| i.name.as_str()).collect();
                format!("Unknown TeSS instance '{}'. Known: {}", name, known.join(", "))
            })?;
            Ok(vec![entry.clone()])
        }
        None => Ok(registry.enabled_instances().cloned().collect()),
    }
}

fn processed(count: usize) -> HarvestStats {
    HarvestStats {
        processed: count,
        ..HarvestStats::default()
    }
}

/// Full-text query against an index written by `minerva dalia`.
async fn search(index_path: &Path, query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let config = IndexConfig::default();
    let limit = limit.unwrap_or(config.default_search_limit);
    info!("Searching for: '{}' (limit: {})", query, limit);

    let index = FullTextIndex::open(index_path, &config).await?;
    let results = index.search(query, limit).await?;
    index.close().await;

    if results.is_empty() {
        println!("\nNo results found for: \"{}\"\n", query);
        println!("Try:");
        println!("  • Using fewer or different keywords");
        println!("  • Rebuilding the index with: minerva dalia <sheets>");
    } else {
        println!("\nSearch Results for: \"{}\"\n", query);
        println!("Found {} matching resources:\n", results.len());
        for (i, hit) in results.iter().enumerate() {
            println!("{}. [{:.2}] {}", i + 1, hit.score, truncate_text(&hit.title, 100));
            println!("   {}", hit.key);
        }
        println!();
    }

    Ok(())
}

/// Truncate text to a maximum number of characters, adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        let truncated: String = cleaned.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

fn print_source_result(result: &SourceHarvestResult) {
    let stats = &result.stats;
    match &result.output {
        Some(path) => println!(
            "  ✓ {:<14} {:>7} records  ({} skipped, {} failed)  → {}",
            result.source_name,
            stats.processed,
            stats.skipped,
            stats.failed,
            path.display()
        ),
        None => println!(
            "  ✗ {:<14} {}",
            result.source_name,
            result.error.as_deref().unwrap_or("failed")
        ),
    }
}

fn print_batch_summary(summary: &BatchHarvestSummary) {
    println!("\nHarvest Summary\n");
    for result in &summary.results {
        print_source_result(result);
    }
    println!(
        "\n  Sources: {} succeeded, {} failed of {}",
        summary.successful_count(),
        summary.failed_count(),
        summary.total_sources()
    );
    println!("  Records: {}\n", summary.total_records());
}

/// Prints the unknown values seen during the run, one table per vocabulary.
fn print_unknown_values(unknown: &UnknownValues) {
    if unknown.is_empty() {
        return;
    }
    println!(
        "\nUnknown values ({} distinct, {} occurrences)",
        unknown.distinct(),
        unknown.total()
    );
    let mut current = "";
    for (vocabulary, value, count) in pipeline::unknown_value_rows(unknown) {
        if vocabulary != current {
            println!("\n  {}", vocabulary);
            current = vocabulary;
        }
        println!("    {:>6}  {}", count, value);
    }
    println!();
}
