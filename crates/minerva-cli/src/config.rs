use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Upload target used when `--target-url` is not given. `{space}` is
/// replaced by the mTeSS-X space name.
pub const DEFAULT_TARGET_TEMPLATE: &str = "https://{space}.tesshub.hzdr.de/";

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "minerva")]
#[command(
    author,
    version,
    about = "Harvest open educational resource metadata into a common schema"
)]
#[command(after_help = "Examples:
  minerva dalia sheets/ --similarities
  minerva tess --instance taxila
  minerva oersi --limit 1000
  minerva all --dalia sheets/ --include-oersi
  minerva search output/dalia/dalia-fts-sqlite.db \"research data\"")]
pub struct Config {
    /// Directory that receives one sub-directory per source
    #[arg(
        long,
        global = true,
        env = "MINERVA_OUTPUT_DIR",
        default_value = "output",
        value_name = "DIR"
    )]
    pub output_dir: PathBuf,

    /// Log at debug level, including skipped records
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Google Gemini API key, needed for embedding similarities
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert DALIA curation sheets (CSV or TSV)
    #[command(after_help = "Examples:
  minerva dalia curation.tsv
  minerva dalia sheets/ --similarities --embeddings
  minerva dalia sheets/ --grounder ror-names.tsv")]
    Dalia {
        /// Sheet files, or directories containing .csv/.tsv sheets
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Also write TF-IDF index and similarity files
        #[arg(long)]
        similarities: bool,

        /// Also write Gemini embedding index and similarity files
        #[arg(long)]
        embeddings: bool,

        /// TSV lexicon (name, ror) used to ground organization names
        #[arg(long, value_name = "TSV")]
        grounder: Option<PathBuf>,
    },
    /// Harvest learning materials from TeSS-family catalogs
    #[command(after_help = "Examples:
  minerva tess                          # Harvest all enabled instances
  minerva tess --instance taxila        # Harvest one instance by name
  minerva tess --config ~/custom.toml   # Use a custom instance registry")]
    Tess {
        /// Harvest a single instance by name from the registry
        #[arg(short, long, value_name = "NAME")]
        instance: Option<String>,

        /// Custom path to instances.toml
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// TSV lexicon (name, ror) used to ground author names
        #[arg(long, value_name = "TSV")]
        grounder: Option<PathBuf>,
    },
    /// Convert the OERSI NDJSON dump
    Oersi {
        /// Download the dump again even if it is cached
        #[arg(long)]
        force: bool,

        /// Stop after this many converted records
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Run every source in sequence and print a per-source summary
    #[command(after_help = "Example: minerva all --dalia sheets/ --include-oersi")]
    All {
        /// DALIA sheet files or directories
        #[arg(long, required = true, num_args = 1.., value_name = "PATH")]
        dalia: Vec<PathBuf>,

        /// Also convert the OERSI dump
        #[arg(long)]
        include_oersi: bool,

        /// Custom path to instances.toml
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// TSV lexicon (name, ror) used to ground organization names
        #[arg(long, value_name = "TSV")]
        grounder: Option<PathBuf>,
    },
    /// Upload exported materials to mTeSS-X spaces
    #[command(after_help = "Examples:
  TESS_EMAIL=me@example.org TESS_API_KEY=... minerva upload-tess --dalia sheets/ --test
  minerva upload-tess --dalia sheets/ --target-url https://{space}.example.org/")]
    UploadTess {
        /// DALIA sheet files or directories
        #[arg(long, required = true, num_args = 1.., value_name = "PATH")]
        dalia: Vec<PathBuf>,

        /// Send everything to the `test` space
        #[arg(long)]
        test: bool,

        /// Also upload OERSI records to the `oersi` space
        #[arg(long)]
        include_oersi: bool,

        /// Target URL template; `{space}` is replaced by the space name
        #[arg(long, default_value = DEFAULT_TARGET_TEMPLATE, value_name = "TEMPLATE")]
        target_url: String,

        /// Account email for the TeSS API
        #[arg(long, env = "TESS_EMAIL")]
        email: Option<String>,

        /// Account API token for the TeSS API
        #[arg(long, env = "TESS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Query a full-text index written by `minerva dalia`
    #[command(after_help = "Example: minerva search output/dalia/dalia-fts-sqlite.db \"version control\"")]
    Search {
        /// Path to the SQLite index
        #[arg(value_name = "INDEX")]
        index: PathBuf,
        /// Search query text
        query: String,
        /// Maximum number of results to return [default: 10]
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_parse_dalia() {
        let config = Config::try_parse_from([
            "minerva",
            "dalia",
            "a.tsv",
            "sheets",
            "--similarities",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        match config.command {
            Command::Dalia {
                paths,
                similarities,
                embeddings,
                grounder,
            } => {
                assert_eq!(paths, vec![PathBuf::from("a.tsv"), PathBuf::from("sheets")]);
                assert!(similarities);
                assert!(!embeddings);
                assert!(grounder.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dalia_requires_paths() {
        assert!(Config::try_parse_from(["minerva", "dalia"]).is_err());
    }

    #[test]
    fn test_parse_all_with_multiple_sheets() {
        let config = Config::try_parse_from([
            "minerva",
            "all",
            "--dalia",
            "a.csv",
            "b.tsv",
            "--include-oersi",
        ])
        .unwrap();
        match config.command {
            Command::All {
                dalia,
                include_oersi,
                ..
            } => {
                assert_eq!(dalia.len(), 2);
                assert!(include_oersi);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_upload_default_target() {
        let config =
            Config::try_parse_from(["minerva", "upload-tess", "--dalia", "a.csv", "--test"]).unwrap();
        match config.command {
            Command::UploadTess {
                test, target_url, ..
            } => {
                assert!(test);
                assert_eq!(target_url, DEFAULT_TARGET_TEMPLATE);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search() {
        let config =
            Config::try_parse_from(["minerva", "search", "index.db", "git basics", "-l", "3"])
                .unwrap();
        match config.command {
            Command::Search {
                index,
                query,
                limit,
            } => {
                assert_eq!(index, PathBuf::from("index.db"));
                assert_eq!(query, "git basics");
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_search_limit_is_optional() {
        let config = Config::try_parse_from(["minerva", "search", "index.db", "git"]).unwrap();
        assert!(matches!(config.command, Command::Search { limit: None, .. }));
    }

    #[test]
    fn test_tess_instance_and_verbose() {
        let config =
            Config::try_parse_from(["minerva", "tess", "--instance", "taxila", "-v"]).unwrap();
        assert!(config.verbose);
        assert!(matches!(
            config.command,
            Command::Tess { instance: Some(ref name), .. } if name == "taxila"
        ));
    }
}
