//! JSON Lines output, one resource per line.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::models::EducationalResource;

/// Writes resources to `writer`, returning how many lines were written.
pub fn write_jsonl<W: Write>(
    resources: &[EducationalResource],
    mut writer: W,
) -> Result<usize, AppError> {
    for resource in resources {
        serde_json::to_writer(&mut writer, resource)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(resources.len())
}

/// Writes resources to a JSONL file, creating parent directories as needed.
pub fn write_resources_jsonl(
    resources: &[EducationalResource],
    path: &Path,
) -> Result<usize, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let written = write_jsonl(resources, BufWriter::new(file))?;
    tracing::info!("Wrote {} records to {}", written, path.display());
    Ok(written)
}
