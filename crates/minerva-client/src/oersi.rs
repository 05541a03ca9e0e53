//! Download and read the OERSI NDJSON dump.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use minerva_core::{AppError, HttpConfig};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::info;
use url::Url;

use crate::retry::{build_client, map_transport_error, send_with_retry};

pub const OERSI_DUMP_URL: &str = "https://oersi.org/dumps/oer_data.ndjson.gz";

const DUMP_FILENAME: &str = "oer_data.ndjson.gz";

/// Downloads the OERSI dump once and caches it on disk.
#[derive(Clone)]
pub struct OersiDump {
    client: Client,
    url: Url,
    cache_dir: PathBuf,
    http: HttpConfig,
}

impl OersiDump {
    pub fn new(url: &str, cache_dir: PathBuf, http: &HttpConfig) -> Result<Self, AppError> {
        let url = Url::parse(url)
            .map_err(|_| AppError::InvalidUrl(format!("Invalid OERSI dump URL: {}", url)))?;
        Ok(Self {
            client: build_client(http)?,
            url,
            cache_dir,
            http: http.clone(),
        })
    }

    /// Path of the cached dump, whether or not it has been downloaded yet.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(DUMP_FILENAME)
    }

    /// Returns the cached dump, downloading it first if missing or if `force` is set.
    ///
    /// The body is streamed to a `.part` file which is renamed into place only
    /// once complete, so an interrupted download is never mistaken for a dump.
    pub async fn ensure(&self, force: bool) -> Result<PathBuf, AppError> {
        let path = self.cache_path();
        if path.exists() && !force {
            info!("Using cached OERSI dump at {}", path.display());
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let partial = path.with_extension("gz.part");

        info!("Downloading OERSI dump from {}", self.url);
        let mut resp = send_with_retry(|| self.client.get(self.url.clone()), &self.http, true).await?;

        let mut file = tokio::fs::File::create(&partial).await?;
        let mut bytes = 0usize;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| map_transport_error(e, &self.http))?
        {
            file.write_all(&chunk).await?;
            bytes += chunk.len();
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, &path).await?;
        info!("Saved {} bytes to {}", bytes, path.display());
        Ok(path)
    }
}

/// Line iterator over a gzip-compressed NDJSON file.
///
/// Blank lines are skipped.
pub struct DumpLines {
    lines: Lines<BufReader<GzDecoder<File>>>,
}

impl Iterator for DumpLines {
    type Item = Result<String, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Some(Ok(line)),
                Err(e) => return Some(Err(AppError::IoError(e))),
            }
        }
    }
}

/// Opens a gzip-compressed NDJSON dump for line-by-line reading.
pub fn open_dump(path: &Path) -> Result<DumpLines, AppError> {
    let file = File::open(path)?;
    Ok(DumpLines {
        lines: BufReader::new(GzDecoder::new(file)).lines(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_gz(path: &Path, text: &str) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_open_dump_reads_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DUMP_FILENAME);
        write_gz(&path, "{\"name\": \"a\"}\n\n{\"name\": \"b\"}\n");

        let lines: Vec<String> = open_dump(&path).unwrap().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["{\"name\": \"a\"}", "{\"name\": \"b\"}"]);
    }

    #[test]
    fn test_open_missing_dump() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            open_dump(&dir.path().join("missing.gz")),
            Err(AppError::IoError(_))
        ));
    }

    #[test]
    fn test_corrupt_dump_yields_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.gz");
        std::fs::write(&path, b"definitely not gzip").unwrap();
        let first = open_dump(&path).unwrap().next();
        assert!(matches!(first, Some(Err(AppError::IoError(_)))));
    }

    #[tokio::test]
    async fn test_ensure_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let dump = OersiDump::new(OERSI_DUMP_URL, dir.path().to_path_buf(), &HttpConfig::default())
            .unwrap();
        write_gz(&dump.cache_path(), "{}\n");

        let path = dump.ensure(false).await.unwrap();
        assert_eq!(path, dir.path().join(DUMP_FILENAME));
    }

    #[test]
    fn test_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        assert!(OersiDump::new("::", dir.path().to_path_buf(), &HttpConfig::default()).is_err());
    }
}
