//! Schema download and on-disk caching.
//!
//! Uses `ureq` for synchronous, streamed HTTP GETs. A cached file is never
//! re-downloaded; downloads land in a `.part` file that is renamed into
//! place only once complete, so an interrupted download never leaves a
//! truncated schema behind.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use super::SchemaResult;
use crate::error::SchemaError;

/// Something that can stream the bytes behind a URL into a writer.
pub trait SchemaSource: Send + Sync {
    /// Stream the body of `url` into `sink`, returning the byte count.
    fn fetch_to(&self, url: &str, sink: &mut dyn Write) -> SchemaResult<u64>;
}

/// HTTP source backed by a `ureq` agent.
pub struct HttpSchemaSource {
    agent: ureq::Agent,
}

impl HttpSchemaSource {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl SchemaSource for HttpSchemaSource {
    fn fetch_to(&self, url: &str, sink: &mut dyn Write) -> SchemaResult<u64> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SchemaError::Download {
                url: url.to_string(),
                message: "URL must start with http:// or https://".into(),
            });
        }

        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(SchemaError::Download {
                    url: url.to_string(),
                    message: format!("HTTP status {code}"),
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(SchemaError::Download {
                    url: url.to_string(),
                    message: transport.to_string(),
                });
            }
        };

        let mut reader = response.into_reader();
        std::io::copy(&mut reader, sink).map_err(|e| SchemaError::Download {
            url: url.to_string(),
            message: format!("stream interrupted: {e}"),
        })
    }
}

/// In-memory source for tests and offline fixtures. Records every request.
#[derive(Debug, Default)]
pub struct StaticSchemaSource {
    documents: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(url.to_string(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl SchemaSource for StaticSchemaSource {
    fn fetch_to(&self, url: &str, sink: &mut dyn Write) -> SchemaResult<u64> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        let body = self.documents.get(url).ok_or_else(|| SchemaError::Download {
            url: url.to_string(),
            message: "HTTP status 404".into(),
        })?;
        sink.write_all(body).map_err(|e| SchemaError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(body.len() as u64)
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Make sure `path` holds the document at `url`, downloading it if absent.
///
/// Returns `true` when a download happened. An existing file is trusted as-is
/// and no request is made.
pub fn ensure_cached(path: &Path, url: &str, source: &dyn SchemaSource) -> SchemaResult<bool> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "schema already cached");
        return Ok(false);
    }

    let io_err = |p: &Path| {
        let path = p.display().to_string();
        move |e: std::io::Error| SchemaError::Io { path, source: e }
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    tracing::info!(url, path = %path.display(), "downloading schema");
    let part = part_path(path);
    let file = File::create(&part).map_err(io_err(&part))?;
    let mut writer = BufWriter::new(file);

    let bytes = match source.fetch_to(url, &mut writer) {
        Ok(bytes) => bytes,
        Err(e) => {
            drop(writer);
            let _ = std::fs::remove_file(&part);
            return Err(e);
        }
    };
    writer.flush().map_err(io_err(&part))?;
    drop(writer);

    std::fs::rename(&part, path).map_err(io_err(path))?;
    tracing::info!(bytes, path = %path.display(), "schema cached");
    Ok(true)
}
