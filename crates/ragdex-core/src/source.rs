//! In-memory and JSON-file document sources.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Error;
use crate::traits::DocumentSource;
use crate::types::Document;

/// A fixed set of documents, e.g. handed over by a CMS sync or a test.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: Vec<Document>,
}

impl StaticSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl DocumentSource for StaticSource {
    fn documents(&self) -> anyhow::Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// A JSON array of documents on disk.
///
/// Entries that do not deserialize into a [`Document`] are logged and skipped;
/// only an unreadable file or a top level that is not an array is an error.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for JsonFileSource {
    fn documents(&self) -> anyhow::Result<Vec<Document>> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", self.path.display(), e))?;
        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", self.path.display(), e))?;
        let total = entries.len();
        let mut documents = Vec::with_capacity(total);
        for (position, entry) in entries.into_iter().enumerate() {
            let document_id = entry
                .get("id")
                .and_then(|v| v.as_str())
                .map_or_else(|| format!("#{position}"), str::to_string);
            match serde_json::from_value::<Document>(entry) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    let e = Error::BuildInput { document_id, reason: e.to_string() };
                    warn!(error = %e, "skipping malformed document");
                }
            }
        }
        info!(path = %self.path.display(), documents = documents.len(), skipped = total - documents.len(), "loaded documents from json");
        Ok(documents)
    }
}
