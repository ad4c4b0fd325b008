//! Persisted index snapshot.
//!
//! A single JSON document: a header identifying the build (format version,
//! content hash, counts, timestamp, settings) followed by the index body.
//! Written atomically so readers never observe a half-written file.
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ragdex_core::config::IndexSettings;
use ragdex_core::error::{Error, Result};
use ragdex_text::TfIdfIndex;

use crate::builder::BuiltIndex;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub content_hash: String,
    pub document_count: usize,
    pub chunk_count: usize,
    pub built_at: DateTime<Utc>,
    pub settings: IndexSettings,
    pub index: TfIdfIndex,
}

#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

impl Snapshot {
    pub fn from_build(built: BuiltIndex, settings: IndexSettings) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            content_hash: built.content_hash,
            document_count: built.document_count,
            chunk_count: built.index.len(),
            built_at: Utc::now(),
            settings,
            index: built.index,
        }
    }

    /// Write to `path` via a temp file in the same directory, then rename over it.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        info!(path = %path.display(), chunks = self.chunk_count, hash = %self.content_hash, "wrote snapshot");
        Ok(())
    }

    /// Read and validate a snapshot. `Ok(None)` when nothing exists at `path`.
    pub fn read_if_exists(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::read(path).map(Some)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Parse snapshot bytes. The version is checked before the body so an
    /// incompatible layout reports [`Error::SnapshotVersion`] rather than a parse error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let header: VersionHeader =
            serde_json::from_slice(bytes).map_err(|e| Error::SnapshotParse(format!("header: {e}")))?;
        if header.format_version != FORMAT_VERSION {
            return Err(Error::SnapshotVersion { found: header.format_version, expected: FORMAT_VERSION });
        }
        let snapshot: Snapshot = serde_json::from_slice(bytes).map_err(|e| Error::SnapshotParse(e.to_string()))?;
        if snapshot.chunk_count != snapshot.index.len() {
            return Err(Error::SnapshotParse(format!(
                "header says {} chunks, body has {}",
                snapshot.chunk_count,
                snapshot.index.len()
            )));
        }
        debug!(chunks = snapshot.chunk_count, built_at = %snapshot.built_at, "parsed snapshot");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_index;
    use ragdex_core::types::Document;

    fn snapshot() -> Snapshot {
        let settings = IndexSettings::default();
        let docs = vec![Document::new("a", "Alpha", "first body"), Document::new("b", "Beta", "second body")];
        Snapshot::from_build(build_index(&docs, &settings).unwrap(), settings)
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.json");
        let snap = snapshot();
        snap.write_atomic(&path).unwrap();
        let back = Snapshot::read(&path).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.chunk_count, 2);
        assert_eq!(back.document_count, 2);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Snapshot::read_if_exists(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn wrong_version_is_reported_as_such() {
        let mut value = serde_json::to_value(snapshot()).unwrap();
        value["format_version"] = serde_json::json!(99);
        let err = Snapshot::from_slice(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, Error::SnapshotVersion { found: 99, expected: FORMAT_VERSION }));
    }

    #[test]
    fn garbage_and_count_mismatch_are_parse_errors() {
        assert!(matches!(Snapshot::from_slice(b"{not json").unwrap_err(), Error::SnapshotParse(_)));

        let mut value = serde_json::to_value(snapshot()).unwrap();
        value["chunk_count"] = serde_json::json!(7);
        let err = Snapshot::from_slice(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, Error::SnapshotParse(_)));
        assert!(err.is_snapshot_error());
    }
}
