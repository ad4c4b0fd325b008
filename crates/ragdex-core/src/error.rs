use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    /// A document handed over by the content source is missing required fields.
    #[error("Malformed document '{document_id}': {reason}")]
    BuildInput { document_id: String, reason: String },

    #[error("Snapshot could not be parsed: {0}")]
    SnapshotParse(String),

    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures that mean "the snapshot is unusable, build instead".
    pub fn is_snapshot_error(&self) -> bool {
        matches!(self, Self::SnapshotParse(_) | Self::SnapshotVersion { .. } | Self::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
