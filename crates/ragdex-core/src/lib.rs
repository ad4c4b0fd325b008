#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunking;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod source;
pub mod traits;
pub mod types;

pub use chunking::Chunker;
pub use config::{ChunkingConfig, Config, ScoringConfig, Settings, TokenizerConfig};
pub use error::{Error, Result};
pub use types::{Chunk, ChunkId, Document, RetrievedChunk};
