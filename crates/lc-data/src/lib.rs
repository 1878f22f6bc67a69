//! Log file engine for large CSV telemetry exports
//!
//! Maps a file read-only, indexes its logical lines, classifies which header
//! layout it uses and answers point queries for text and numeric cells
//! directly against the mapped bytes.

pub mod config;
pub mod index;
pub mod schema;
pub mod sources;

use std::path::PathBuf;
use thiserror::Error;

// Re-exports
pub use config::{EngineConfig, DetectionRules};
pub use index::LineIndex;
pub use schema::{ColumnNames, DetectionSignal, FormatDetection, HeaderFormat};
pub use sources::{LogFile, LogFileEngine, SharedLogEngine};

/// Errors that can occur while opening or querying a log file
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine not loaded")]
    NotLoaded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl EngineError {
    /// The underlying I/O error kind, if this is an I/O failure
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            EngineError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
