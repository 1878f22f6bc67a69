//! Analysis over a loaded log file
//!
//! Everything here reads the engine through its public accessors only:
//! numeric series with forward fill, machine-state segmentation and value
//! search.

pub mod search;
pub mod series;
pub mod states;

use thiserror::Error;
use lc_data::EngineError;

// Re-export commonly used types
pub use search::ValueQuery;
pub use series::{extract_series, extract_series_by_name, Series, SeriesStats};
pub use states::{
    find_state_column, segment_states, StateCatalog, StateEvent, StateInterval, StateTimeline,
    MAX_STATE_EVENTS,
};

/// Errors that can occur in analysis operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid query {query:?}: {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("State catalog error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
