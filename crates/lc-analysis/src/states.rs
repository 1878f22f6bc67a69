//! Machine-state segmentation
//!
//! A state column holds either numeric state ids or state names. The
//! timeline splits the file into runs of equal state and records an event
//! at the start of each run.

use std::collections::BTreeMap;
use std::path::Path;
use ahash::AHashMap;
use tracing::{debug, info};
use lc_data::LogFile;

use crate::AnalysisError;

/// Events kept per timeline; intervals are never capped
pub const MAX_STATE_EVENTS: usize = 5000;

/// State id used for blank or unrecognised values
pub const UNDEFINED_STATE: i32 = 0;

const DEFAULT_STATES: &[(i32, &str)] = &[
    (0, "UNDEFINED"),
    (1, "INIT"),
    (2, "POWER_DISABLE"),
    (3, "OFF"),
    (4, "SERVICE"),
    (5, "MECH_INIT"),
    (6, "STANDBY"),
    (7, "GET_READY"),
    (8, "READY"),
    (9, "PRE_PRINT"),
    (10, "PRINT"),
    (11, "POST_PRINT"),
    (12, "PAUSE"),
    (13, "RECOVERY"),
    (14, "GO_TO_OFF"),
    (15, "GO_TO_STANDBY"),
    (16, "GO_TO_SERVICE"),
    (17, "SML_OFF"),
    (18, "DYNAMIC_READY"),
];

/// Mapping between state ids and state names
#[derive(Debug, Clone)]
pub struct StateCatalog {
    names: BTreeMap<i32, String>,
    ids: AHashMap<String, i32>,
    /// Names longest first, for substring matching
    by_length: Vec<(String, i32)>,
}

impl Default for StateCatalog {
    fn default() -> Self {
        Self::from_names(
            DEFAULT_STATES
                .iter()
                .map(|&(id, name)| (id, name.to_string())),
        )
    }
}

impl StateCatalog {
    /// Build a catalog from id/name pairs; names are matched upper-cased
    pub fn from_names(names: impl IntoIterator<Item = (i32, String)>) -> Self {
        let names: BTreeMap<i32, String> = names
            .into_iter()
            .map(|(id, name)| (id, name.trim().to_uppercase()))
            .collect();

        let ids = names.iter().map(|(&id, name)| (name.clone(), id)).collect();
        let mut by_length: Vec<(String, i32)> =
            names.iter().map(|(&id, name)| (name.clone(), id)).collect();
        by_length.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.1.cmp(&b.1)));

        Self { names, ids, by_length }
    }

    /// Parse a JSON object of `"id": "NAME"` pairs
    pub fn from_json_str(text: &str) -> Result<Self, AnalysisError> {
        let names: BTreeMap<i32, String> = serde_json::from_str(text)?;
        Ok(Self::from_names(names))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| lc_data::EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Resolve a raw cell to a state id.
    ///
    /// Integers are taken as ids, then exact names, then the longest name
    /// contained in the text. Anything else is [`UNDEFINED_STATE`].
    pub fn state_id(&self, raw: &str) -> i32 {
        let raw = raw.trim();
        if raw.is_empty() {
            return UNDEFINED_STATE;
        }
        if let Ok(id) = raw.parse::<i32>() {
            return id;
        }

        let clean = raw.to_uppercase();
        if let Some(&id) = self.ids.get(&clean) {
            return id;
        }

        self.by_length
            .iter()
            .find(|(name, _)| !name.is_empty() && clean.contains(name.as_str()))
            .map(|&(_, id)| id)
            .unwrap_or(UNDEFINED_STATE)
    }

    /// Name of a state, or its id as text if unknown
    pub fn state_name(&self, id: i32) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A run of rows in one state, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInterval {
    pub start: usize,
    pub end: usize,
    pub state_id: i32,
}

/// Start of a state run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEvent {
    pub row: usize,
    /// First column of the row the state was read from
    pub time: String,
    pub state_id: i32,
    pub state_name: String,
}

/// Segmentation of a file into state runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTimeline {
    pub column: usize,
    pub intervals: Vec<StateInterval>,
    pub events: Vec<StateEvent>,
    /// More state changes happened than events were kept
    pub events_truncated: bool,
}

impl StateTimeline {
    /// State of the run containing `row`
    pub fn state_at(&self, row: usize) -> Option<i32> {
        let idx = self.intervals.partition_point(|interval| interval.end < row);
        self.intervals
            .get(idx)
            .filter(|interval| interval.start <= row)
            .map(|interval| interval.state_id)
    }

    fn push_event(&mut self, row: usize, time: String, state_id: i32, catalog: &StateCatalog) {
        if self.events.len() < MAX_STATE_EVENTS {
            self.events.push(StateEvent {
                row,
                time,
                state_id,
                state_name: catalog.state_name(state_id),
            });
        } else {
            self.events_truncated = true;
        }
    }
}

/// First column whose name mentions a state but not a time
pub fn find_state_column(names: &[String]) -> Option<usize> {
    names.iter().position(|name| {
        let lower = name.to_lowercase();
        lower.contains("state") && !lower.contains("time")
    })
}

/// Split the file into runs of equal state in column `col`.
///
/// The first run starts at row 0 so header rows take the first data row's
/// state; its event time is read from the first data row. The last run ends
/// at the last line. A file without data rows has an empty timeline.
pub fn segment_states(log: &LogFile, col: usize, catalog: &StateCatalog) -> StateTimeline {
    let mut timeline = StateTimeline {
        column: col,
        ..Default::default()
    };

    let rows = log.data_rows();
    if rows.is_empty() {
        debug!("No data rows to segment in {:?}", log.path());
        return timeline;
    }

    let mut current = catalog.state_id(&log.string_at(rows.start, col));
    let mut start = 0;
    timeline.push_event(start, log.string_at(rows.start, 0), current, catalog);

    for row in rows.start + 1..rows.end {
        let state = catalog.state_id(&log.string_at(row, col));
        if state != current {
            timeline.intervals.push(StateInterval {
                start,
                end: row - 1,
                state_id: current,
            });
            current = state;
            start = row;
            timeline.push_event(row, log.string_at(row, 0), state, catalog);
        }
    }

    timeline.intervals.push(StateInterval {
        start,
        end: rows.end - 1,
        state_id: current,
    });

    info!(
        "Segmented column {} into {} state intervals",
        col,
        timeline.intervals.len()
    );
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_id_resolution() {
        let catalog = StateCatalog::default();

        assert_eq!(catalog.state_id(""), UNDEFINED_STATE);
        assert_eq!(catalog.state_id(" 10 "), 10);
        assert_eq!(catalog.state_id("42"), 42);
        assert_eq!(catalog.state_id("print"), 10);
        assert_eq!(catalog.state_id("State: GO_TO_OFF requested"), 14);
        assert_eq!(catalog.state_id("entering DYNAMIC_READY"), 18);
        assert_eq!(catalog.state_id("banana"), UNDEFINED_STATE);
    }

    #[test]
    fn test_state_name_fallback() {
        let catalog = StateCatalog::default();
        assert_eq!(catalog.state_name(8), "READY");
        assert_eq!(catalog.state_name(99), "99");
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog = StateCatalog::from_json_str(r#"{ "1": "idle", "2": "run" }"#).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.state_id("RUN"), 2);
        assert_eq!(catalog.state_name(1), "IDLE");
    }

    #[test]
    fn test_find_state_column() {
        let names: Vec<String> = ["StateTime", "Speed", "MachineState"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_state_column(&names), Some(2));
        assert_eq!(find_state_column(&names[..2]), None);
    }

    #[test]
    fn test_state_at() {
        let timeline = StateTimeline {
            column: 0,
            intervals: vec![
                StateInterval { start: 0, end: 4, state_id: 1 },
                StateInterval { start: 5, end: 9, state_id: 2 },
            ],
            events: Vec::new(),
            events_truncated: false,
        };
        assert_eq!(timeline.state_at(0), Some(1));
        assert_eq!(timeline.state_at(5), Some(2));
        assert_eq!(timeline.state_at(10), None);
    }
}
