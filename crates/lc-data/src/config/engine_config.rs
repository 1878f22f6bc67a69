//! Configuration for opening log files

use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::EngineError;

/// Number of leading lines the header classifier looks at
pub const DEFAULT_HEADER_SCAN_LINES: usize = 15;

/// Lines searched for the widest line when a scope export has no tagged name line
pub const DEFAULT_SCOPE_FALLBACK_SCAN_LINES: usize = 10;

/// Dot-separated segments kept in a single-line display name
pub const DEFAULT_MAX_PATH_SEGMENTS: usize = 4;

/// Configuration for the log file engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Header classification rules
    pub detection: DetectionRules,
}

/// Marker strings and limits used to classify a file's header layout.
///
/// The defaults match the exporters the engine is used with; they are
/// compared byte-for-byte against the first lines of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionRules {
    /// How many leading lines are inspected
    pub header_scan_lines: usize,

    /// Substrings that mark a single-line tagged header when found in line 0
    pub single_line_markers: Vec<String>,

    /// Prefix of line 0 in a multi-block scope export
    pub scope_project_marker: String,

    /// Prefix of the scope line that carries the signal names
    pub scope_name_tag: String,

    /// Namespace markers that must appear on the scope name line
    pub scope_namespace_markers: Vec<String>,

    /// Prefix of the scope line after which samples begin
    pub scope_sample_tag: String,

    /// Lines searched for the widest line when no tagged name line exists
    pub scope_fallback_scan_lines: usize,

    /// Prefix rewrites applied to scope signal names, in order
    pub scope_prefix_rewrites: Vec<PrefixRewrite>,

    /// Marker removed anywhere in a scope signal name
    pub scope_deref_marker: String,

    /// Maximum dot-separated segments kept in single-line display names
    pub max_path_segments: usize,
}

/// Replace `prefix` at the start of a name with `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRewrite {
    pub prefix: String,
    pub replacement: String,
}

impl PrefixRewrite {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    /// Apply the rewrite, returning the name unchanged if the prefix is absent
    pub fn apply(&self, name: &str) -> String {
        match name.strip_prefix(self.prefix.as_str()) {
            Some(rest) => format!("{}{}", self.replacement, rest),
            None => name.to_string(),
        }
    }
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self {
            header_scan_lines: DEFAULT_HEADER_SCAN_LINES,
            single_line_markers: vec![
                "PolicyName".to_string(),
                "Interfaces.".to_string(),
                "UnixTime".to_string(),
                "MachineState".to_string(),
            ],
            scope_project_marker: "ScopeProject".to_string(),
            scope_name_tag: "Name".to_string(),
            scope_namespace_markers: vec!["MAIN.".to_string(), "GVL.".to_string()],
            scope_sample_tag: "SampleTime".to_string(),
            scope_fallback_scan_lines: DEFAULT_SCOPE_FALLBACK_SCAN_LINES,
            scope_prefix_rewrites: vec![
                PrefixRewrite::new("MAIN.", ""),
                PrefixRewrite::new("GVL.", "G."),
                PrefixRewrite::new("aAxis[", "Axis["),
            ],
            scope_deref_marker: "^".to_string(),
            max_path_segments: DEFAULT_MAX_PATH_SEGMENTS,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the default detection rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the limits leave the classifier something to work with
    pub fn validate(&self) -> Result<(), EngineError> {
        let rules = &self.detection;
        if rules.header_scan_lines < 3 {
            return Err(EngineError::Config(format!(
                "header_scan_lines must be at least 3, got {}",
                rules.header_scan_lines
            )));
        }
        if rules.max_path_segments == 0 {
            return Err(EngineError::Config(
                "max_path_segments must be at least 1".to_string(),
            ));
        }
        if rules.scope_project_marker.is_empty() {
            return Err(EngineError::Config(
                "scope_project_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
