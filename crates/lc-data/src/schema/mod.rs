//! Header layout classification and column name derivation
//!
//! Exported logs come in three incompatible header conventions. The
//! classifier is a best-effort heuristic over the first few lines of the
//! file: it never fails, and anything it does not recognise falls through to
//! the three-line hierarchical layout.

use serde::{Serialize, Deserialize};

use crate::config::DetectionRules;

/// Number of header lines in the default hierarchical layout
pub const HIERARCHICAL_HEADER_LINES: usize = 3;

/// Header layouts the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderFormat {
    /// One header line; data starts on the next line
    SingleLineTagged,
    /// Metadata block with a tagged name line and a sample-time line
    ScopeMultiBlock,
    /// Three header lines combined top-down into composite names
    DefaultHierarchical,
}

/// What made the classifier pick a format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionSignal {
    /// Line 0 contained this marker
    Marker(String),
    /// Line 1 looked like an ISO-8601 timestamp
    IsoTimestamp,
    /// Line 0 started with the scope project marker
    ScopeProject,
    /// Nothing matched; the default layout is a guess
    NoSignal,
    /// Fewer than two lines to look at
    TooFewLines,
}

/// Result of header classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDetection {
    pub format: HeaderFormat,
    /// First line holding data rather than header metadata
    pub data_start_row: usize,
    pub signal: DetectionSignal,
}

impl FormatDetection {
    /// True when no signal matched and the default layout was assumed
    pub fn is_fallback(&self) -> bool {
        matches!(self.signal, DetectionSignal::NoSignal | DetectionSignal::TooFewLines)
    }
}

/// Parallel raw and display column names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnNames {
    raw: Vec<String>,
    display: Vec<String>,
}

impl ColumnNames {
    fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let (raw, display) = pairs.into_iter().unzip();
        Self { raw, display }
    }

    /// Names as found in the header
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// Simplified names for presentation
    pub fn display(&self) -> &[String] {
        &self.display
    }

    pub fn len(&self) -> usize {
        self.display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }
}

/// Classify the header layout.
///
/// `lines` holds the first lines of the file (at most
/// `rules.header_scan_lines` are looked at) and `total_rows` is the full
/// line count, used to clamp the data start.
pub fn detect_format(lines: &[String], total_rows: usize, rules: &DetectionRules) -> FormatDetection {
    let lines = &lines[..lines.len().min(rules.header_scan_lines)];

    let (format, signal) = classify(lines, rules);
    let data_start_row = match format {
        HeaderFormat::SingleLineTagged => 1,
        HeaderFormat::ScopeMultiBlock => {
            let layout = ScopeLayout::locate(lines, rules);
            match (layout.sample_line, layout.name_line) {
                (Some(sample), _) => sample + 1,
                (None, Some(name)) => name + 1,
                (None, None) => 1,
            }
        }
        HeaderFormat::DefaultHierarchical => HIERARCHICAL_HEADER_LINES,
    };

    FormatDetection {
        format,
        data_start_row: data_start_row.min(total_rows),
        signal,
    }
}

fn classify(lines: &[String], rules: &DetectionRules) -> (HeaderFormat, DetectionSignal) {
    if lines.len() < 2 {
        return (HeaderFormat::DefaultHierarchical, DetectionSignal::TooFewLines);
    }

    let first = &lines[0];
    if let Some(marker) = rules
        .single_line_markers
        .iter()
        .find(|m| !m.is_empty() && first.contains(m.as_str()))
    {
        return (HeaderFormat::SingleLineTagged, DetectionSignal::Marker(marker.clone()));
    }
    if looks_like_iso_timestamp(&lines[1]) {
        return (HeaderFormat::SingleLineTagged, DetectionSignal::IsoTimestamp);
    }

    if first.starts_with(rules.scope_project_marker.as_str()) {
        return (HeaderFormat::ScopeMultiBlock, DetectionSignal::ScopeProject);
    }

    (HeaderFormat::DefaultHierarchical, DetectionSignal::NoSignal)
}

/// Date separator, time designator and time separator all present
fn looks_like_iso_timestamp(line: &str) -> bool {
    line.contains('-') && line.contains('T') && line.contains(':')
}

/// Derive column names for a classified file
pub fn derive_columns(format: HeaderFormat, lines: &[String], rules: &DetectionRules) -> ColumnNames {
    let lines = &lines[..lines.len().min(rules.header_scan_lines)];
    match format {
        HeaderFormat::SingleLineTagged => single_line_columns(lines, rules),
        HeaderFormat::ScopeMultiBlock => scope_columns(lines, rules),
        HeaderFormat::DefaultHierarchical => hierarchical_columns(lines),
    }
}

fn clean_header_field(field: &str) -> String {
    field.trim().trim_matches('"').to_string()
}

fn single_line_columns(lines: &[String], rules: &DetectionRules) -> ColumnNames {
    let Some(header) = lines.first() else {
        return ColumnNames::default();
    };

    ColumnNames::from_pairs(header.split(',').map(|field| {
        let raw = clean_header_field(field);
        let display = shorten_path(&raw, rules.max_path_segments);
        (raw, display)
    }))
}

/// Keep only the last `max_segments` dot-separated segments
fn shorten_path(name: &str, max_segments: usize) -> String {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() > max_segments {
        segments[segments.len() - max_segments..].join(".")
    } else {
        name.to_string()
    }
}

/// Line positions inside a scope export header
#[derive(Debug, Clone, Copy, Default)]
struct ScopeLayout {
    name_line: Option<usize>,
    sample_line: Option<usize>,
}

impl ScopeLayout {
    fn locate(lines: &[String], rules: &DetectionRules) -> Self {
        let tagged = lines.iter().position(|line| {
            line.starts_with(rules.scope_name_tag.as_str())
                && rules
                    .scope_namespace_markers
                    .iter()
                    .any(|m| line.contains(m.as_str()))
        });

        // Widest line wins when no name line is tagged; earliest on ties
        let name_line = tagged.or_else(|| {
            lines
                .iter()
                .take(rules.scope_fallback_scan_lines)
                .enumerate()
                .fold(None, |best: Option<(usize, usize)>, (idx, line)| {
                    let commas = line.bytes().filter(|&b| b == b',').count();
                    match best {
                        Some((_, most)) if most >= commas => best,
                        _ => Some((idx, commas)),
                    }
                })
                .map(|(idx, _)| idx)
        });

        let sample_line = lines
            .iter()
            .position(|line| line.starts_with(rules.scope_sample_tag.as_str()));

        Self { name_line, sample_line }
    }
}

fn scope_columns(lines: &[String], rules: &DetectionRules) -> ColumnNames {
    let Some(name_line) = ScopeLayout::locate(lines, rules).name_line else {
        return ColumnNames::default();
    };

    ColumnNames::from_pairs(lines[name_line].split(',').map(|field| {
        let raw = clean_header_field(field);
        let display = simplify_scope_name(&raw, rules);
        (raw, display)
    }))
}

fn simplify_scope_name(name: &str, rules: &DetectionRules) -> String {
    let mut display = name.to_string();
    for rewrite in &rules.scope_prefix_rewrites {
        display = rewrite.apply(&display);
    }
    if !rules.scope_deref_marker.is_empty() {
        display = display.replace(rules.scope_deref_marker.as_str(), "");
    }
    display
}

fn hierarchical_columns(lines: &[String]) -> ColumnNames {
    if lines.len() < HIERARCHICAL_HEADER_LINES {
        return ColumnNames::default();
    }

    let rows: Vec<Vec<&str>> = lines[..HIERARCHICAL_HEADER_LINES]
        .iter()
        .map(|line| line.split(',').collect())
        .collect();

    let names = (0..rows[0].len()).map(|col| {
        let parts: Vec<&str> = rows
            .iter()
            .filter_map(|row| row.get(col))
            .map(|fragment| fragment.trim())
            .filter(|fragment| !fragment.is_empty())
            .collect();

        let name = if parts.is_empty() {
            format!("Column_{col}")
        } else {
            parts.join("_")
        };
        (name.clone(), name)
    });

    ColumnNames::from_pairs(names)
}
