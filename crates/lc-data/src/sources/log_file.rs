//! Memory-mapped log file with line index and header metadata

use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;
use ahash::AHashMap;
use memmap2::Mmap;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::index::LineIndex;
use crate::schema::{self, ColumnNames, FormatDetection, HeaderFormat};
use crate::EngineError;
use super::fields;

/// Read-only bytes of the source file
enum MappedSource {
    /// Zero-length files are not mapped
    Empty,
    Mapped(Mmap),
}

impl MappedSource {
    fn bytes(&self) -> &[u8] {
        match self {
            MappedSource::Empty => &[],
            MappedSource::Mapped(mmap) => mmap.as_ref(),
        }
    }
}

/// A loaded log file.
///
/// Owns the mapping for its whole lifetime and unmaps on drop. All metadata
/// is computed once in [`LogFile::open`]; accessors only read, so a
/// `LogFile` can be shared between threads freely.
pub struct LogFile {
    path: PathBuf,
    source: MappedSource,
    index: LineIndex,
    detection: FormatDetection,
    columns: ColumnNames,
    lookup: AHashMap<String, usize>,
}

impl LogFile {
    /// Open a log file with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::open_with(path, &EngineConfig::default())
    }

    /// Map `path` read-only, index its lines and classify its header
    pub fn open_with(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let path = path.as_ref().to_path_buf();
        let io_err = |source: std::io::Error| EngineError::Io { path: path.clone(), source };

        let file = File::open(&path).map_err(io_err)?;
        let byte_len = file.metadata().map_err(io_err)?.len();

        let source = if byte_len == 0 {
            MappedSource::Empty
        } else {
            // SAFETY: the mapping is read-only and owned by this struct. Other
            // processes may still append to the file; bytes past the mapped
            // length are never observed.
            let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;
            #[cfg(unix)]
            {
                let _ = mmap.advise(memmap2::Advice::Sequential);
            }
            MappedSource::Mapped(mmap)
        };
        // The mapping stays valid after the handle is closed
        drop(file);

        let started = Instant::now();
        let index = LineIndex::build(source.bytes());
        debug!(
            "Indexed {} lines of {:?} in {:?}",
            index.len(),
            path,
            started.elapsed()
        );

        let rules = &config.detection;
        let header_lines: Vec<String> = (0..index.len().min(rules.header_scan_lines))
            .map(|row| read_line(&index, source.bytes(), row))
            .collect();

        let detection = schema::detect_format(&header_lines, index.len(), rules);
        if detection.is_fallback() {
            warn!(
                "No header signal found in {:?} ({:?}); assuming {:?}",
                path, detection.signal, detection.format
            );
        }
        let columns = schema::derive_columns(detection.format, &header_lines, rules);

        // Display names win over raw names that happen to collide with them
        let mut lookup = AHashMap::with_capacity(columns.len() * 2);
        for names in [columns.display(), columns.raw()] {
            for (idx, name) in names.iter().enumerate() {
                lookup.entry(name.clone()).or_insert(idx);
            }
        }

        info!(
            "Loaded {:?}: {} bytes, {} rows, {:?} header, {} columns, data from row {}",
            path,
            byte_len,
            index.len(),
            detection.format,
            columns.len(),
            detection.data_start_row
        );

        Ok(Self {
            path,
            source,
            index,
            detection,
            columns,
            lookup,
        })
    }

    /// Path the file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the mapped file in bytes
    pub fn byte_len(&self) -> usize {
        self.index.byte_len()
    }

    /// Number of logical lines, header lines included
    pub fn total_rows(&self) -> usize {
        self.index.len()
    }

    /// The line offset index
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    pub fn detected_format(&self) -> HeaderFormat {
        self.detection.format
    }

    /// Full classification result, including what triggered it
    pub fn detection(&self) -> &FormatDetection {
        &self.detection
    }

    /// True when the header layout was assumed rather than recognised
    pub fn is_fallback_format(&self) -> bool {
        self.detection.is_fallback()
    }

    /// First row holding data
    pub fn data_start_row(&self) -> usize {
        self.detection.data_start_row
    }

    /// Rows holding data
    pub fn data_rows(&self) -> Range<usize> {
        self.detection.data_start_row..self.index.len()
    }

    /// Display column names
    pub fn column_names(&self) -> &[String] {
        self.columns.display()
    }

    /// Column names as found in the header
    pub fn raw_column_names(&self) -> &[String] {
        self.columns.raw()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column by display name, or by raw name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Whole line as text, without its terminator; empty if out of range
    pub fn line_text(&self, row: usize) -> String {
        read_line(&self.index, self.source.bytes(), row)
    }

    /// Text of a cell; empty if the row or column does not exist
    pub fn string_at(&self, row: usize, col: usize) -> String {
        self.line_bytes(row)
            .and_then(|line| fields::quoted_field(line, col))
            .map(fields::field_text)
            .unwrap_or_default()
    }

    /// Numeric value of a cell, or `None` if it is missing or not a number
    pub fn cell_value(&self, row: usize, col: usize) -> Option<f64> {
        self.line_bytes(row)
            .and_then(|line| fields::plain_field(line, col))
            .and_then(fields::parse_number)
    }

    /// Numeric value of a cell; NaN if it is missing or not a number
    pub fn value_at(&self, row: usize, col: usize) -> f64 {
        self.cell_value(row, col).unwrap_or(f64::NAN)
    }

    fn line_bytes(&self, row: usize) -> Option<&[u8]> {
        self.index.line(self.source.bytes(), row)
    }
}

impl std::fmt::Debug for LogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFile")
            .field("path", &self.path)
            .field("rows", &self.index.len())
            .field("detection", &self.detection)
            .field("columns", &self.columns.len())
            .finish()
    }
}

fn read_line(index: &LineIndex, bytes: &[u8], row: usize) -> String {
    index
        .line(bytes, row)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .unwrap_or_default()
}
