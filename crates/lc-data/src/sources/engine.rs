//! Loadable engine slot around a [`LogFile`]

use std::path::Path;
use tracing::debug;

use crate::config::EngineConfig;
use crate::schema::HeaderFormat;
use crate::EngineError;
use super::LogFile;

/// Holds at most one loaded log file.
///
/// Loading replaces the current file; releasing unmaps it. Accessors on an
/// engine with nothing loaded return [`EngineError::NotLoaded`].
#[derive(Debug, Default)]
pub struct LogFileEngine {
    config: EngineConfig,
    log: Option<LogFile>,
}

impl LogFileEngine {
    /// Create an empty engine with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty engine with the given configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config, log: None }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load `path`, releasing any previously loaded file first.
    ///
    /// On failure the engine is left unloaded.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.release();
        self.log = Some(LogFile::open_with(path, &self.config)?);
        Ok(())
    }

    /// Unmap the current file. Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(log) = self.log.take() {
            debug!("Releasing {:?}", log.path());
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.log.is_some()
    }

    /// The loaded file
    pub fn log(&self) -> Result<&LogFile, EngineError> {
        self.log.as_ref().ok_or(EngineError::NotLoaded)
    }

    pub fn total_rows(&self) -> Result<usize, EngineError> {
        Ok(self.log()?.total_rows())
    }

    pub fn column_names(&self) -> Result<&[String], EngineError> {
        Ok(self.log()?.column_names())
    }

    pub fn raw_column_names(&self) -> Result<&[String], EngineError> {
        Ok(self.log()?.raw_column_names())
    }

    pub fn data_start_row(&self) -> Result<usize, EngineError> {
        Ok(self.log()?.data_start_row())
    }

    pub fn detected_format(&self) -> Result<HeaderFormat, EngineError> {
        Ok(self.log()?.detected_format())
    }

    /// Text of a cell; empty for a missing row or column
    pub fn string_at(&self, row: usize, col: usize) -> Result<String, EngineError> {
        Ok(self.log()?.string_at(row, col))
    }

    /// Numeric value of a cell; NaN for a missing or malformed cell
    pub fn value_at(&self, row: usize, col: usize) -> Result<f64, EngineError> {
        Ok(self.log()?.value_at(row, col))
    }
}
