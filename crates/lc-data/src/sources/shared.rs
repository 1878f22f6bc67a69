//! Engine handle shared between threads

use std::path::Path;
use std::sync::Arc;
use parking_lot::RwLock;

use crate::EngineError;
use super::{LogFile, LogFileEngine};

/// Clonable handle to one [`LogFileEngine`].
///
/// Readers hold the read lock for the duration of a query, so a release or
/// reload (which takes the write lock) can never unmap a file under an
/// in-flight accessor.
#[derive(Debug, Clone, Default)]
pub struct SharedLogEngine {
    inner: Arc<RwLock<LogFileEngine>>,
}

impl SharedLogEngine {
    pub fn new(engine: LogFileEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Load a new file, waiting for running queries to finish first
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.inner.write().load(path)
    }

    pub fn release(&self) {
        self.inner.write().release();
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_loaded()
    }

    /// Run `f` against the loaded file while holding the read lock
    pub fn with_log<R>(&self, f: impl FnOnce(&LogFile) -> R) -> Result<R, EngineError> {
        let engine = self.inner.read();
        Ok(f(engine.log()?))
    }
}
