//! Engine configuration module

pub mod engine_config;

pub use engine_config::*;
