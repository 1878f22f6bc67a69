pub mod engine;
pub mod fields;
pub mod log_file;
pub mod shared;

pub use engine::LogFileEngine;
pub use log_file::LogFile;
pub use shared::SharedLogEngine;
