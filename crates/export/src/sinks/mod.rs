//! Sink implementations
//!
//! Contains LogSink, CsvSink, and JsonLinesSink.

mod csv;
mod json;
mod log;

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub use self::csv::CsvSink;
pub use self::json::JsonLinesSink;
pub use self::log::LogSink;

/// `path` param of a file sink
pub(crate) fn path_param(params: &HashMap<String, String>) -> Option<PathBuf> {
    params
        .get("path")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Create `path`, and its parent directory if missing
pub(crate) fn create_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}
