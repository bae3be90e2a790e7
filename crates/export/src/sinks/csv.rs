//! CsvSink - one row per window

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use contracts::{ContractError, Estimate, EstimateRecord, EstimateSink};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{create_file, path_param};

/// Compact row: the core output columns
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    window_index: usize,
    timestamp_s: f64,
    bpm: Option<f64>,
    valid: bool,
    reason: &'a str,
    collision: bool,
}

impl<'a> From<&'a Estimate> for CsvRow<'a> {
    fn from(estimate: &'a Estimate) -> Self {
        Self {
            window_index: estimate.window_index,
            timestamp_s: estimate.timestamp_s,
            bpm: estimate.bpm,
            valid: estimate.valid,
            reason: estimate.reason.as_str(),
            collision: estimate.is_collision(),
        }
    }
}

/// Sink that writes estimates as CSV
///
/// A discarded window leaves the `bpm` cell empty. With `detail = "true"`
/// the peak frequencies and powers are appended as extra columns.
pub struct CsvSink {
    name: String,
    path: PathBuf,
    detail: bool,
    writer: Option<::csv::Writer<File>>,
    rows: u64,
}

impl CsvSink {
    /// Create the file and a writer for it
    pub fn new(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        detail: bool,
    ) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = create_file(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            detail,
            writer: Some(::csv::Writer::from_writer(file)),
            rows: 0,
        })
    }

    /// Create from params map (for factory)
    ///
    /// Params: `path` (required), `detail` (optional, `true`/`false`).
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let path = path_param(params).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' param")
        })?;
        let detail = params
            .get("detail")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Self::new(name, path, detail)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut ::csv::Writer<File>, ContractError> {
        let name = &self.name;
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(name, "sink already closed"))
    }
}

impl EstimateSink for CsvSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_sink_write",
        level = "trace",
        skip(self, estimate),
        fields(sink = %self.name, window = estimate.window_index)
    )]
    fn write(&mut self, estimate: &Estimate) -> Result<(), ContractError> {
        let detail = self.detail;
        let name = self.name.clone();
        let writer = self.writer()?;
        let result = if detail {
            writer.serialize(EstimateRecord::from(estimate))
        } else {
            writer.serialize(CsvRow::from(estimate))
        };
        result.map_err(|e| ContractError::sink_write(name, e.to_string()))?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        let name = self.name.clone();
        self.writer()?
            .flush()
            .map_err(|e| ContractError::sink_write(name, e.to_string()))
    }

    #[instrument(name = "csv_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
            debug!(path = %self.path.display(), rows = self.rows, "CsvSink closed");
        }
        Ok(())
    }
}
