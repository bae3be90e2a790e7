//! JsonLinesSink - one JSON record per line

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, Estimate, EstimateRecord, EstimateSink};
use tracing::{debug, instrument};

use super::{create_file, path_param};

/// Sink that writes `EstimateRecord`s as JSON Lines (`bpm: null` when discarded)
pub struct JsonLinesSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: u64,
}

impl JsonLinesSink {
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = create_file(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            writer: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let path = path_param(params).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' param")
        })?;
        Self::new(name, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, estimate: &Estimate) -> std::io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("sink already closed"))?;
        serde_json::to_writer(&mut *writer, &EstimateRecord::from(estimate))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")
    }
}

impl EstimateSink for JsonLinesSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "json_sink_write",
        level = "trace",
        skip(self, estimate),
        fields(sink = %self.name, window = estimate.window_index)
    )]
    fn write(&mut self, estimate: &Estimate) -> Result<(), ContractError> {
        self.write_line(estimate)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        match self.writer.as_mut() {
            Some(writer) => writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string())),
            None => Ok(()),
        }
    }

    #[instrument(name = "json_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&mut self) -> Result<(), ContractError> {
        self.flush()?;
        if self.writer.take().is_some() {
            debug!(path = %self.path.display(), lines = self.lines, "JsonLinesSink closed");
        }
        Ok(())
    }
}
