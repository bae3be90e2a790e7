//! Exporter - fan-out of an ordered estimate series to sinks

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use contracts::{Estimate, EstimateSink, SinkConfig, SinkType};

use crate::error::ExportError;
use crate::sinks::{CsvSink, JsonLinesSink, LogSink};

/// Create a sink from configuration
#[instrument(
    name = "export_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn EstimateSink>, ExportError> {
    match config.sink_type {
        SinkType::Log => Ok(Box::new(LogSink::new(&config.name))),
        SinkType::Csv => {
            let sink = CsvSink::from_params(&config.name, &config.params)
                .map_err(|e| ExportError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
        SinkType::JsonLines => {
            let sink = JsonLinesSink::from_params(&config.name, &config.params)
                .map_err(|e| ExportError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

/// Per-sink outcome of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub name: String,
    /// Records persisted
    pub written: u64,
    /// First error, after which the sink received nothing more
    pub error: Option<String>,
}

impl SinkReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one export across all sinks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub sinks: Vec<SinkReport>,
}

impl ExportReport {
    pub fn is_ok(&self) -> bool {
        self.sinks.iter().all(SinkReport::is_ok)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SinkReport> {
        self.sinks.iter().filter(|s| !s.is_ok())
    }
}

struct SinkSlot {
    sink: Box<dyn EstimateSink>,
    report: SinkReport,
}

impl SinkSlot {
    fn new(sink: Box<dyn EstimateSink>) -> Self {
        let report = SinkReport {
            name: sink.name().to_string(),
            written: 0,
            error: None,
        };
        Self { sink, report }
    }

    fn fail(&mut self, message: String) {
        warn!(
            sink = %self.report.name,
            error = %message,
            "sink failed, skipping remaining records"
        );
        self.report.error = Some(message);
    }
}

/// Writes estimates to every sink in window order
///
/// A failing sink stops receiving records but never stops the others.
pub struct Exporter {
    slots: Vec<SinkSlot>,
}

impl Exporter {
    /// Exporter without sinks
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Build every configured sink
    #[instrument(
        name = "exporter_from_configs",
        skip(configs),
        fields(sink_count = configs.len())
    )]
    pub fn from_configs(configs: &[SinkConfig]) -> Result<Self, ExportError> {
        let mut seen = HashSet::new();
        let mut exporter = Self::new();
        for config in configs {
            if !seen.insert(config.name.as_str()) {
                return Err(ExportError::DuplicateSink(config.name.clone()));
            }
            exporter.add_sink(create_sink(config)?);
        }
        Ok(exporter)
    }

    pub fn add_sink(&mut self, sink: Box<dyn EstimateSink>) {
        debug!(sink = sink.name(), "sink registered");
        self.slots.push(SinkSlot::new(sink));
    }

    pub fn with_sink(mut self, sink: Box<dyn EstimateSink>) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Write all estimates, then flush and close every sink
    #[instrument(
        name = "exporter_export",
        skip(self, estimates),
        fields(sinks = self.slots.len())
    )]
    pub fn export<'a, I>(mut self, estimates: I) -> ExportReport
    where
        I: IntoIterator<Item = &'a Estimate>,
    {
        for estimate in estimates {
            for slot in self.slots.iter_mut().filter(|s| s.report.is_ok()) {
                match slot.sink.write(estimate) {
                    Ok(()) => {
                        slot.report.written += 1;
                        observability::record_sink_write(&slot.report.name, true);
                    }
                    Err(e) => {
                        observability::record_sink_write(&slot.report.name, false);
                        slot.fail(e.to_string());
                    }
                }
            }
        }

        for slot in &mut self.slots {
            if slot.report.is_ok() {
                if let Err(e) = slot.sink.flush() {
                    slot.fail(e.to_string());
                }
            }
            // Close even failed sinks so their files are released
            if let Err(e) = slot.sink.close() {
                if slot.report.is_ok() {
                    slot.fail(e.to_string());
                }
            }
        }

        let report = ExportReport {
            sinks: self.slots.into_iter().map(|s| s.report).collect(),
        };
        info!(
            sinks = report.sinks.len(),
            failed = report.failed().count(),
            "export finished"
        );
        report
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
