//! CSV recording loader
//!
//! Accepted layouts (header names are case-insensitive, extra columns ignored):
//! - `ppg,motion`
//! - `ppg,ax,ay,az` (reduced per `input.motion_reduction`)

use std::fs::File;
use std::io::Read;
use std::path::Path;

use contracts::{InputConfig, Signal, Vector3};
use tracing::{debug, instrument};

use crate::error::{CliError, Result};

/// PPG and motion channels of one recording
#[derive(Debug, Clone)]
pub struct InputSignals {
    pub ppg: Signal,
    pub motion: Signal,
}

#[derive(Debug, Clone, Copy)]
enum MotionColumns {
    Single(usize),
    Axes(usize, usize, usize),
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    ppg: usize,
    motion: MotionColumns,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord, source: &str) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let ppg = find("ppg")
            .ok_or_else(|| CliError::input_layout(source, "missing 'ppg' column"))?;

        let motion = match (find("motion"), find("ax"), find("ay"), find("az")) {
            (Some(idx), _, _, _) => MotionColumns::Single(idx),
            (None, Some(x), Some(y), Some(z)) => MotionColumns::Axes(x, y, z),
            _ => {
                return Err(CliError::input_layout(
                    source,
                    "expected a 'motion' column or all of 'ax', 'ay', 'az'",
                ))
            }
        };

        Ok(Self { ppg, motion })
    }
}

/// Load both channels from a CSV file
#[instrument(name = "input_load", skip(input), fields(path = %path.display()))]
pub fn load_signals(path: &Path, input: &InputConfig) -> Result<InputSignals> {
    if !path.exists() {
        return Err(CliError::input_not_found(path.display().to_string()));
    }
    let file = File::open(path)?;
    read_signals(file, &path.display().to_string(), input)
}

/// Parse both channels from any CSV reader
pub fn read_signals<R: Read>(reader: R, source: &str, input: &InputConfig) -> Result<InputSignals> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let layout = Layout::from_headers(reader.headers()?, source)?;

    let mut ppg = Vec::new();
    let mut axes = Vec::new();
    let mut motion = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let cell = |idx: usize| parse_cell(&record, idx, source, line);

        ppg.push(cell(layout.ppg)?);
        match layout.motion {
            MotionColumns::Single(idx) => motion.push(cell(idx)?),
            MotionColumns::Axes(x, y, z) => axes.push(Vector3::new(cell(x)?, cell(y)?, cell(z)?)),
        }
    }

    let rate = input.sample_rate_hz;
    let motion = match layout.motion {
        MotionColumns::Single(_) => Signal::motion(rate, motion),
        MotionColumns::Axes(..) => Signal::motion_from_axes(rate, &axes, input.motion_reduction),
    };
    let ppg = Signal::ppg(rate, ppg);
    debug!(samples = ppg.len(), duration_s = ppg.duration_s(), "input loaded");

    Ok(InputSignals {
        ppg: ppg.with_start_time(input.start_time_s),
        motion: motion.with_start_time(input.start_time_s),
    })
}

fn parse_cell(record: &csv::StringRecord, idx: usize, source: &str, line: u64) -> Result<f64> {
    let raw = record
        .get(idx)
        .ok_or_else(|| CliError::input_parse(source, line, format!("missing column {}", idx + 1)))?;
    raw.parse::<f64>()
        .map_err(|e| CliError::input_parse(source, line, format!("'{raw}': {e}")))
}
