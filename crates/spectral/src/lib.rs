//! # Spectral
//!
//! Dominant-frequency search for one analysis window.
//!
//! Pipeline per segment:
//! - trend removal (mean or least-squares line)
//! - taper (Hann by default)
//! - magnitude spectrum via a forward DFT, optionally zero-padded
//! - arg-max inside the band configured for the signal kind
//!
//! A flat segment, a segment with non-finite samples, or a segment with no
//! in-band energy yields no peak; it is never an error.

mod analyzer;
mod taper;

pub use analyzer::{SpectralAnalyzer, WindowPeaks};
pub use contracts::{Detrend, PowerScale, SignalKind, SpectralConfig, SpectralPeak, TaperWindow};
pub use taper::{detrend, taper_coefficients};
