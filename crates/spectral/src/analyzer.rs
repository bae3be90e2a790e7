//! Dominant in-band peak search.

use std::ops::RangeInclusive;
use std::sync::Arc;

use contracts::{ContractError, FrequencyBand};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use segmenter::WindowPair;
use tracing::{instrument, trace, warn};

use crate::taper::{detrend, taper_coefficients};
use crate::{PowerScale, SignalKind, SpectralConfig, SpectralPeak};

/// Detrended segments whose largest deviation is below this fraction of the
/// raw amplitude carry no variance
const FLAT_EPSILON: f64 = 1e-12;

/// In-band maxima below this fraction of the global spectral maximum are
/// numerical leakage from out-of-band energy
const LEAKAGE_FLOOR: f64 = 1e-9;

/// Dominant peaks of one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPeaks {
    /// PPG peak
    pub cardiac: Option<SpectralPeak>,
    /// Motion peak
    pub motion: Option<SpectralPeak>,
}

/// Spectral analyzer bound to one sample rate and segment length
///
/// Holds an immutable FFT plan and taper, so one instance can be shared
/// across worker threads.
pub struct SpectralAnalyzer {
    config: SpectralConfig,
    sample_rate_hz: f64,
    segment_len: usize,
    fft_len: usize,
    fft: Arc<dyn Fft<f64>>,
    taper: Vec<f64>,
    cardiac_bins: RangeInclusive<usize>,
    motion_bins: RangeInclusive<usize>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("sample_rate_hz", &self.sample_rate_hz)
            .field("segment_len", &self.segment_len)
            .field("fft_len", &self.fft_len)
            .field("cardiac_bins", &self.cardiac_bins)
            .field("motion_bins", &self.motion_bins)
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Build an analyzer for segments of `segment_len` samples
    ///
    /// # Errors
    /// `Configuration` when the DFT would be shorter than the segment, or a
    /// band lies above Nyquist or contains no DFT bin.
    pub fn new(
        config: &SpectralConfig,
        sample_rate_hz: f64,
        segment_len: usize,
    ) -> Result<Self, ContractError> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(ContractError::configuration(
                "input.sample_rate_hz",
                format!("must be > 0, got {sample_rate_hz}"),
            ));
        }
        if segment_len < 2 {
            return Err(ContractError::configuration(
                "analysis.window.duration_s",
                format!("window must span at least 2 samples, got {segment_len}"),
            ));
        }

        let fft_len = config.fft_size.unwrap_or(segment_len);
        if fft_len < segment_len {
            return Err(ContractError::configuration(
                "analysis.spectral.fft_size",
                format!("fft_size ({fft_len}) must be >= window length ({segment_len} samples)"),
            ));
        }

        let resolution = sample_rate_hz / fft_len as f64;
        let cardiac_bins = band_bins(
            "analysis.spectral.cardiac_band",
            config.cardiac_band,
            sample_rate_hz,
            resolution,
            fft_len,
        )?;
        let motion_bins = band_bins(
            "analysis.spectral.motion_band",
            config.motion_band,
            sample_rate_hz,
            resolution,
            fft_len,
        )?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_len);

        Ok(Self {
            config: config.clone(),
            sample_rate_hz,
            segment_len,
            fft_len,
            fft,
            taper: taper_coefficients(config.taper, segment_len),
            cardiac_bins,
            motion_bins,
        })
    }

    /// Frequency spacing of the DFT grid (Hz)
    pub fn bin_resolution_hz(&self) -> f64 {
        self.sample_rate_hz / self.fft_len as f64
    }

    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// Frequency of DFT bin `bin` (Hz)
    pub fn bin_frequency_hz(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_resolution_hz()
    }

    /// One-sided spectrum (bins `0..=fft_len/2`) in the configured power scale
    ///
    /// Returns `None` for segments without variance or with non-finite samples.
    pub fn spectrum(&self, segment: &[f64]) -> Option<Vec<f64>> {
        if segment.len() != self.segment_len {
            warn!(
                expected = self.segment_len,
                got = segment.len(),
                "segment length does not match analyzer"
            );
            return None;
        }
        if segment.iter().any(|x| !x.is_finite()) {
            trace!("segment contains non-finite samples");
            return None;
        }

        let centered = detrend(segment, self.config.detrend);
        let scale = segment.iter().fold(1.0_f64, |acc, x| acc.max(x.abs()));
        let deviation = centered.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
        if deviation <= FLAT_EPSILON * scale {
            trace!("segment has no variance");
            return None;
        }

        let mut buffer: Vec<Complex64> = centered
            .iter()
            .zip(self.taper.iter())
            .map(|(&x, &w)| Complex64::new(x * w, 0.0))
            .collect();
        buffer.resize(self.fft_len, Complex64::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        let spectrum = buffer[..=self.fft_len / 2]
            .iter()
            .map(|c| {
                let mag = c.norm();
                match self.config.power_scale {
                    PowerScale::Magnitude => mag,
                    PowerScale::Squared => mag * mag,
                }
            })
            .collect();
        Some(spectrum)
    }

    /// Strongest component inside the band for `kind`
    #[instrument(
        name = "spectral_dominant_peak",
        level = "trace",
        skip(self, segment),
        fields(kind = %kind, len = segment.len())
    )]
    pub fn dominant_peak(&self, segment: &[f64], kind: SignalKind) -> Option<SpectralPeak> {
        let spectrum = self.spectrum(segment)?;
        let bins = match kind {
            SignalKind::Ppg => self.cardiac_bins.clone(),
            SignalKind::Motion => self.motion_bins.clone(),
        };

        let global_max = spectrum.iter().skip(1).fold(0.0_f64, |acc, &p| acc.max(p));

        // Strict comparison keeps the lowest frequency on ties
        let mut best: Option<(usize, f64)> = None;
        for bin in bins {
            let power = spectrum[bin];
            if best.map_or(true, |(_, p)| power > p) {
                best = Some((bin, power));
            }
        }

        let (bin, power) = best?;
        if !power.is_finite() || power <= 0.0 || power <= LEAKAGE_FLOOR * global_max {
            trace!(power, global_max, "no in-band energy");
            return None;
        }

        Some(SpectralPeak::new(self.bin_frequency_hz(bin), power))
    }

    /// Dominant peaks of both signals in one window
    pub fn analyze(&self, window: &WindowPair<'_>) -> WindowPeaks {
        WindowPeaks {
            cardiac: self.dominant_peak(window.ppg, SignalKind::Ppg),
            motion: self.dominant_peak(window.motion, SignalKind::Motion),
        }
    }
}

/// DFT bins inside `band`, edges inclusive
fn band_bins(
    field: &str,
    band: FrequencyBand,
    sample_rate_hz: f64,
    resolution: f64,
    fft_len: usize,
) -> Result<RangeInclusive<usize>, ContractError> {
    let nyquist = sample_rate_hz / 2.0;
    if !(band.min_hz.is_finite() && band.max_hz.is_finite()) || band.min_hz >= band.max_hz {
        return Err(ContractError::configuration(
            field,
            format!("min_hz ({}) must be < max_hz ({})", band.min_hz, band.max_hz),
        ));
    }
    if band.max_hz > nyquist {
        return Err(ContractError::configuration(
            field,
            format!("max_hz ({}) exceeds Nyquist ({nyquist} Hz)", band.max_hz),
        ));
    }

    // Tolerate float noise so edges that land exactly on a bin stay inclusive
    let lo = (band.min_hz / resolution - 1e-9).ceil().max(0.0) as usize;
    let hi = ((band.max_hz / resolution + 1e-9).floor() as usize).min(fft_len / 2);
    if lo > hi {
        return Err(ContractError::configuration(
            field,
            format!(
                "band {}-{} Hz contains no DFT bin at {resolution:.4} Hz resolution",
                band.min_hz, band.max_hz
            ),
        ));
    }
    Ok(lo..=hi)
}
