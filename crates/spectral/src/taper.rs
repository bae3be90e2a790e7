//! Trend removal and taper windows.

use std::f64::consts::PI;

use crate::{Detrend, TaperWindow};

/// Remove the trend from `segment`, returning a new buffer
pub fn detrend(segment: &[f64], mode: Detrend) -> Vec<f64> {
    let n = segment.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = segment.iter().sum::<f64>() / n as f64;

    match mode {
        Detrend::Mean => segment.iter().map(|&x| x - mean).collect(),
        Detrend::Linear => {
            if n < 2 {
                return vec![0.0; n];
            }
            // Least-squares line over t = 0..n-1
            let t_mean = (n - 1) as f64 / 2.0;
            let (mut sxy, mut sxx) = (0.0, 0.0);
            for (i, &x) in segment.iter().enumerate() {
                let dt = i as f64 - t_mean;
                sxy += dt * (x - mean);
                sxx += dt * dt;
            }
            let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
            segment
                .iter()
                .enumerate()
                .map(|(i, &x)| x - (mean + slope * (i as f64 - t_mean)))
                .collect()
        }
    }
}

/// Symmetric taper coefficients of length `n`
pub fn taper_coefficients(kind: TaperWindow, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * i as f64 / denom;
            match kind {
                TaperWindow::Hann => 0.5 - 0.5 * phase.cos(),
                TaperWindow::Hamming => 0.54 - 0.46 * phase.cos(),
                TaperWindow::Rectangular => 1.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_detrend_removes_dc() {
        let out = detrend(&[3.0, 5.0, 7.0], Detrend::Mean);
        assert_eq!(out, vec![-2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_linear_detrend_removes_ramp() {
        let ramp: Vec<f64> = (0..50).map(|i| 2.0 + 0.3 * i as f64).collect();
        let out = detrend(&ramp, Detrend::Linear);
        assert!(out.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_hann_endpoints_and_peak() {
        let w = taper_coefficients(TaperWindow::Hann, 9);
        assert!(w[0].abs() < 1e-12);
        assert!(w[8].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hamming_endpoints() {
        let w = taper_coefficients(TaperWindow::Hamming, 5);
        assert!((w[0] - 0.08).abs() < 1e-12);
        assert!((w[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(taper_coefficients(TaperWindow::Hann, 0).is_empty());
        assert_eq!(taper_coefficients(TaperWindow::Hann, 1), vec![1.0]);
        assert!(detrend(&[], Detrend::Linear).is_empty());
        assert_eq!(detrend(&[4.0], Detrend::Linear), vec![0.0]);
    }
}
