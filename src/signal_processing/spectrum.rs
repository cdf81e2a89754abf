use realfft::RealFftPlanner;

use crate::error::{GwError, Result};
use crate::timeseries::TimeSeries;

/// One-sided amplitude spectrum of a real series.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    amplitudes: Vec<f64>,
    bin_width: f64,
}

impl Spectrum {
    /// Bin centre frequencies in Hz, `k * sample_rate / N`.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Unnormalized DFT magnitudes `|X[k]|`.
    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    pub fn nearest_bin(&self, freq_hz: f64) -> usize {
        let k = (freq_hz / self.bin_width).round().max(0.0) as usize;
        k.min(self.amplitudes.len() - 1)
    }

    pub fn amplitude_at(&self, freq_hz: f64) -> f64 {
        self.amplitudes[self.nearest_bin(freq_hz)]
    }

    /// Up to `count` local-maximum bins, strongest first.
    pub fn dominant_peaks(&self, count: usize) -> Vec<usize> {
        let a = &self.amplitudes;
        let mut peaks: Vec<usize> = (0..a.len())
            .filter(|&k| {
                let left_ok = k == 0 || a[k] > a[k - 1];
                let right_ok = k + 1 == a.len() || a[k] >= a[k + 1];
                left_ok && right_ok
            })
            .collect();
        peaks.sort_by(|&i, &j| a[j].total_cmp(&a[i]));
        peaks.truncate(count);
        peaks
    }
}

/// Real-input FFT magnitude analysis.
///
/// Holds an FFT planner so repeated calls at the same length reuse plans.
pub struct SpectralAnalyzer {
    planner: RealFftPlanner<f64>,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::<f64>::new(),
        }
    }

    /// One-sided spectrum of `ts`: `N/2 + 1` bins spaced `sample_rate / N`.
    pub fn spectrum(&mut self, ts: &TimeSeries) -> Result<Spectrum> {
        self.spectrum_of(ts.samples(), ts.sample_rate())
    }

    /// As [`spectrum`](Self::spectrum), for a bare slice.
    ///
    /// # Errors
    /// Returns `GwError::InvalidInput` for an empty slice or a non-positive
    /// sample rate.
    pub fn spectrum_of(&mut self, samples: &[f64], sample_rate: f64) -> Result<Spectrum> {
        let n = samples.len();
        if n == 0 {
            return Err(GwError::InvalidInput(
                "cannot take the spectrum of an empty sequence".into(),
            ));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "sample rate must be positive and finite, got {}",
                sample_rate
            )));
        }

        let r2c = self.planner.plan_fft_forward(n);
        let mut input = samples.to_vec();
        let mut output = r2c.make_output_vec();
        r2c.process(&mut input, &mut output)
            .map_err(|e| GwError::InvalidInput(format!("FFT failed: {}", e)))?;

        let bin_width = sample_rate / n as f64;
        let frequencies = (0..output.len()).map(|k| k as f64 * bin_width).collect();
        let amplitudes = output.iter().map(|c| c.norm()).collect();

        log::debug!("Spectrum of {} samples: {} bins of {:.4} Hz", n, output.len(), bin_width);
        Ok(Spectrum {
            frequencies,
            amplitudes,
            bin_width,
        })
    }
}
