//! Uniformly-sampled real-valued series.
//!
//! Every pipeline stage consumes a `TimeSeries` by reference and hands back a
//! freshly allocated one, so filtered output never aliases the source buffer.

use crate::constants::SAMPLE_SPACING_TOLERANCE;
use crate::error::{GwError, Result};

/// Time-ordered samples plus the sampling grid they live on.
///
/// The sample rate is canonical; `dt` is derived. Sample `i` sits at wall
/// time `t0 + i / sample_rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    samples: Vec<f64>,
    sample_rate: f64,
    t0: f64,
}

impl TimeSeries {
    /// Build a series from samples and a sample rate in Hz.
    ///
    /// # Errors
    /// Returns `GwError::InvalidInput` for an empty sequence, a non-finite
    /// sample, or a sample rate that is not a positive finite number.
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(GwError::InvalidInput("time series has no samples".into()));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "sample rate must be positive and finite, got {}",
                sample_rate
            )));
        }
        if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
            return Err(GwError::InvalidInput(format!(
                "sample {} is not finite ({})",
                i, samples[i]
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            t0: 0.0,
        })
    }

    /// Build a series from samples and a sample spacing in seconds.
    pub fn from_spacing(samples: Vec<f64>, dt: f64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "sample spacing must be positive and finite, got {}",
                dt
            )));
        }
        Self::new(samples, 1.0 / dt)
    }

    /// Set the wall time of sample 0.
    pub fn with_start_time(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }

    /// A new series on the same grid as `self` carrying different samples.
    ///
    /// Used by stages whose output is sample-for-sample aligned with their
    /// input.
    pub(crate) fn with_samples(&self, samples: Vec<f64>) -> Result<Self> {
        if samples.len() != self.samples.len() {
            return Err(GwError::LengthMismatch {
                raw: self.samples.len(),
                filtered: samples.len(),
            });
        }
        Ok(Self::new(samples, self.sample_rate)?.with_start_time(self.t0))
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed series; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Span covered by the samples in seconds (`N * dt`).
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    pub fn time_at(&self, index: usize) -> f64 {
        self.t0 + index as f64 / self.sample_rate
    }

    /// Wall-time axis, one entry per sample.
    pub fn times(&self) -> Vec<f64> {
        (0..self.samples.len()).map(|i| self.time_at(i)).collect()
    }

    /// Index of the sample nearest to wall time `t`, if `t` falls on the grid.
    pub fn index_of(&self, t: f64) -> Option<usize> {
        let offset = ((t - self.t0) * self.sample_rate).round();
        if offset < 0.0 || !offset.is_finite() {
            return None;
        }
        let index = offset as usize;
        (index < self.samples.len()).then_some(index)
    }

    /// True when `other` is sampled on the same grid (rate and start time).
    pub fn same_grid(&self, other: &TimeSeries) -> bool {
        let rate_ok = ((self.sample_rate - other.sample_rate) / self.sample_rate).abs()
            <= SAMPLE_SPACING_TOLERANCE;
        let t0_ok = (self.t0 - other.t0).abs() <= self.dt() * SAMPLE_SPACING_TOLERANCE;
        rate_ok && t0_ok
    }

    /// Copy out the samples within `half_width_s` of `center_s`.
    ///
    /// The window is clipped to the series bounds; the result keeps absolute
    /// wall times via its start time.
    pub fn window(&self, center_s: f64, half_width_s: f64) -> Result<TimeSeries> {
        if !(half_width_s.is_finite() && half_width_s > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "window half width must be positive, got {}",
                half_width_s
            )));
        }
        let n = self.samples.len() as f64;
        let start = (((center_s - half_width_s) - self.t0) * self.sample_rate)
            .round()
            .clamp(0.0, n) as usize;
        let end = (((center_s + half_width_s) - self.t0) * self.sample_rate)
            .round()
            .clamp(0.0, n) as usize;
        if start >= end {
            return Err(GwError::InvalidInput(format!(
                "window {:.4}s ± {:.4}s lies outside [{:.4}s, {:.4}s)",
                center_s,
                half_width_s,
                self.t0,
                self.t0 + self.duration()
            )));
        }
        Ok(
            TimeSeries::new(self.samples[start..end].to_vec(), self.sample_rate)?
                .with_start_time(self.time_at(start)),
        )
    }
}
