//! Raw-versus-filtered quality metrics.
//!
//! `snr_peak_*` here is a single scalar per series, `max|x| / std(x)`. It is
//! unrelated to the time-resolved matched-filter statistic in
//! [`crate::signal_processing::matched_filter`] apart from sharing the
//! standard-deviation convention.

use serde::Serialize;

use crate::constants::MIN_STD_DEV;
use crate::error::{GwError, Result};
use crate::signal_processing::math::{StdDevConvention, max_abs, mean_squared_error, std_dev};
use crate::timeseries::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsReport {
    pub max_amplitude_raw: f64,
    pub max_amplitude_filtered: f64,
    pub snr_peak_raw: f64,
    pub snr_peak_filtered: f64,
    pub mse: f64,
    pub std_dev_convention: StdDevConvention,
}

impl MetricsReport {
    /// Ratio of filtered to raw peak SNR proxy.
    pub fn snr_gain(&self) -> f64 {
        self.snr_peak_filtered / self.snr_peak_raw
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsComputer {
    convention: StdDevConvention,
}

impl MetricsComputer {
    pub fn new(convention: StdDevConvention) -> Self {
        Self { convention }
    }

    /// Compare a raw series with its filtered counterpart.
    ///
    /// # Errors
    /// - `GwError::LengthMismatch` if the lengths differ; nothing is
    ///   truncated.
    /// - `GwError::InvalidInput` if the series are on different sampling
    ///   grids.
    /// - `GwError::DegenerateSignal` if either series has zero spread.
    pub fn compare(&self, raw: &TimeSeries, filtered: &TimeSeries) -> Result<MetricsReport> {
        if raw.len() != filtered.len() {
            return Err(GwError::LengthMismatch {
                raw: raw.len(),
                filtered: filtered.len(),
            });
        }
        if !raw.same_grid(filtered) {
            return Err(GwError::InvalidInput(format!(
                "raw ({} Hz from {} s) and filtered ({} Hz from {} s) are on different grids",
                raw.sample_rate(),
                raw.t0(),
                filtered.sample_rate(),
                filtered.t0()
            )));
        }

        let report = MetricsReport {
            max_amplitude_raw: max_abs(raw.samples()),
            max_amplitude_filtered: max_abs(filtered.samples()),
            snr_peak_raw: self.amplitude_snr_proxy(raw)?,
            snr_peak_filtered: self.amplitude_snr_proxy(filtered)?,
            mse: mean_squared_error(raw.samples(), filtered.samples()),
            std_dev_convention: self.convention,
        };
        log::info!(
            "Metrics: peak SNR proxy {:.3} -> {:.3}, MSE {:.5e}",
            report.snr_peak_raw,
            report.snr_peak_filtered,
            report.mse
        );
        Ok(report)
    }

    /// `max|x| / std(x)` over the whole series.
    pub fn amplitude_snr_proxy(&self, ts: &TimeSeries) -> Result<f64> {
        let sigma = self.spread(ts)?;
        Ok(max_abs(ts.samples()) / sigma)
    }

    /// Per-sample `|x_i| / std(x)`, on the same grid as `ts`.
    pub fn amplitude_snr_series(&self, ts: &TimeSeries) -> Result<TimeSeries> {
        let sigma = self.spread(ts)?;
        ts.with_samples(ts.samples().iter().map(|x| x.abs() / sigma).collect())
    }

    fn spread(&self, ts: &TimeSeries) -> Result<f64> {
        let sigma = std_dev(ts.samples(), self.convention);
        if !(sigma > MIN_STD_DEV && sigma.is_finite()) {
            return Err(GwError::DegenerateSignal(format!(
                "series of {} samples has standard deviation {}",
                ts.len(),
                sigma
            )));
        }
        Ok(sigma)
    }
}
