//! Chirp template generation and FFT cross-correlation.
//!
//! The detection statistic here is an amplitude proxy: the raw correlation
//! divided by its own standard deviation. There is no noise PSD whitening,
//! so the values carry no false-alarm-rate calibration.

use std::f64::consts::PI;

use realfft::RealFftPlanner;

use super::math::{StdDevConvention, argmax, median, std_dev};
use crate::constants::{MIN_STD_DEV, SAMPLE_SPACING_TOLERANCE};
use crate::error::{GwError, Result};
use crate::timeseries::TimeSeries;

/// Linearly chirping sinusoid `sin(2π (f0 t + k t²))`.
///
/// Instantaneous frequency is `f0 + 2 k t`, so the sweep ends at
/// `f0 + 2 k duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Template {
    f0_hz: f64,
    chirp_rate: f64,
    duration_s: f64,
    sample_rate: f64,
    taper_fraction: f64,
}

impl Template {
    /// # Errors
    /// Returns `GwError::InvalidInput` if any parameter is non-finite, the
    /// duration or sample rate is not positive, the template would have no
    /// samples, or the sweep would exceed Nyquist.
    pub fn chirp(f0_hz: f64, chirp_rate: f64, duration_s: f64, sample_rate: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "template sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "template duration must be positive, got {} s",
                duration_s
            )));
        }
        if !(f0_hz.is_finite() && f0_hz >= 0.0 && chirp_rate.is_finite()) {
            return Err(GwError::InvalidInput(format!(
                "invalid chirp law f0={} Hz, k={} Hz/s",
                f0_hz, chirp_rate
            )));
        }

        let template = Self {
            f0_hz,
            chirp_rate,
            duration_s,
            sample_rate,
            taper_fraction: 0.0,
        };
        if template.len() == 0 {
            return Err(GwError::InvalidInput(format!(
                "template of {} s at {} Hz has no samples",
                duration_s, sample_rate
            )));
        }

        let nyquist = sample_rate / 2.0;
        let f_end = template.instantaneous_frequency(duration_s);
        if f_end >= nyquist || f_end < 0.0 {
            return Err(GwError::InvalidInput(format!(
                "chirp sweeps {} Hz -> {} Hz, outside [0, {}) Hz",
                f0_hz, f_end, nyquist
            )));
        }
        Ok(template)
    }

    /// Apply a Tukey taper covering `fraction` of the template (0 = none).
    pub fn with_taper(mut self, fraction: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(GwError::InvalidInput(format!(
                "taper fraction must be in [0, 1], got {}",
                fraction
            )));
        }
        self.taper_fraction = fraction;
        Ok(self)
    }

    pub fn f0_hz(&self) -> f64 {
        self.f0_hz
    }

    pub fn chirp_rate(&self) -> f64 {
        self.chirp_rate
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        (self.duration_s * self.sample_rate).round() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn instantaneous_frequency(&self, t: f64) -> f64 {
        self.f0_hz + 2.0 * self.chirp_rate * t
    }

    /// Time from the template's first sample to the sample the correlation
    /// output is aligned on.
    pub fn alignment_offset_s(&self) -> f64 {
        (self.len() / 2) as f64 / self.sample_rate
    }

    /// Template samples on `t_i = i / sample_rate`.
    pub fn samples(&self) -> Vec<f64> {
        let n = self.len();
        (0..n)
            .map(|i| {
                let t = i as f64 / self.sample_rate;
                let phase = 2.0 * PI * (self.f0_hz * t + self.chirp_rate * t * t);
                phase.sin() * tukey(i, n, self.taper_fraction)
            })
            .collect()
    }
}

fn tukey(i: usize, n: usize, alpha: f64) -> f64 {
    if alpha <= 0.0 || n < 2 {
        return 1.0;
    }
    let x = i as f64 / (n - 1) as f64;
    let edge = alpha / 2.0;
    if x < edge {
        0.5 * (1.0 - (PI * x / edge).cos())
    } else if x > 1.0 - edge {
        0.5 * (1.0 - (PI * (1.0 - x) / edge).cos())
    } else {
        1.0
    }
}

/// Time-resolved matched-filter SNR proxy, aligned sample-for-sample with
/// the analysed series.
#[derive(Debug, Clone, PartialEq)]
pub struct SnrSeries {
    series: TimeSeries,
    correlation_std: f64,
    convention: StdDevConvention,
}

/// Location and height of the SNR maximum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnrPeak {
    pub index: usize,
    pub time: f64,
    pub snr: f64,
}

impl SnrSeries {
    pub fn values(&self) -> &[f64] {
        self.series.samples()
    }

    pub fn as_time_series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn into_time_series(self) -> TimeSeries {
        self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Standard deviation the raw correlation was divided by.
    pub fn correlation_std(&self) -> f64 {
        self.correlation_std
    }

    pub fn convention(&self) -> StdDevConvention {
        self.convention
    }

    pub fn peak(&self) -> SnrPeak {
        let (index, snr) = argmax(self.values()).unwrap_or((0, 0.0));
        SnrPeak {
            index,
            time: self.series.time_at(index),
            snr,
        }
    }

    pub fn median(&self) -> f64 {
        median(self.values())
    }
}

/// Cross-correlates a series against a chirp template.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchedFilterEngine {
    convention: StdDevConvention,
}

impl MatchedFilterEngine {
    pub fn new(convention: StdDevConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> StdDevConvention {
        self.convention
    }

    /// `snr[i] = |c[i]| / std(c)` where `c` is the "same"-aligned
    /// cross-correlation of `ts` with the template and the standard
    /// deviation is taken over all of `c`.
    ///
    /// # Errors
    /// - `GwError::InvalidInput` if the template is sampled at a different
    ///   rate or is longer than the series.
    /// - `GwError::DegenerateSignal` if the series or its correlation has
    ///   zero spread.
    pub fn detect(&self, ts: &TimeSeries, template: &Template) -> Result<SnrSeries> {
        let rate_error = (template.sample_rate() - ts.sample_rate()).abs() / ts.sample_rate();
        if rate_error > SAMPLE_SPACING_TOLERANCE {
            return Err(GwError::InvalidInput(format!(
                "template sampled at {} Hz, series at {} Hz",
                template.sample_rate(),
                ts.sample_rate()
            )));
        }
        if template.len() > ts.len() {
            return Err(GwError::InvalidInput(format!(
                "template has {} samples, series only {}",
                template.len(),
                ts.len()
            )));
        }
        if template.len() * 2 > ts.len() {
            log::warn!(
                "Template covers {:.0}% of the series; edge correlation dominates",
                100.0 * template.len() as f64 / ts.len() as f64
            );
        }

        let signal_std = std_dev(ts.samples(), self.convention);
        if !(signal_std > MIN_STD_DEV && signal_std.is_finite()) {
            return Err(GwError::DegenerateSignal(format!(
                "series of {} samples has standard deviation {}",
                ts.len(),
                signal_std
            )));
        }

        let correlation = correlate_same(ts.samples(), &template.samples())?;
        let correlation_std = std_dev(&correlation, self.convention);
        if !(correlation_std > MIN_STD_DEV && correlation_std.is_finite()) {
            return Err(GwError::DegenerateSignal(format!(
                "correlation standard deviation is {} over {} samples",
                correlation_std,
                correlation.len()
            )));
        }

        let snr: Vec<f64> = correlation
            .iter()
            .map(|c| c.abs() / correlation_std)
            .collect();
        let series = ts.with_samples(snr)?;
        log::debug!(
            "Matched filter: {} samples against {}-sample template, correlation std {:.3e}",
            ts.len(),
            template.len(),
            correlation_std
        );

        Ok(SnrSeries {
            series,
            correlation_std,
            convention: self.convention,
        })
    }
}

/// Cross-correlation of `signal` with `template`, trimmed to `signal.len()`
/// and centred: output `i` has template sample `M / 2` over `signal[i]`,
/// i.e. the centred "same"-mode window of the full correlation.
///
/// Computed as an FFT convolution with the reversed template.
pub fn correlate_same(signal: &[f64], template: &[f64]) -> Result<Vec<f64>> {
    let n = signal.len();
    let m = template.len();
    if n == 0 || m == 0 {
        return Err(GwError::InvalidInput(format!(
            "correlation needs non-empty inputs, got {} and {} samples",
            n, m
        )));
    }

    let nfft = (n + m - 1).next_power_of_two();
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(nfft);
    let c2r = planner.plan_fft_inverse(nfft);
    let fft_err = |e: realfft::FftError| GwError::InvalidInput(format!("FFT failed: {}", e));

    let mut signal_buf = r2c.make_input_vec();
    signal_buf[..n].copy_from_slice(signal);
    let mut template_buf = r2c.make_input_vec();
    for (dst, &src) in template_buf.iter_mut().zip(template.iter().rev()) {
        *dst = src;
    }

    let mut signal_spec = r2c.make_output_vec();
    let mut template_spec = r2c.make_output_vec();
    r2c.process(&mut signal_buf, &mut signal_spec).map_err(fft_err)?;
    r2c.process(&mut template_buf, &mut template_spec)
        .map_err(fft_err)?;

    for (s, t) in signal_spec.iter_mut().zip(&template_spec) {
        *s *= *t;
    }
    // DC and Nyquist bins of a real transform are real
    signal_spec[0].im = 0.0;
    if nfft.is_multiple_of(2) {
        if let Some(last) = signal_spec.last_mut() {
            last.im = 0.0;
        }
    }

    let mut full = c2r.make_output_vec();
    c2r.process(&mut signal_spec, &mut full).map_err(fft_err)?;

    let scale = 1.0 / nfft as f64;
    let start = (m - 1) / 2;
    Ok(full[start..start + n].iter().map(|v| v * scale).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn direct_correlate_same(signal: &[f64], template: &[f64]) -> Vec<f64> {
        let n = signal.len() as isize;
        let m = template.len() as isize;
        let half = m / 2;
        (0..n)
            .map(|i| {
                (0..m)
                    .filter_map(|j| {
                        let k = i - half + j;
                        (0..n)
                            .contains(&k)
                            .then(|| signal[k as usize] * template[j as usize])
                    })
                    .sum()
            })
            .collect()
    }

    #[test]
    fn test_correlate_same_matches_direct() {
        let signal: Vec<f64> = (0..37).map(|i| ((i * 7 % 11) as f64 - 5.0) * 0.3).collect();
        for template in [vec![1.0, -2.0, 0.5], vec![0.25, 1.0, 3.0, -1.0], vec![2.0]] {
            let fast = correlate_same(&signal, &template).unwrap();
            let slow = direct_correlate_same(&signal, &template);
            assert_eq!(fast.len(), signal.len());
            for (a, b) in fast.iter().zip(&slow) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_template_law() {
        let template = Template::chirp(30.0, 200.0, 1.0, 4096.0).unwrap();
        assert_eq!(template.len(), 4096);
        assert_relative_eq!(template.instantaneous_frequency(1.0), 430.0);
        let samples = template.samples();
        assert_relative_eq!(samples[0], 0.0);
        let t = 100.0 / 4096.0;
        assert_relative_eq!(
            samples[100],
            (2.0 * PI * (30.0 * t + 200.0 * t * t)).sin(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_template_rejects_aliasing_sweep() {
        assert!(matches!(
            Template::chirp(30.0, 2000.0, 1.0, 4096.0),
            Err(GwError::InvalidInput(_))
        ));
        assert!(Template::chirp(30.0, 200.0, 0.0, 4096.0).is_err());
        assert!(Template::chirp(30.0, 200.0, 1e-6, 4096.0).is_err());
    }

    #[test]
    fn test_taper_zeroes_ends() {
        let template = Template::chirp(30.0, 200.0, 0.5, 4096.0)
            .unwrap()
            .with_taper(0.2)
            .unwrap();
        let samples = template.samples();
        assert_relative_eq!(samples[0], 0.0);
        assert_relative_eq!(*samples.last().unwrap(), 0.0, epsilon = 1e-12);
        assert!(Template::chirp(30.0, 200.0, 0.5, 4096.0)
            .unwrap()
            .with_taper(1.5)
            .is_err());
    }

    #[test]
    fn test_detect_peaks_at_embedded_template() {
        let fs = 1024.0;
        let template = Template::chirp(20.0, 100.0, 0.5, fs).unwrap();
        let mut samples = vec![0.0; 4096];
        let start = 1500;
        for (dst, v) in samples[start..].iter_mut().zip(template.samples()) {
            *dst += v;
        }
        // Deterministic low-level clutter so the correlation is not sparse
        for (i, s) in samples.iter_mut().enumerate() {
            *s += 0.01 * ((i * 37 % 101) as f64 / 101.0 - 0.5);
        }
        let ts = TimeSeries::new(samples, fs).unwrap();

        let snr = MatchedFilterEngine::default().detect(&ts, &template).unwrap();
        assert_eq!(snr.len(), ts.len());
        assert!(snr.values().iter().all(|&v| v >= 0.0));
        let peak = snr.peak();
        let expected = start + template.len() / 2;
        assert!(
            peak.index.abs_diff(expected) <= 1,
            "peak at {} expected {}",
            peak.index,
            expected
        );
        assert!(peak.snr > 5.0 * snr.median());
    }

    #[test]
    fn test_zero_signal_is_degenerate() {
        let template = Template::chirp(30.0, 200.0, 0.25, 4096.0).unwrap();
        let ts = TimeSeries::new(vec![0.0; 4096], 4096.0).unwrap();
        assert!(matches!(
            MatchedFilterEngine::default().detect(&ts, &template),
            Err(GwError::DegenerateSignal(_))
        ));
    }

    #[test]
    fn test_constant_signal_is_degenerate() {
        let template = Template::chirp(30.0, 200.0, 1.0, 4096.0).unwrap();
        let ts = TimeSeries::new(vec![5.0; 8192], 4096.0).unwrap();
        assert!(matches!(
            MatchedFilterEngine::default().detect(&ts, &template),
            Err(GwError::DegenerateSignal(_))
        ));
        assert!(matches!(
            MatchedFilterEngine::new(StdDevConvention::Sample).detect(&ts, &template),
            Err(GwError::DegenerateSignal(_))
        ));
    }

    #[test]
    fn test_template_longer_than_series_rejected() {
        let template = Template::chirp(30.0, 200.0, 2.0, 4096.0).unwrap();
        let ts = TimeSeries::new(vec![1.0; 4096], 4096.0).unwrap();
        assert!(matches!(
            MatchedFilterEngine::default().detect(&ts, &template),
            Err(GwError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_template_rate_mismatch_rejected() {
        let template = Template::chirp(30.0, 200.0, 0.25, 2048.0).unwrap();
        let ts = TimeSeries::new(vec![1.0; 4096], 4096.0).unwrap();
        assert!(MatchedFilterEngine::default().detect(&ts, &template).is_err());
    }
}
