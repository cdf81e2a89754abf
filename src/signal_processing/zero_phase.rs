use rayon::prelude::*;
use serde::Deserialize;

use super::filters::{FilterCoefficients, SecondOrderSection};
use crate::constants::{EDGE_TRANSIENT_DECAY, SAMPLE_SPACING_TOLERANCE};
use crate::error::{GwError, Result};
use crate::timeseries::TimeSeries;

/// How the series is extended past its ends before filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EdgePadding {
    /// Point reflection about the end sample (`2*x[0] - x[i]`)
    #[default]
    Odd,
    /// Mirror reflection (`x[i]`)
    Even,
    /// Repeat the end sample
    Constant,
    /// No extension
    None,
}

/// Forward-backward IIR filtering with zero net phase.
///
/// The sequence is extended at both ends, run through the section cascade
/// forward, reversed, run again, and reversed back. Magnitude response is
/// squared and phase cancels. Each cascade pass starts from the step
/// steady state scaled by the first sample it sees, which together with the
/// padding keeps start-up transients out of the returned samples.
///
/// Non-causal: the whole sequence must be in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroPhaseFilter {
    padding: EdgePadding,
    pad_len: Option<usize>,
}

impl ZeroPhaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the padding strategy and, optionally, its length in samples.
    ///
    /// With `pad_len = None` the length is derived from the slowest pole so
    /// the start-up transient decays inside the padding.
    pub fn with_padding(mut self, padding: EdgePadding, pad_len: Option<usize>) -> Self {
        self.padding = padding;
        self.pad_len = pad_len;
        self
    }

    pub fn padding(&self) -> EdgePadding {
        self.padding
    }

    /// Filter `ts`, returning a new series on the same grid.
    ///
    /// # Errors
    /// - `GwError::UnstableFilter` if any section has a pole on or outside the
    ///   unit circle; checked before touching the data.
    /// - `GwError::InvalidInput` if the coefficients were designed for a
    ///   different sample rate.
    pub fn apply(&self, coeffs: &FilterCoefficients, ts: &TimeSeries) -> Result<TimeSeries> {
        coeffs.check_stable()?;

        let rate_error = (coeffs.sample_rate() - ts.sample_rate()).abs() / ts.sample_rate();
        if rate_error > SAMPLE_SPACING_TOLERANCE {
            return Err(GwError::InvalidInput(format!(
                "filter designed for {} Hz applied to series sampled at {} Hz",
                coeffs.sample_rate(),
                ts.sample_rate()
            )));
        }

        let samples = ts.samples();
        let n = samples.len();
        let pad = match self.padding {
            EdgePadding::None => 0,
            _ => self
                .pad_len
                .unwrap_or_else(|| default_pad_len(coeffs))
                .min(n.saturating_sub(1)),
        };

        let zi = steady_state(coeffs.sections());

        let mut work = extend(samples, pad, self.padding);
        run_cascade(coeffs.sections(), &zi, &mut work);
        work.reverse();
        run_cascade(coeffs.sections(), &zi, &mut work);
        work.reverse();

        let filtered: Vec<f64> = work.drain(pad..pad + n).collect();
        if let Some(i) = filtered.iter().position(|v| !v.is_finite()) {
            return Err(GwError::DegenerateSignal(format!(
                "zero-phase output sample {} is not finite",
                i
            )));
        }

        log::debug!(
            "Zero-phase filtered {} samples ({} sections, {:?} padding of {} samples)",
            n,
            coeffs.sections().len(),
            self.padding,
            pad
        );
        ts.with_samples(filtered)
    }

    /// Filter several independent series concurrently.
    ///
    /// Output order matches input order; the first error encountered is
    /// returned.
    pub fn apply_batch(
        &self,
        coeffs: &FilterCoefficients,
        series: &[TimeSeries],
    ) -> Result<Vec<TimeSeries>> {
        coeffs.check_stable()?;
        series.par_iter().map(|ts| self.apply(coeffs, ts)).collect()
    }
}

/// Zero-phase filter `ts` with the default odd-reflection padding.
pub fn filtfilt(coeffs: &FilterCoefficients, ts: &TimeSeries) -> Result<TimeSeries> {
    ZeroPhaseFilter::default().apply(coeffs, ts)
}

/// Padding long enough for the slowest pole to decay below
/// `EDGE_TRANSIENT_DECAY`, never shorter than `3 * (2 * sections + 1)`.
fn default_pad_len(coeffs: &FilterCoefficients) -> usize {
    let minimum = 3 * (2 * coeffs.sections().len() + 1);
    let radius = coeffs.max_pole_radius();
    if radius <= 0.0 || radius >= 1.0 {
        return minimum;
    }
    let decay = (EDGE_TRANSIENT_DECAY.ln() / radius.ln()).ceil() as usize;
    decay.max(minimum)
}

fn extend(samples: &[f64], pad: usize, padding: EdgePadding) -> Vec<f64> {
    let n = samples.len();
    let first = samples[0];
    let last = samples[n - 1];
    let mut out = Vec::with_capacity(n + 2 * pad);

    match padding {
        EdgePadding::Odd => {
            out.extend((1..=pad).rev().map(|i| 2.0 * first - samples[i]));
            out.extend_from_slice(samples);
            out.extend((1..=pad).map(|i| 2.0 * last - samples[n - 1 - i]));
        }
        EdgePadding::Even => {
            out.extend((1..=pad).rev().map(|i| samples[i]));
            out.extend_from_slice(samples);
            out.extend((1..=pad).map(|i| samples[n - 1 - i]));
        }
        EdgePadding::Constant => {
            out.extend(std::iter::repeat_n(first, pad));
            out.extend_from_slice(samples);
            out.extend(std::iter::repeat_n(last, pad));
        }
        EdgePadding::None => out.extend_from_slice(samples),
    }
    out
}

/// Per-section transposed direct form II state for a unit step input at
/// steady state.
fn steady_state(sections: &[SecondOrderSection]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|s| {
            let [b0, b1, b2] = s.b;
            let [_, a1, a2] = s.a;
            let rhs0 = b1 - a1 * b0;
            let rhs1 = b2 - a2 * b0;
            let z0 = (rhs0 + rhs1) / (1.0 + a1 + a2);
            let z1 = rhs1 - a2 * z0;
            let zi = [scale * z0, scale * z1];
            scale *= s.dc_gain();
            zi
        })
        .collect()
}

fn run_cascade(sections: &[SecondOrderSection], zi: &[[f64; 2]], buffer: &mut [f64]) {
    // Steady-state states are pre-scaled by upstream DC gains, so every
    // section starts from the cascade input's first sample.
    let Some(&x0) = buffer.first() else {
        return;
    };
    for (s, z) in sections.iter().zip(zi) {
        let [b0, b1, b2] = s.b;
        let [_, a1, a2] = s.a;
        let mut z0 = z[0] * x0;
        let mut z1 = z[1] * x0;
        for sample in buffer.iter_mut() {
            let x = *sample;
            let y = b0 * x + z0;
            z0 = b1 * x - a1 * y + z1;
            z1 = b2 * x - a2 * y;
            *sample = y;
        }
    }
}
