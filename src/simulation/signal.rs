use std::f64::consts::PI;

use super::noise::{add_white_noise, create_rng};
use crate::error::{GwError, Result};
use crate::signal_processing::Template;
use crate::timeseries::TimeSeries;

pub fn sinusoid(freq_hz: f64, amplitude: f64, phase: f64, n: usize, sample_rate: f64) -> Vec<f64> {
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f64 / sample_rate + phase).sin())
        .collect()
}

/// A template-shaped chirp added to the strain starting at `start_s`.
#[derive(Debug, Clone, Copy)]
pub struct ChirpInjection {
    pub template: Template,
    pub start_s: f64,
    pub amplitude: f64,
}

impl ChirpInjection {
    /// Wall time the matched filter output peaks at for this injection
    /// (relative to the series start).
    pub fn aligned_time_s(&self) -> f64 {
        self.start_s + self.template.alignment_offset_s()
    }
}

/// Builder for white-noise strain with injected chirps.
#[derive(Debug, Clone)]
pub struct SyntheticStrain {
    duration_s: f64,
    sample_rate: f64,
    noise_std: f64,
    seed: Option<u64>,
    injections: Vec<ChirpInjection>,
}

impl SyntheticStrain {
    pub fn new(duration_s: f64, sample_rate: f64) -> Self {
        Self {
            duration_s,
            sample_rate,
            noise_std: 0.0,
            seed: None,
            injections: Vec::new(),
        }
    }

    pub fn with_noise(mut self, std: f64) -> Self {
        self.noise_std = std;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_injection(mut self, injection: ChirpInjection) -> Self {
        self.injections.push(injection);
        self
    }

    pub fn injections(&self) -> &[ChirpInjection] {
        &self.injections
    }

    pub fn generate(&self) -> Result<TimeSeries> {
        let n = (self.duration_s * self.sample_rate).round() as usize;
        let mut samples = vec![0.0; n];

        for injection in &self.injections {
            if (injection.template.sample_rate() - self.sample_rate).abs() > f64::EPSILON {
                return Err(GwError::InvalidInput(format!(
                    "injection sampled at {} Hz, strain at {} Hz",
                    injection.template.sample_rate(),
                    self.sample_rate
                )));
            }
            let start = (injection.start_s * self.sample_rate).round();
            if start < 0.0 || start as usize >= n {
                return Err(GwError::InvalidInput(format!(
                    "injection at {} s lies outside the {} s record",
                    injection.start_s, self.duration_s
                )));
            }
            let start = start as usize;
            for (dst, v) in samples[start..].iter_mut().zip(injection.template.samples()) {
                *dst += injection.amplitude * v;
            }
        }

        if self.noise_std > 0.0 {
            let mut rng = create_rng(self.seed);
            add_white_noise(&mut samples, self.noise_std, &mut rng)?;
        }

        TimeSeries::new(samples, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_noiseless_injection_matches_template() {
        let template = Template::chirp(30.0, 200.0, 0.5, 1024.0).unwrap();
        let strain = SyntheticStrain::new(2.0, 1024.0)
            .with_injection(ChirpInjection {
                template,
                start_s: 1.0,
                amplitude: 2.0,
            })
            .generate()
            .unwrap();
        assert_eq!(strain.len(), 2048);
        assert_eq!(strain.samples()[1023], 0.0);
        let reference = template.samples();
        assert_relative_eq!(strain.samples()[1024 + 10], 2.0 * reference[10]);
    }

    #[test]
    fn test_injection_outside_record_rejected() {
        let template = Template::chirp(30.0, 200.0, 0.5, 1024.0).unwrap();
        let result = SyntheticStrain::new(1.0, 1024.0)
            .with_injection(ChirpInjection {
                template,
                start_s: 5.0,
                amplitude: 1.0,
            })
            .generate();
        assert!(result.is_err());
    }

    #[test]
    fn test_sinusoid_phase() {
        let s = sinusoid(1.0, 2.0, 0.0, 4, 4.0);
        assert_relative_eq!(s[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(s[2], 0.0, epsilon = 1e-12);
    }
}
