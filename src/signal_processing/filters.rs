use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use iir_filters::filter_design::{FilterType, butter};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::constants::REAL_ROOT_EPSILON;
use crate::error::{GwError, Result};

/// Response shape of a Butterworth design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Pass below `high_cutoff_hz`
    Low,
    /// Pass above `low_cutoff_hz`
    High,
    /// Pass between `low_cutoff_hz` and `high_cutoff_hz`
    Band,
}

/// Parameters of a Butterworth filter, independent of sample rate.
///
/// `low_cutoff_hz` is present for high-pass and band-pass designs,
/// `high_cutoff_hz` for low-pass and band-pass designs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub order: usize,
    pub low_cutoff_hz: Option<f64>,
    pub high_cutoff_hz: Option<f64>,
}

impl FilterSpec {
    pub fn lowpass(order: usize, high_cutoff_hz: f64) -> Self {
        Self {
            kind: FilterKind::Low,
            order,
            low_cutoff_hz: None,
            high_cutoff_hz: Some(high_cutoff_hz),
        }
    }

    pub fn highpass(order: usize, low_cutoff_hz: f64) -> Self {
        Self {
            kind: FilterKind::High,
            order,
            low_cutoff_hz: Some(low_cutoff_hz),
            high_cutoff_hz: None,
        }
    }

    pub fn bandpass(order: usize, low_cutoff_hz: f64, high_cutoff_hz: f64) -> Self {
        Self {
            kind: FilterKind::Band,
            order,
            low_cutoff_hz: Some(low_cutoff_hz),
            high_cutoff_hz: Some(high_cutoff_hz),
        }
    }

    /// Check order, cutoff presence and `0 < low < high < nyquist`.
    ///
    /// # Errors
    /// Returns `GwError::InvalidFilterSpec` naming the offending values, or
    /// `GwError::InvalidInput` for a non-positive sample rate.
    pub fn validate(&self, sample_rate: f64) -> Result<()> {
        self.filter_type(sample_rate).map(|_| ())
    }

    fn filter_type(&self, sample_rate: f64) -> Result<FilterType> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "sample rate must be positive and finite, got {}",
                sample_rate
            )));
        }
        if self.order < 1 {
            return Err(GwError::InvalidFilterSpec(format!(
                "order must be at least 1, got {}",
                self.order
            )));
        }

        let nyquist = sample_rate / 2.0;
        let check_cutoff = |name: &str, hz: f64| -> Result<f64> {
            if !(hz.is_finite() && hz > 0.0 && hz < nyquist) {
                return Err(GwError::InvalidFilterSpec(format!(
                    "{} cutoff {} Hz must lie in (0, {}) Hz for sample rate {} Hz",
                    name, hz, nyquist, sample_rate
                )));
            }
            Ok(hz)
        };

        match (self.kind, self.low_cutoff_hz, self.high_cutoff_hz) {
            (FilterKind::Low, None, Some(high)) => {
                Ok(FilterType::LowPass(check_cutoff("high", high)?))
            }
            (FilterKind::High, Some(low), None) => {
                Ok(FilterType::HighPass(check_cutoff("low", low)?))
            }
            (FilterKind::Band, Some(low), Some(high)) => {
                let low = check_cutoff("low", low)?;
                let high = check_cutoff("high", high)?;
                if low >= high {
                    return Err(GwError::InvalidFilterSpec(format!(
                        "band low cutoff {} Hz must be below high cutoff {} Hz",
                        low, high
                    )));
                }
                Ok(FilterType::BandPass(low, high))
            }
            (kind, low, high) => Err(GwError::InvalidFilterSpec(format!(
                "{:?} filter has cutoffs low={:?} high={:?}",
                kind, low, high
            ))),
        }
    }
}

/// One biquad of a cascade, `a[0]` normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondOrderSection {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl SecondOrderSection {
    /// Build a section, dividing through by `a[0]`.
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Result<Self> {
        if a[0] == 0.0 || !a[0].is_finite() {
            return Err(GwError::InvalidFilterSpec(format!(
                "leading denominator coefficient must be non-zero, got {}",
                a[0]
            )));
        }
        if b.iter().chain(a.iter()).any(|c| !c.is_finite()) {
            return Err(GwError::InvalidFilterSpec(format!(
                "non-finite section coefficients b={:?} a={:?}",
                b, a
            )));
        }
        let a0 = a[0];
        Ok(Self {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [1.0, a[1] / a0, a[2] / a0],
        })
    }

    /// Roots of `z^2 + a1 z + a2`.
    pub fn poles(&self) -> [Complex<f64>; 2] {
        let (a1, a2) = (self.a[1], self.a[2]);
        let disc = Complex::new(a1 * a1 - 4.0 * a2, 0.0).sqrt();
        let minus_a1 = Complex::new(-a1, 0.0);
        [(minus_a1 + disc) / 2.0, (minus_a1 - disc) / 2.0]
    }

    pub fn pole_radius(&self) -> f64 {
        let [p0, p1] = self.poles();
        p0.norm().max(p1.norm())
    }

    /// Gain at z = 1.
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    fn response(&self, z_inv: Complex<f64>) -> Complex<f64> {
        let z_inv2 = z_inv * z_inv;
        let num = Complex::new(self.b[0], 0.0) + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = Complex::new(self.a[0], 0.0) + z_inv * self.a[1] + z_inv2 * self.a[2];
        num / den
    }
}

/// Realized filter: a cascade of second-order sections at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    sections: Vec<SecondOrderSection>,
    sample_rate: f64,
}

impl FilterCoefficients {
    pub fn from_sections(sections: Vec<SecondOrderSection>, sample_rate: f64) -> Result<Self> {
        if sections.is_empty() {
            return Err(GwError::InvalidFilterSpec(
                "filter needs at least one section".into(),
            ));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(GwError::InvalidInput(format!(
                "sample rate must be positive and finite, got {}",
                sample_rate
            )));
        }
        Ok(Self {
            sections,
            sample_rate,
        })
    }

    pub fn sections(&self) -> &[SecondOrderSection] {
        &self.sections
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn poles(&self) -> Vec<Complex<f64>> {
        self.sections.iter().flat_map(|s| s.poles()).collect()
    }

    pub fn max_pole_radius(&self) -> f64 {
        self.sections
            .iter()
            .map(SecondOrderSection::pole_radius)
            .fold(0.0, f64::max)
    }

    pub fn is_stable(&self) -> bool {
        self.check_stable().is_ok()
    }

    /// Require every pole strictly inside the unit circle.
    ///
    /// # Errors
    /// Returns `GwError::UnstableFilter` for the first offending section.
    pub fn check_stable(&self) -> Result<()> {
        for (section, sos) in self.sections.iter().enumerate() {
            let pole_magnitude = sos.pole_radius();
            if !(pole_magnitude < 1.0) {
                return Err(GwError::UnstableFilter {
                    section,
                    pole_magnitude,
                });
            }
        }
        Ok(())
    }

    /// Transfer function numerator in powers of `z^-1`.
    pub fn numerator(&self) -> Vec<f64> {
        expand(self.sections.iter().map(|s| s.b))
    }

    /// Transfer function denominator in powers of `z^-1`, leading 1.
    pub fn denominator(&self) -> Vec<f64> {
        expand(self.sections.iter().map(|s| s.a))
    }

    /// |H(e^{jω})| at `freq_hz` for a single (causal) pass.
    pub fn magnitude_response(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate;
        let z_inv = Complex::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
            .norm()
    }
}

fn expand(polys: impl Iterator<Item = [f64; 3]>) -> Vec<f64> {
    let mut out = polys.fold(vec![1.0], |acc, p| {
        let mut product = vec![0.0; acc.len() + 2];
        for (i, &x) in acc.iter().enumerate() {
            for (j, &y) in p.iter().enumerate() {
                product[i + j] += x * y;
            }
        }
        product
    });
    while out.len() > 1 && out.last() == Some(&0.0) {
        out.pop();
    }
    out
}

type RootPair = (Complex<f64>, Option<Complex<f64>>);

/// Group roots into conjugate pairs; real roots pair with each other.
fn pair_roots(roots: &[Complex<f64>]) -> Vec<RootPair> {
    let is_real = |r: &Complex<f64>| r.im.abs() <= REAL_ROOT_EPSILON * r.norm().max(1.0);

    let mut pairs: Vec<RootPair> = roots
        .iter()
        .filter(|r| !is_real(r) && r.im > 0.0)
        .map(|&r| (r, Some(r.conj())))
        .collect();

    let reals: Vec<Complex<f64>> = roots
        .iter()
        .filter(|r| is_real(r))
        .map(|r| Complex::new(r.re, 0.0))
        .collect();
    for chunk in reals.chunks(2) {
        pairs.push((chunk[0], chunk.get(1).copied()));
    }
    pairs
}

fn pair_radius(pair: &RootPair) -> f64 {
    pair.1.map_or(pair.0.norm(), |r| pair.0.norm().max(r.norm()))
}

fn pair_to_poly(pair: RootPair) -> [f64; 3] {
    match pair {
        (r0, Some(r1)) => [1.0, -(r0 + r1).re, (r0 * r1).re],
        (r0, None) => [1.0, -r0.re, 0.0],
    }
}

fn zpk_to_sections(
    zeros: &[Complex<f64>],
    poles: &[Complex<f64>],
    gain: f64,
) -> Vec<SecondOrderSection> {
    let mut pole_pairs = pair_roots(poles);
    // Poles nearest the unit circle go last in the cascade
    pole_pairs.sort_by(|a, b| pair_radius(a).total_cmp(&pair_radius(b)));
    let zero_pairs = pair_roots(zeros);

    let n_sections = pole_pairs.len().max(zero_pairs.len()).max(1);
    let mut sections: Vec<SecondOrderSection> = (0..n_sections)
        .map(|i| SecondOrderSection {
            b: zero_pairs
                .get(i)
                .map_or([1.0, 0.0, 0.0], |&z| pair_to_poly(z)),
            a: pole_pairs
                .get(i)
                .map_or([1.0, 0.0, 0.0], |&p| pair_to_poly(p)),
        })
        .collect();

    if let Some(first) = sections.first_mut() {
        for c in first.b.iter_mut() {
            *c *= gain;
        }
    }
    sections
}

/// Design a digital Butterworth filter for `spec` at `sample_rate`.
///
/// Cutoffs are given in Hz and normalized to Nyquist inside the design. The
/// result is deterministic for identical arguments.
///
/// # Errors
/// Returns `GwError::InvalidFilterSpec` if the Nyquist ordering or the order
/// constraint is violated, before any coefficients are computed.
pub fn design(spec: &FilterSpec, sample_rate: f64) -> Result<FilterCoefficients> {
    let filter_type = spec.filter_type(sample_rate)?;
    let zpk = butter(spec.order as u32, filter_type, sample_rate)
        .map_err(|e| GwError::InvalidFilterSpec(format!("{:?}", e)))?;

    let sections = zpk_to_sections(&zpk.z, &zpk.p, zpk.k);
    let coeffs = FilterCoefficients::from_sections(sections, sample_rate)?;

    log::debug!(
        "Designed {:?} Butterworth N={} ({:?}-{:?} Hz @ {} Hz): {} sections, |p|max {:.6}",
        spec.kind,
        spec.order,
        spec.low_cutoff_hz,
        spec.high_cutoff_hz,
        sample_rate,
        coeffs.sections().len(),
        coeffs.max_pole_radius()
    );
    Ok(coeffs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DesignKey {
    kind: FilterKind,
    order: usize,
    low_bits: Option<u64>,
    high_bits: Option<u64>,
    rate_bits: u64,
}

impl DesignKey {
    fn new(spec: &FilterSpec, sample_rate: f64) -> Self {
        Self {
            kind: spec.kind,
            order: spec.order,
            low_bits: spec.low_cutoff_hz.map(f64::to_bits),
            high_bits: spec.high_cutoff_hz.map(f64::to_bits),
            rate_bits: sample_rate.to_bits(),
        }
    }
}

/// Memoized designs, one per distinct `(FilterSpec, sample_rate)`.
#[derive(Debug, Default)]
pub struct DesignCache {
    designs: HashMap<DesignKey, Arc<FilterCoefficients>>,
}

impl DesignCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_design(
        &mut self,
        spec: &FilterSpec,
        sample_rate: f64,
    ) -> Result<Arc<FilterCoefficients>> {
        let key = DesignKey::new(spec, sample_rate);
        if let Some(coeffs) = self.designs.get(&key) {
            return Ok(Arc::clone(coeffs));
        }
        let coeffs = Arc::new(design(spec, sample_rate)?);
        self.designs.insert(key, Arc::clone(&coeffs));
        Ok(coeffs)
    }

    pub fn len(&self) -> usize {
        self.designs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FS: f64 = 4096.0;

    #[test]
    fn test_bandpass_filter_design() {
        let coeffs = design(&FilterSpec::bandpass(4, 20.0, 500.0), FS).unwrap();
        assert_eq!(coeffs.sections().len(), 4);
        assert!(coeffs.is_stable());
        assert_eq!(coeffs.numerator().len(), 9);
        assert_eq!(coeffs.denominator().len(), 9);
        assert_relative_eq!(coeffs.denominator()[0], 1.0);
    }

    #[test]
    fn test_highpass_filter_design() {
        let coeffs = design(&FilterSpec::highpass(4, 30.0), FS).unwrap();
        assert!(coeffs.is_stable());
        assert!(coeffs.magnitude_response(0.0) < 1e-9);
        assert_relative_eq!(coeffs.magnitude_response(1000.0), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_lowpass_unity_dc_gain() {
        let coeffs = design(&FilterSpec::lowpass(3, 200.0), FS).unwrap();
        assert_relative_eq!(coeffs.magnitude_response(0.0), 1.0, epsilon = 1e-9);
        assert_eq!(coeffs.numerator().len(), 4);
    }

    #[test]
    fn test_bandpass_passes_center_frequency() {
        let coeffs = design(&FilterSpec::bandpass(4, 20.0, 500.0), FS).unwrap();
        let center = coeffs.magnitude_response(100.0);
        assert!(
            (center - 1.0).abs() < 1e-3,
            "Center frequency gain {} should be ~1",
            center
        );
        assert!(coeffs.magnitude_response(1500.0) < 0.05);
        assert!(coeffs.magnitude_response(2.0) < 0.05);
    }

    #[test]
    fn test_inverted_band_rejected() {
        let result = design(&FilterSpec::bandpass(4, 600.0, 20.0), FS);
        assert!(matches!(result, Err(GwError::InvalidFilterSpec(_))));
    }

    #[test]
    fn test_cutoff_at_or_above_nyquist_rejected() {
        for spec in [
            FilterSpec::lowpass(4, 2048.0),
            FilterSpec::highpass(4, 3000.0),
            FilterSpec::bandpass(4, 20.0, 2048.0),
            FilterSpec::highpass(4, 0.0),
            FilterSpec::highpass(4, -5.0),
        ] {
            assert!(
                matches!(design(&spec, FS), Err(GwError::InvalidFilterSpec(_))),
                "{:?} should be rejected",
                spec
            );
        }
    }

    #[test]
    fn test_order_zero_and_missing_cutoff_rejected() {
        assert!(matches!(
            design(&FilterSpec::bandpass(0, 20.0, 500.0), FS),
            Err(GwError::InvalidFilterSpec(_))
        ));
        let spec = FilterSpec {
            kind: FilterKind::Band,
            order: 4,
            low_cutoff_hz: Some(20.0),
            high_cutoff_hz: None,
        };
        assert!(matches!(
            design(&spec, FS),
            Err(GwError::InvalidFilterSpec(_))
        ));
    }

    #[test]
    fn test_unstable_section_detected() {
        let sos = SecondOrderSection::new([1.0, 0.0, 0.0], [1.0, 0.0, 1.2]).unwrap();
        let coeffs = FilterCoefficients::from_sections(vec![sos], FS).unwrap();
        match coeffs.check_stable() {
            Err(GwError::UnstableFilter {
                section,
                pole_magnitude,
            }) => {
                assert_eq!(section, 0);
                assert_relative_eq!(pole_magnitude, 1.2f64.sqrt(), epsilon = 1e-12);
            }
            other => panic!("expected UnstableFilter, got {:?}", other),
        }
    }

    #[test]
    fn test_section_normalizes_leading_coefficient() {
        let sos = SecondOrderSection::new([2.0, 4.0, 2.0], [2.0, -1.0, 0.5]).unwrap();
        assert_eq!(sos.a, [1.0, -0.5, 0.25]);
        assert_eq!(sos.b, [1.0, 2.0, 1.0]);
        assert!(SecondOrderSection::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).is_err());
    }

    #[test]
    fn test_cache_reuses_design() {
        let mut cache = DesignCache::new();
        let spec = FilterSpec::bandpass(4, 20.0, 500.0);
        let first = cache.get_or_design(&spec, FS).unwrap();
        let second = cache.get_or_design(&spec, FS).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        cache.get_or_design(&spec, 8192.0).unwrap();
        assert_eq!(cache.len(), 2);
    }
}
