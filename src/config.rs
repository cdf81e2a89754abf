//! Configuration for the strain denoising pipeline.
//!
//! Every parameter the numerical core depends on is carried explicitly here
//! and handed to the components; nothing is read from globals. A
//! `PipelineConfig` can be built in code, loaded from TOML, or patched from
//! command-line flags:
//!
//! ```toml
//! [filter]
//! kind = "band"
//! order = 4
//! low_hz = 20.0
//! high_hz = 500.0
//!
//! [template]
//! f0_hz = 30.0
//! chirp_rate = 200.0
//! duration_s = 1.0
//!
//! [snr]
//! std_dev = "population"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{GwError, Result};
use crate::signal_processing::{
    EdgePadding, FilterKind, FilterSpec, StdDevConvention, Template,
};

/// Sampling specification
///
/// Strain sources describe their grid either as a rate or as a sample
/// spacing. Both parse into the same value.
///
/// # Parsing formats
/// - `4096` - rate in Hz (no suffix)
/// - `4096hz` or `4096Hz` - rate in Hz (explicit)
/// - `0.000244140625s`, `0.244140625ms`, `244.140625us` or `244.140625μs` -
///   sample spacing
///
/// # Example
/// ```
/// use gwdenoise::config::SampleRate;
///
/// let rate: SampleRate = "244.140625us".parse().unwrap();
/// assert!((rate.as_hz() - 4096.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate(f64);

impl SampleRate {
    pub fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    pub fn from_spacing_s(dt: f64) -> Self {
        Self(1.0 / dt)
    }

    pub fn as_hz(&self) -> f64 {
        self.0
    }

    pub fn spacing_s(&self) -> f64 {
        1.0 / self.0
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        // Open strain data release rate
        Self::from_hz(4096.0)
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hz", self.0)
    }
}

impl FromStr for SampleRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        let spacing = [("us", 1e-6), ("μs", 1e-6), ("ms", 1e-3)]
            .iter()
            .find_map(|&(suffix, scale)| s.strip_suffix(suffix).map(|num| (num, scale)))
            .or_else(|| {
                // Plain seconds, but not the tail of an "hz" suffix
                s.strip_suffix('s').map(|num| (num, 1.0))
            });

        if let Some((num, scale)) = spacing {
            let value: f64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid sample spacing: {}", s))?;
            let dt = value * scale;
            if !(dt.is_finite() && dt > 0.0) {
                return Err("sample spacing must be positive".to_string());
            }
            return Ok(Self::from_spacing_s(dt));
        }

        let num = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
            .unwrap_or(s);

        let hz: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid sample rate: {}", s))?;
        if !(hz.is_finite() && hz > 0.0) {
            return Err("sample rate must be positive".to_string());
        }
        Ok(Self::from_hz(hz))
    }
}

/// Complete pipeline configuration
///
/// # Example
/// ```
/// use gwdenoise::config::PipelineConfig;
///
/// let mut config = PipelineConfig::default();
/// config.filter.low_hz = Some(30.0);
/// config.filter.high_hz = Some(300.0);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Denoising filter
    pub filter: FilterConfig,
    /// Matched-filter template
    pub template: TemplateConfig,
    /// SNR normalization
    pub snr: SnrConfig,
}

/// Butterworth filter and zero-phase application settings
///
/// Only the cutoffs `kind` calls for are used: `high_hz` for low-pass,
/// `low_hz` for high-pass, both for band-pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub kind: FilterKind,
    pub order: usize,
    pub low_hz: Option<f64>,
    pub high_hz: Option<f64>,
    /// Edge extension before forward-backward filtering
    pub padding: EdgePadding,
    /// Extension length in samples; derived from the filter's poles if unset
    pub pad_len: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: FilterKind::Band,
            order: 4,
            low_hz: Some(20.0),
            high_hz: Some(500.0),
            padding: EdgePadding::Odd,
            pad_len: None,
        }
    }
}

impl FilterConfig {
    pub fn spec(&self) -> FilterSpec {
        let (low, high) = match self.kind {
            FilterKind::Low => (None, self.high_hz),
            FilterKind::High => (self.low_hz, None),
            FilterKind::Band => (self.low_hz, self.high_hz),
        };
        FilterSpec {
            kind: self.kind,
            order: self.order,
            low_cutoff_hz: low,
            high_cutoff_hz: high,
        }
    }
}

/// Linear chirp template law
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Start frequency in Hz
    pub f0_hz: f64,
    /// Chirp rate `k` in `sin(2π (f0 t + k t²))`
    pub chirp_rate: f64,
    /// Template length in seconds
    pub duration_s: f64,
    /// Tukey taper fraction, 0 for a rectangular template
    pub taper_fraction: f64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            f0_hz: 30.0,
            chirp_rate: 200.0,
            duration_s: 1.0,
            taper_fraction: 0.0,
        }
    }
}

impl TemplateConfig {
    pub fn template(&self, sample_rate: f64) -> Result<Template> {
        Template::chirp(self.f0_hz, self.chirp_rate, self.duration_s, sample_rate)?
            .with_taper(self.taper_fraction)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnrConfig {
    /// Standard deviation convention shared by the matched filter and metrics
    pub std_dev: StdDevConvention,
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GwError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GwError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}
