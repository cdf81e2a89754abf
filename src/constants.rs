//! Numeric constants for signal processing stability
//!
//! These constants define thresholds and epsilon values used throughout
//! the signal processing pipeline to ensure numerical stability.

/// Imaginary parts below this are treated as zero when pairing poles and
/// zeros into second-order sections.
pub const REAL_ROOT_EPSILON: f64 = 1e-10;

/// Relative tolerance when checking `sample_rate == 1 / dt`.
pub const SAMPLE_SPACING_TOLERANCE: f64 = 1e-6;

/// Residual transient amplitude the default zero-phase padding decays to.
pub const EDGE_TRANSIENT_DECAY: f64 = 1e-3;

/// Standard deviations at or below this are treated as zero variance.
pub const MIN_STD_DEV: f64 = 1e-300;
