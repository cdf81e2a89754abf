pub mod filters;
pub mod matched_filter;
pub mod math;
pub mod spectrum;
pub mod zero_phase;

pub use filters::{
    DesignCache, FilterCoefficients, FilterKind, FilterSpec, SecondOrderSection, design,
};
pub use matched_filter::{MatchedFilterEngine, SnrPeak, SnrSeries, Template, correlate_same};
pub use math::StdDevConvention;
pub use spectrum::{SpectralAnalyzer, Spectrum};
pub use zero_phase::{EdgePadding, ZeroPhaseFilter, filtfilt};
