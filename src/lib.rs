pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod output;
pub mod processing;
pub mod signal_processing;
pub mod source;
pub mod timeseries;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::{PipelineConfig, SampleRate};
pub use error::{GwError, Result};
pub use metrics::{MetricsComputer, MetricsReport};
pub use processing::{DenoisePipeline, PipelineOutput};
pub use source::{CsvStrainSource, MemoryStrainSource, StrainSource, WavStrainSource};
pub use timeseries::TimeSeries;
pub use wav::save_wav;
