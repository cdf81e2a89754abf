use thiserror::Error;

#[derive(Error, Debug)]
pub enum GwError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid filter spec: {0}")]
    InvalidFilterSpec(String),

    #[error("Unstable filter: section {section} has pole magnitude {pole_magnitude:.6}")]
    UnstableFilter { section: usize, pole_magnitude: f64 },

    #[error("Degenerate signal: {0}")]
    DegenerateSignal(String),

    #[error("Length mismatch: raw has {raw} samples, filtered has {filtered}")]
    LengthMismatch { raw: usize, filtered: usize },

    #[error("Strain I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GwError>;
