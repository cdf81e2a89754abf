mod noise;
mod signal;

pub use noise::{add_white_noise, create_rng, white_noise};
pub use signal::{ChirpInjection, SyntheticStrain, sinusoid};
