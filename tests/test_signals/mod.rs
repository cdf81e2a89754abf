#![allow(dead_code)]

use gwdenoise::TimeSeries;
use gwdenoise::signal_processing::Template;
use gwdenoise::simulation::{ChirpInjection, SyntheticStrain, sinusoid};

pub const SAMPLE_RATE: f64 = 4096.0;

pub fn reference_template() -> Template {
    Template::chirp(30.0, 200.0, 1.0, SAMPLE_RATE).unwrap()
}

/// Unit-variance white noise with one reference chirp starting at `start_s`.
pub fn chirp_in_noise(
    duration_s: f64,
    start_s: f64,
    amplitude: f64,
    seed: u64,
) -> (TimeSeries, ChirpInjection) {
    let injection = ChirpInjection {
        template: reference_template(),
        start_s,
        amplitude,
    };
    let strain = SyntheticStrain::new(duration_s, SAMPLE_RATE)
        .with_noise(1.0)
        .with_seed(seed)
        .with_injection(injection)
        .generate()
        .unwrap();
    (strain, injection)
}

pub fn white_noise(duration_s: f64, std: f64, seed: u64) -> TimeSeries {
    SyntheticStrain::new(duration_s, SAMPLE_RATE)
        .with_noise(std)
        .with_seed(seed)
        .generate()
        .unwrap()
}

pub fn tone(freq_hz: f64, amplitude: f64, duration_s: f64) -> TimeSeries {
    let n = (duration_s * SAMPLE_RATE).round() as usize;
    TimeSeries::new(sinusoid(freq_hz, amplitude, 0.0, n, SAMPLE_RATE), SAMPLE_RATE).unwrap()
}
