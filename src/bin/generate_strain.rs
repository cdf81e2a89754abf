use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use gwdenoise::output::write_series_csv;
use gwdenoise::signal_processing::Template;
use gwdenoise::simulation::{ChirpInjection, SyntheticStrain};

#[derive(Parser, Debug)]
#[command(name = "generate_strain")]
#[command(about = "Generate synthetic strain with injected chirps for pipeline testing")]
struct Args {
    /// Output CSV file (time, strain)
    #[arg(short, long, default_value = "synthetic_strain.csv")]
    output: PathBuf,

    /// Record length in seconds
    #[arg(short, long, default_value_t = 32.0)]
    duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 4096.0)]
    sample_rate: f64,

    /// White noise standard deviation
    #[arg(long, default_value_t = 1.0)]
    noise_std: f64,

    /// Injection start times in seconds (comma-separated)
    #[arg(short, long, value_delimiter = ',', default_value = "12.0")]
    inject: Vec<f64>,

    /// Injection amplitude
    #[arg(short, long, default_value_t = 0.5)]
    amplitude: f64,

    /// Chirp start frequency in Hz
    #[arg(long, default_value_t = 30.0)]
    f0: f64,

    /// Chirp rate k
    #[arg(long, default_value_t = 200.0)]
    chirp_rate: f64,

    /// Chirp length in seconds
    #[arg(long, default_value_t = 1.0)]
    chirp_duration: f64,

    /// Seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let template =
        Template::chirp(args.f0, args.chirp_rate, args.chirp_duration, args.sample_rate)
            .context("Invalid chirp parameters")?;

    let mut strain =
        SyntheticStrain::new(args.duration, args.sample_rate).with_noise(args.noise_std);
    if let Some(seed) = args.seed {
        strain = strain.with_seed(seed);
    }
    for &start_s in &args.inject {
        strain = strain.with_injection(ChirpInjection {
            template,
            start_s,
            amplitude: args.amplitude,
        });
    }

    let ts = strain.generate().context("Failed to generate strain")?;
    write_series_csv(&args.output, &[("Strain", &ts)])
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} samples ({} s @ {} Hz) to {}",
        ts.len(),
        args.duration,
        args.sample_rate,
        args.output.display()
    );
    for injection in strain.injections() {
        println!(
            "  chirp at {:.3} s, matched-filter peak expected at {:.3} s",
            injection.start_s,
            injection.aligned_time_s()
        );
    }

    Ok(())
}
