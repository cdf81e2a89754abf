use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use gwdenoise::config::{PipelineConfig, SampleRate};
use gwdenoise::output::{OutputFormat, create_formatter, write_series_csv};
use gwdenoise::signal_processing::{EdgePadding, FilterKind, StdDevConvention};
use gwdenoise::source::open_strain_source;
use gwdenoise::{DenoisePipeline, TimeSeries, save_wav, wav};

#[derive(Parser, Debug)]
#[command(name = "gwdenoise")]
#[command(
    about = "Band-limit strain data and search it for a chirp with a matched filter",
    long_about = None
)]
struct Args {
    /// Strain file: CSV (time, strain, ...) or mono WAV
    input: PathBuf,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML pipeline configuration; flags below override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Filter response: low, high, band
    #[arg(long, value_enum)]
    kind: Option<FilterKind>,

    /// Lower cutoff in Hz
    #[arg(long)]
    low: Option<f64>,

    /// Upper cutoff in Hz
    #[arg(long)]
    high: Option<f64>,

    /// Butterworth order
    #[arg(long)]
    order: Option<usize>,

    /// Edge extension before forward-backward filtering
    #[arg(long, value_enum)]
    padding: Option<EdgePadding>,

    /// Template start frequency in Hz
    #[arg(long)]
    f0: Option<f64>,

    /// Template chirp rate k (Hz/s scale of the t² phase term)
    #[arg(long)]
    chirp_rate: Option<f64>,

    /// Template length in seconds
    #[arg(long)]
    template_duration: Option<f64>,

    /// Tukey taper fraction applied to the template
    #[arg(long)]
    taper: Option<f64>,

    /// Standard deviation convention: population, sample
    #[arg(long, value_enum)]
    std_dev: Option<StdDevConvention>,

    /// Sample rate override (e.g. "4096", "244.140625us")
    #[arg(long)]
    sample_rate: Option<SampleRate>,

    /// Zero-based CSV column holding the strain
    #[arg(long, default_value_t = 1)]
    strain_column: usize,

    /// Write time, raw and filtered strain as CSV
    #[arg(long)]
    dump_filtered: Option<PathBuf>,

    /// Write time and matched-filter SNR as CSV
    #[arg(long)]
    dump_snr: Option<PathBuf>,

    /// Write the filtered strain, peak-normalized, as a WAV file
    #[arg(long)]
    dump_wav: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = build_config(&args)?;

    let raw = load_strain(&args)
        .with_context(|| format!("Failed to load strain from {}", args.input.display()))?;

    let mut pipeline = DenoisePipeline::new(config);
    let output = pipeline
        .process(&raw)
        .with_context(|| format!("Failed to process {}", args.input.display()))?;

    let formatter = create_formatter(args.format, args.verbose > 0);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }
    println!("{}", formatter.format(&output.metrics));

    if let OutputFormat::Text = args.format {
        let peak = output.snr.peak();
        println!(
            "Matched filter: peak SNR {:.2} at t = {:.4} s (median {:.3})",
            peak.snr,
            peak.time,
            output.snr.median()
        );
        if args.verbose > 0 {
            for bin in output.spectrum.dominant_peaks(3) {
                println!(
                    "Spectral peak: {:.2} Hz, amplitude {:.4e}",
                    output.spectrum.frequencies()[bin],
                    output.spectrum.amplitudes()[bin]
                );
            }
        }
    }

    if let Some(path) = &args.dump_filtered {
        write_series_csv(path, &[("Raw", &raw), ("Filtered", &output.filtered)])
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote filtered strain to {}", path.display());
    }

    if let Some(path) = &args.dump_snr {
        write_series_csv(path, &[("SNR", output.snr.as_time_series())])
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote SNR series to {}", path.display());
    }

    if let Some(path) = &args.dump_wav {
        let normalized = wav::normalized(&output.filtered, 0.9)?;
        save_wav(path, &normalized)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote filtered audio to {}", path.display());
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(kind) = args.kind {
        config.filter.kind = kind;
    }
    if let Some(low) = args.low {
        config.filter.low_hz = Some(low);
    }
    if let Some(high) = args.high {
        config.filter.high_hz = Some(high);
    }
    if let Some(order) = args.order {
        config.filter.order = order;
    }
    if let Some(padding) = args.padding {
        config.filter.padding = padding;
    }
    if let Some(f0) = args.f0 {
        config.template.f0_hz = f0;
    }
    if let Some(k) = args.chirp_rate {
        config.template.chirp_rate = k;
    }
    if let Some(duration) = args.template_duration {
        config.template.duration_s = duration;
    }
    if let Some(taper) = args.taper {
        config.template.taper_fraction = taper;
    }
    if let Some(convention) = args.std_dev {
        config.snr.std_dev = convention;
    }

    Ok(config)
}

fn load_strain(args: &Args) -> Result<TimeSeries> {
    let mut source = open_strain_source(&args.input, args.strain_column, args.sample_rate);
    Ok(source.load()?)
}
