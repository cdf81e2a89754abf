mod test_signals;

use approx::assert_relative_eq;
use gwdenoise::signal_processing::{
    FilterSpec, MatchedFilterEngine, SpectralAnalyzer, ZeroPhaseFilter, design,
};
use gwdenoise::simulation::sinusoid;
use gwdenoise::{DenoisePipeline, MetricsComputer, PipelineConfig, TimeSeries};

use test_signals::{SAMPLE_RATE, chirp_in_noise, reference_template, white_noise};

#[test]
fn test_chirp_recovered_from_noise() {
    let (raw, injection) = chirp_in_noise(32.0, 12.0, 0.3, 42);
    assert_eq!(raw.len(), 32 * 4096);

    let coeffs = design(&FilterSpec::bandpass(4, 20.0, 500.0), SAMPLE_RATE).unwrap();
    let filtered = ZeroPhaseFilter::new().apply(&coeffs, &raw).unwrap();
    let snr = MatchedFilterEngine::default()
        .detect(&filtered, &reference_template())
        .unwrap();

    let peak = snr.peak();
    let expected = injection.aligned_time_s();
    assert!(
        (peak.time - expected).abs() <= 0.05,
        "peak at {} s, expected {} s",
        peak.time,
        expected
    );
    assert!(
        peak.snr > 5.0 * snr.median(),
        "peak {} vs median {}",
        peak.snr,
        snr.median()
    );
}

#[test]
fn test_pipeline_reports_chirp_and_metrics() {
    let (raw, injection) = chirp_in_noise(16.0, 6.0, 0.3, 7);
    let mut pipeline = DenoisePipeline::new(PipelineConfig::default());
    let out = pipeline.process(&raw).unwrap();

    assert_eq!(out.filtered.len(), raw.len());
    assert!(out.filtered.same_grid(&raw));
    assert!((out.snr.peak().time - injection.aligned_time_s()).abs() <= 0.05);

    // Band-limiting white noise removes most of its power
    assert!(out.metrics.max_amplitude_filtered < out.metrics.max_amplitude_raw);
    assert!(out.metrics.mse > 0.5);
}

#[test]
fn test_two_sinusoids_resolved_in_spectrum() {
    let fs = 1000.0;
    let n = 1000;
    let samples: Vec<f64> = sinusoid(50.0, 1.0, 0.0, n, fs)
        .into_iter()
        .zip(sinusoid(120.0, 0.5, 0.0, n, fs))
        .map(|(a, b)| a + b)
        .collect();
    let ts = TimeSeries::new(samples, fs).unwrap();

    let spectrum = SpectralAnalyzer::new().spectrum(&ts).unwrap();
    let peaks = spectrum.dominant_peaks(2);
    assert_eq!(peaks.len(), 2);
    assert_relative_eq!(spectrum.frequencies()[peaks[0]], 50.0, epsilon = 1e-9);
    assert_relative_eq!(spectrum.frequencies()[peaks[1]], 120.0, epsilon = 1e-9);
    assert_relative_eq!(
        spectrum.amplitude_at(50.0) / spectrum.amplitude_at(120.0),
        2.0,
        epsilon = 1e-6
    );

    let weaker = spectrum.amplitude_at(120.0);
    for (k, &a) in spectrum.amplitudes().iter().enumerate() {
        if !peaks.contains(&k) {
            assert!(a < 0.01 * weaker, "bin {} amplitude {} too large", k, a);
        }
    }
}

#[test]
fn test_mse_of_identical_series_is_zero() {
    let raw = white_noise(2.0, 1.0, 3);
    let report = MetricsComputer::default().compare(&raw, &raw).unwrap();
    assert_eq!(report.mse, 0.0);
}

#[test]
fn test_mse_matches_added_noise_variance() {
    let clean = test_signals::tone(60.0, 1.0, 8.0);
    let sigma = 0.1;
    let noise = white_noise(8.0, sigma, 11);
    let noisy: Vec<f64> = clean
        .samples()
        .iter()
        .zip(noise.samples())
        .map(|(c, n)| c + n)
        .collect();
    let noisy = TimeSeries::new(noisy, SAMPLE_RATE).unwrap();

    let report = MetricsComputer::default().compare(&clean, &noisy).unwrap();
    assert_relative_eq!(report.mse, sigma * sigma, max_relative = 0.05);
}
