use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::timeseries::TimeSeries;

/// Write `ts` as a mono 32-bit float WAV at its own sample rate.
///
/// The sample rate is rounded to the nearest integer Hz.
pub fn save_wav<P: AsRef<Path>>(filename: P, ts: &TimeSeries) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: ts.sample_rate().round() as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(filename, spec)?;

    for &sample in ts.samples() {
        writer.write_sample(sample as f32)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Copy of `ts` scaled so its largest magnitude is `peak`, for listening.
pub fn normalized(ts: &TimeSeries, peak: f64) -> crate::error::Result<TimeSeries> {
    let max = crate::signal_processing::math::max_abs(ts.samples());
    if max == 0.0 {
        return Ok(ts.clone());
    }
    let gain = peak / max;
    ts.with_samples(ts.samples().iter().map(|s| s * gain).collect())
}
