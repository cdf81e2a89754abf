use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};

use crate::config::SampleRate;
use crate::constants::SAMPLE_SPACING_TOLERANCE;
use crate::error::{GwError, Result};
use crate::timeseries::TimeSeries;

/// Supplier of a uniformly sampled strain record.
///
/// Implementations own the storage format; the core only sees the
/// resulting `TimeSeries`.
pub trait StrainSource {
    fn load(&mut self) -> Result<TimeSeries>;
}

/// Strain already held in memory.
pub struct MemoryStrainSource {
    samples: Vec<f64>,
    sample_rate: SampleRate,
    t0: f64,
}

impl MemoryStrainSource {
    pub fn new(samples: Vec<f64>, sample_rate: SampleRate) -> Self {
        Self {
            samples,
            sample_rate,
            t0: 0.0,
        }
    }

    pub fn with_start_time(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }
}

impl StrainSource for MemoryStrainSource {
    fn load(&mut self) -> Result<TimeSeries> {
        Ok(TimeSeries::new(self.samples.clone(), self.sample_rate.as_hz())?
            .with_start_time(self.t0))
    }
}

/// Delimited text with a time column and one or more value columns.
///
/// Sample spacing comes from the first two time stamps unless overridden;
/// the first time stamp becomes the series start time.
pub struct CsvStrainSource {
    path: PathBuf,
    strain_column: usize,
    has_headers: bool,
    sample_rate: Option<SampleRate>,
}

impl CsvStrainSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            strain_column: 1,
            has_headers: true,
            sample_rate: None,
        }
    }

    /// Zero-based column holding the strain values (default 1).
    pub fn with_strain_column(mut self, column: usize) -> Self {
        self.strain_column = column;
        self
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: SampleRate) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    fn read_columns(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| GwError::Io(format!("{}: {}", self.path.display(), e)))?;

        let mut times = Vec::new();
        let mut strain = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| GwError::Io(format!("{}: {}", self.path.display(), e)))?;
            let field = |column: usize| -> Result<f64> {
                record
                    .get(column)
                    .ok_or_else(|| {
                        GwError::InvalidInput(format!("row {} has no column {}", row, column))
                    })?
                    .parse::<f64>()
                    .map_err(|e| {
                        GwError::InvalidInput(format!("row {} column {}: {}", row, column, e))
                    })
            };
            times.push(field(0)?);
            strain.push(field(self.strain_column)?);
        }
        Ok((times, strain))
    }
}

impl StrainSource for CsvStrainSource {
    fn load(&mut self) -> Result<TimeSeries> {
        let (times, strain) = self.read_columns()?;
        let Some(&t0) = times.first() else {
            return Err(GwError::InvalidInput(format!(
                "{} contains no samples",
                self.path.display()
            )));
        };

        let sample_rate = match self.sample_rate {
            Some(rate) => rate.as_hz(),
            None => {
                if times.len() < 2 {
                    return Err(GwError::InvalidInput(
                        "need two time stamps or an explicit sample rate".into(),
                    ));
                }
                let dt = times[1] - times[0];
                let last_dt = times[times.len() - 1] - times[times.len() - 2];
                if (last_dt - dt).abs() > dt.abs() * SAMPLE_SPACING_TOLERANCE.sqrt() {
                    log::warn!(
                        "Time column spacing drifts from {:.6e} s to {:.6e} s; assuming uniform",
                        dt,
                        last_dt
                    );
                }
                if !(dt.is_finite() && dt > 0.0) {
                    return Err(GwError::InvalidInput(format!(
                        "time column is not increasing (dt = {})",
                        dt
                    )));
                }
                1.0 / dt
            }
        };

        log::info!(
            "Loaded {} strain samples from {} ({} Hz, t0 = {})",
            strain.len(),
            self.path.display(),
            sample_rate,
            t0
        );
        Ok(TimeSeries::new(strain, sample_rate)?.with_start_time(t0))
    }
}

/// Mono WAV file; integer formats are scaled to [-1, 1).
pub struct WavStrainSource {
    path: PathBuf,
    sample_rate: Option<SampleRate>,
}

impl WavStrainSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sample_rate: None,
        }
    }

    /// Use `sample_rate` instead of the integer rate in the WAV header.
    pub fn with_sample_rate(mut self, sample_rate: SampleRate) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }
}

impl StrainSource for WavStrainSource {
    fn load(&mut self) -> Result<TimeSeries> {
        let io_err = |e: hound::Error| GwError::Io(format!("{}: {}", self.path.display(), e));
        let mut reader = WavReader::open(&self.path).map_err(io_err)?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(GwError::InvalidInput(format!(
                "expected mono strain WAV, got {} channels",
                spec.channels
            )));
        }

        let samples: Vec<f64> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<std::result::Result<_, _>>()
                .map_err(io_err)?,
            SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f64;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f64 * scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(io_err)?
            }
        };

        let sample_rate = self
            .sample_rate
            .map_or(spec.sample_rate as f64, |rate| rate.as_hz());
        log::info!(
            "Loaded {} strain samples from {} ({} Hz)",
            samples.len(),
            self.path.display(),
            sample_rate
        );
        TimeSeries::new(samples, sample_rate)
    }
}

/// Pick a source by file extension: `.wav` is read as audio, anything else
/// as delimited text with the strain in `strain_column`.
///
/// `sample_rate`, when given, overrides the rate from the WAV header or the
/// CSV time column.
pub fn open_strain_source<P: AsRef<Path>>(
    path: P,
    strain_column: usize,
    sample_rate: Option<SampleRate>,
) -> Box<dyn StrainSource> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if is_wav {
        let mut source = WavStrainSource::new(path);
        if let Some(rate) = sample_rate {
            source = source.with_sample_rate(rate);
        }
        Box::new(source)
    } else {
        let mut source = CsvStrainSource::new(path).with_strain_column(strain_column);
        if let Some(rate) = sample_rate {
            source = source.with_sample_rate(rate);
        }
        Box::new(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gwdenoise_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemoryStrainSource::new(vec![1.0, 2.0], SampleRate::from_hz(4096.0))
            .with_start_time(5.0);
        let ts = source.load().unwrap();
        assert_eq!(ts.samples(), &[1.0, 2.0]);
        assert_eq!(ts.t0(), 5.0);
    }

    #[test]
    fn test_csv_source_derives_spacing() {
        let path = temp_path("strain.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Time(s),Raw,Filtered").unwrap();
        for i in 0..8 {
            let t = 100.0 + i as f64 * 0.25;
            writeln!(file, "{},{},{}", t, i as f64 * 1e-21, -(i as f64)).unwrap();
        }
        drop(file);

        let ts = CsvStrainSource::new(&path).load().unwrap();
        assert_eq!(ts.len(), 8);
        assert_relative_eq!(ts.sample_rate(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(ts.t0(), 100.0);
        assert_relative_eq!(ts.samples()[3], 3e-21);

        let filtered = CsvStrainSource::new(&path)
            .with_strain_column(2)
            .load()
            .unwrap();
        assert_relative_eq!(filtered.samples()[3], -3.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_csv_source_bad_value() {
        let path = temp_path("bad.csv");
        std::fs::write(&path, "t,h\n0.0,1.0\n0.1,oops\n").unwrap();
        assert!(matches!(
            CsvStrainSource::new(&path).load(),
            Err(GwError::InvalidInput(_))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            CsvStrainSource::new("/nonexistent/strain.csv").load(),
            Err(GwError::Io(_))
        ));
    }

    #[test]
    fn test_wav_round_trip() {
        let path = temp_path("strain.wav");
        let ts = TimeSeries::new(vec![0.0, 0.5, -0.25, 0.125], 4096.0).unwrap();
        crate::wav::save_wav(&path, &ts).unwrap();
        let loaded = open_strain_source(&path, 1, None).load().unwrap();
        assert_eq!(loaded.sample_rate(), 4096.0);
        assert_eq!(loaded.samples(), ts.samples());

        let overridden = open_strain_source(&path, 1, Some(SampleRate::from_hz(16384.0)))
            .load()
            .unwrap();
        assert_eq!(overridden.sample_rate(), 16384.0);
        assert_eq!(overridden.samples(), ts.samples());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_open_csv_by_extension_with_options() {
        let path = temp_path("columns.csv");
        std::fs::write(&path, "t,raw,filtered\n2.0,1.0,-1.0\n2.5,2.0,-2.0\n3.0,3.0,-3.0\n")
            .unwrap();

        let ts = open_strain_source(&path, 2, None).load().unwrap();
        assert_eq!(ts.samples(), &[-1.0, -2.0, -3.0]);
        assert_relative_eq!(ts.sample_rate(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(ts.t0(), 2.0);

        let ts = open_strain_source(&path, 1, Some(SampleRate::from_hz(10.0)))
            .load()
            .unwrap();
        assert_eq!(ts.samples(), &[1.0, 2.0, 3.0]);
        assert_eq!(ts.sample_rate(), 10.0);
        assert_relative_eq!(ts.t0(), 2.0);
        std::fs::remove_file(&path).ok();
    }
}
