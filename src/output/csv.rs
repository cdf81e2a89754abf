use super::Formatter;
use crate::metrics::MetricsReport;

/// Metric-per-row table with raw and filtered columns.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, report: &MetricsReport) -> String {
        format!(
            "Max Amplitude,{:e},{:e}\nSNR Peak,{},{}\nMSE (strain),{:e},-",
            report.max_amplitude_raw,
            report.max_amplitude_filtered,
            report.snr_peak_raw,
            report.snr_peak_filtered,
            report.mse
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("Metric,Raw,Filtered")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_report;

    #[test]
    fn test_rows_have_three_fields() {
        let out = CsvFormatter.format(&sample_report());
        assert_eq!(out.lines().count(), 3);
        assert!(out.lines().all(|l| l.split(',').count() == 3));
        assert_eq!(CsvFormatter.header(), Some("Metric,Raw,Filtered"));
    }
}
