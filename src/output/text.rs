use super::Formatter;
use crate::metrics::MetricsReport;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, report: &MetricsReport) -> String {
        let mut out = format!(
            "Max amplitude - Raw: {:.5e}, Filtered: {:.5e}\n\
             SNR peak - Raw: {:.3}, Filtered: {:.3}\n\
             MSE (raw vs filtered): {:.5e}",
            report.max_amplitude_raw,
            report.max_amplitude_filtered,
            report.snr_peak_raw,
            report.snr_peak_filtered,
            report.mse
        );
        if self.verbose {
            out.push_str(&format!(
                "\nSNR gain: {:.3}x [std dev: {:?}]",
                report.snr_gain(),
                report.std_dev_convention
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_report;

    #[test]
    fn test_verbose_adds_gain_line() {
        let report = sample_report();
        let terse = TextFormatter::new(false).format(&report);
        let verbose = TextFormatter::new(true).format(&report);
        assert_eq!(terse.lines().count(), 3);
        assert_eq!(verbose.lines().count(), 4);
        assert!(verbose.contains("Population"));
        assert!(terse.contains("SNR peak - Raw: 4.250, Filtered: 6.500"));
    }
}
