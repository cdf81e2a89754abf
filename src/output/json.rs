use super::Formatter;
use crate::metrics::MetricsReport;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, report: &MetricsReport) -> String {
        // Plain floats and a unit enum always serialize
        serde_json::to_string(report).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}
