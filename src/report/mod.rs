//! Test report conversion (JSON to JUnit-style XML).
//!
//! The test runner inside the wrapper writes a JSON report; the build tool
//! expects an "ANT-like" XML file at `XML_OUTPUT_FILE`. The format is only
//! loosely documented (https://llg.cubic.org/docs/junit/ has the most
//! detail), so the layout here sticks to the attributes consumers actually
//! read: aggregate counts on `testsuites`/`testsuite` plus one `testcase`
//! per test.

mod xml;

use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::error::{LauncherError, Result};
use xml::XmlWriter;

const STATUS_FAILED: &str = "FAILED";

/// A protobuf-JSON duration: whole seconds plus a nanosecond remainder.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct ReportDuration {
    #[serde(default)]
    pub seconds: i64,
    #[serde(default)]
    pub nanos: i32,
}

impl ReportDuration {
    /// Fractional seconds for the XML `time` attributes.
    #[must_use]
    pub fn float_seconds(self) -> f64 {
        self.seconds as f64 + f64::from(self.nanos) / 1e9
    }
}

/// One test case in the report.
///
/// Absent fields take the proto3 defaults: an omitted `expected` means the
/// outcome was unexpected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub name: String,
    #[serde(default)]
    pub elapsed: ReportDuration,
    #[serde(default)]
    pub expected: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// The full JSON report produced by the test runner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub elapsed: ReportDuration,
    #[serde(default)]
    pub tests: Vec<Test>,
}

/// Parse a JSON report and write the equivalent XML report to `xml_path`.
///
/// The XML file is created exclusively; an existing file is an error.
///
/// # Errors
///
/// Returns [`LauncherError::InvalidReport`] (carrying the offending document
/// for diagnostics) if the JSON does not parse, or an I/O error if writing or
/// flushing the XML file fails.
pub fn convert_report(json: &str, xml_path: &Path) -> Result<()> {
    let report: TestReport =
        serde_json::from_str(json).map_err(|source| LauncherError::InvalidReport {
            content: json.to_string(),
            source,
        })?;

    let total = report.tests.len();
    let unexpected = report.tests.iter().filter(|test| !test.expected).count();
    let failures = report
        .tests
        .iter()
        .filter(|test| !test.expected && test.status == STATUS_FAILED)
        .count();
    let errors = unexpected - failures;

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(xml_path)?;
    let mut writer = XmlWriter::new(BufWriter::new(file));

    let total_str = total.to_string();
    let failures_str = failures.to_string();
    let time_str = report.elapsed.float_seconds().to_string();
    let timestamp = report
        .start_time
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::AutoSi, true);

    writer.declaration()?;
    writer.open_element("testsuites")?;
    writer.attribute("tests", &total_str)?;
    writer.attribute("time", &time_str)?;
    writer.attribute("failures", &failures_str)?;
    writer.open_element("testsuite")?;
    writer.attribute("id", "0")?;
    writer.attribute("tests", &total_str)?;
    writer.attribute("time", &time_str)?;
    writer.attribute("timestamp", &timestamp)?;
    writer.attribute("failures", &failures_str)?;
    writer.attribute("errors", &errors.to_string())?;
    for test in &report.tests {
        writer.open_element("testcase")?;
        writer.attribute("name", &test.name)?;
        writer.attribute("time", &test.elapsed.float_seconds().to_string())?;
        if !test.expected {
            let element = if test.status == STATUS_FAILED {
                "failure"
            } else {
                "error"
            };
            writer.open_element(element)?;
            writer.attribute("type", &test.status)?;
            writer.text(&test.message)?;
            writer.close_element()?;
        }
        writer.close_element()?;
    }
    writer.close_element()?;
    writer.close_element()?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "startTime": "2024-03-01T10:30:00Z",
        "elapsed": {"seconds": 4, "nanos": 500000000},
        "tests": [
            {"name": "pass", "elapsed": {"seconds": 1}, "expected": true,
             "status": "PASSED"},
            {"name": "fail", "elapsed": {"nanos": 250000000},
             "status": "FAILED", "message": "expected 1 < 2"},
            {"name": "surprise-pass", "elapsed": {"seconds": 3},
             "status": "PASSED", "message": "unexpectedly passed"}
        ]
    }"#;

    fn convert(json: &str) -> Result<String> {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("report.xml");
        convert_report(json, &path)?;
        Ok(std::fs::read_to_string(&path).expect("read xml"))
    }

    #[test]
    fn test_aggregate_counts() {
        let xml = convert(SAMPLE).expect("convert");
        assert!(
            xml.contains(r#"<testsuite id="0" tests="3" time="4.5" timestamp="2024-03-01T10:30:00Z" failures="1" errors="1">"#),
            "xml: {xml}"
        );
        assert!(xml.contains(r#"<testsuites tests="3" time="4.5" failures="1">"#));
    }

    #[test]
    fn test_unexpected_tests_carry_failure_or_error_children() {
        let xml = convert(SAMPLE).expect("convert");
        assert!(xml.contains(r#"<failure type="FAILED">expected 1 &lt; 2</failure>"#));
        assert!(xml.contains(r#"<error type="PASSED">unexpectedly passed</error>"#));
        // The expected test stays an empty element.
        assert!(xml.contains(r#"<testcase name="pass" time="1"/>"#));
    }

    #[test]
    fn test_fractional_times() {
        let xml = convert(SAMPLE).expect("convert");
        assert!(xml.contains(r#"<testcase name="fail" time="0.25">"#), "xml: {xml}");
    }

    #[test]
    fn test_declaration_and_nesting() {
        let xml = convert(SAMPLE).expect("convert");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites "));
        assert!(xml.trim_end().ends_with("</testsuites>"));
    }

    #[test]
    fn test_malformed_json_reports_the_document() {
        let err = convert("{not json").expect_err("malformed");
        let message = err.to_string();
        assert!(message.contains("invalid JSON report"), "{message}");
        assert!(message.contains("{not json"), "{message}");
    }

    #[test]
    fn test_empty_report() {
        let xml = convert(r#"{"tests": []}"#).expect("convert");
        assert!(xml.contains(r#"<testsuites tests="0" time="0" failures="0">"#));
        assert!(
            xml.contains(r#"timestamp="1970-01-01T00:00:00Z""#),
            "xml: {xml}"
        );
    }

    #[test]
    fn test_existing_xml_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("report.xml");
        std::fs::write(&path, b"old").expect("pre-create");
        let err = convert_report(r#"{"tests": []}"#, &path).expect_err("exclusive create");
        assert!(matches!(err, LauncherError::Io(_)));
    }
}
