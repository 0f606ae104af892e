use super::types::ProbeReport;
use crate::runner::state::{OutcomeRecord, OutcomeStatus};
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Generate JUnit XML report string from a probe report
pub fn generate_junit_xml(report: &ProbeReport) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let records = report.records();
    let summary = &report.summary;
    let total_tests = records.len().to_string();
    let failures = summary.failed_apis.to_string();
    let skipped = summary.discontinued_apis.to_string();
    let total_ms: u64 = records.iter().filter_map(|r| r.duration_ms).sum();
    let time = (total_ms as f64 / 1000.0).to_string();

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "seoul-api-tester"));
    suites_start.push_attribute(("tests", total_tests.as_str()));
    suites_start.push_attribute(("failures", failures.as_str()));
    suites_start.push_attribute(("skipped", skipped.as_str()));
    suites_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(suites_start))?;

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", "seoul-open-data"));
    suite_start.push_attribute(("tests", total_tests.as_str()));
    suite_start.push_attribute(("failures", failures.as_str()));
    suite_start.push_attribute(("skipped", skipped.as_str()));
    suite_start.push_attribute(("time", time.as_str()));
    suite_start.push_attribute(("timestamp", summary.timestamp.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for record in records {
        write_test_case(&mut writer, record)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(writer: &mut Writer<W>, record: &OutcomeRecord) -> Result<()> {
    let name = match &record.name {
        Some(name) => format!("API {}: {}", record.api_id, name),
        None => format!("API {}", record.api_id),
    };
    let time = (record.duration_ms.unwrap_or(0) as f64 / 1000.0).to_string();

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", name.as_str()));
    case_start.push_attribute(("classname", "seoul_api_tester.endpoints"));
    case_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(case_start))?;

    match record.status {
        OutcomeStatus::Success | OutcomeStatus::XmlSuccess => {}
        OutcomeStatus::Discontinued => {
            let mut skip = BytesStart::new("skipped");
            skip.push_attribute(("message", "service discontinued"));
            writer.write_event(Event::Empty(skip))?;
        }
        status => {
            let message = record.reason();
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", message.as_str()));
            fail_start.push_attribute(("type", status.as_str()));
            writer.write_event(Event::Start(fail_start))?;

            if let Some(preview) = &record.response_preview {
                writer.write_event(Event::Text(BytesText::new(preview)))?;
            }

            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Path of the JUnit file that accompanies a results file: `<stem>_junit.xml`
pub fn junit_path_for(results_path: &Path) -> PathBuf {
    let stem = results_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    results_path.with_file_name(format!("{}_junit.xml", stem))
}

/// Write the JUnit report next to `results_path`, never replacing an existing file
pub fn write_report(report: &ProbeReport, results_path: &Path) -> Result<PathBuf> {
    let xml = generate_junit_xml(report)?;
    let path = junit_path_for(results_path);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("Failed to create JUnit report: {}", path.display()))?;
    file.write_all(xml.as_bytes())
        .with_context(|| format!("Failed to write JUnit report: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn test_generate_junit_xml() {
        let records = vec![
            OutcomeRecord::new(1, OutcomeStatus::Success).with_name("정류장별 승하차"),
            OutcomeRecord {
                response_preview: Some("<RESULT><CODE>INFO-100</CODE></RESULT>".to_string()),
                ..OutcomeRecord::new(2, OutcomeStatus::AuthError).with_error("API key is not valid")
            },
            OutcomeRecord::new(6, OutcomeStatus::Discontinued).with_name("좌표정보 (중단됨)"),
        ];
        let report = ProbeReport::from_records(records, Local::now());

        let xml = generate_junit_xml(&report).expect("Failed to generate XML");

        assert!(xml.contains(r#"<testsuites name="seoul-api-tester""#));
        assert!(xml.contains(r#"tests="3""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"skipped="1""#));
        assert!(xml.contains(r#"<testcase name="API 1: 정류장별 승하차""#));
        assert!(xml.contains(r#"message="API key is not valid""#));
        assert!(xml.contains(r#"type="auth_error""#));
        assert!(xml.contains("&lt;RESULT&gt;"));
    }

    #[test]
    fn test_junit_path_follows_results_file() {
        let path = junit_path_for(Path::new("out/final_api_test_results_20250801_120000_1.json"));
        assert_eq!(
            path,
            Path::new("out/final_api_test_results_20250801_120000_1_junit.xml")
        );
    }
}
