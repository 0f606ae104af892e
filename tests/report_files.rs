use chrono::{Local, TimeZone};
use tempfile::TempDir;

use seoul_api_tester::report::json::{load_report, report_file_name, write_report};
use seoul_api_tester::report::{junit, ProbeReport};
use seoul_api_tester::runner::{OutcomeRecord, OutcomeStatus};

fn sample_report() -> ProbeReport {
    let mut success = OutcomeRecord::new(1, OutcomeStatus::Success).with_name("정류장별 승하차");
    success.record_count = Some(10);
    success.sample_data = Some(serde_json::json!([{"stdrDe": "20250801"}]));

    let records = vec![
        success,
        OutcomeRecord::new(2, OutcomeStatus::FailedAllAttempts).with_error("All 3 attempts failed"),
        OutcomeRecord::new(6, OutcomeStatus::Discontinued).with_name("좌표정보 (중단됨)"),
    ];
    ProbeReport::from_records(records, Local::now())
}

#[test]
fn test_second_write_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let at = Local.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let report = sample_report();

    let first = write_report(&report, dir.path(), &at).unwrap();
    let second = write_report(&report, dir.path(), &at).unwrap();

    assert_ne!(first, second);
    assert_eq!(first.file_name().unwrap().to_str().unwrap(), report_file_name(&at));
    assert_eq!(
        second.file_name().unwrap().to_str().unwrap(),
        "final_api_test_results_20250801_120000_1.json"
    );
    assert!(first.exists() && second.exists());
}

#[test]
fn test_distinct_timestamps_give_distinct_names() {
    let dir = TempDir::new().unwrap();
    let report = sample_report();
    let earlier = Local.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let later = Local.with_ymd_and_hms(2025, 8, 1, 12, 0, 1).unwrap();

    let a = write_report(&report, dir.path(), &earlier).unwrap();
    let b = write_report(&report, dir.path(), &later).unwrap();

    assert_ne!(a, b);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_written_report_layout() {
    let dir = TempDir::new().unwrap();
    let at = Local.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let report = sample_report();

    let path = write_report(&report, dir.path(), &at).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\n  \"summary\""));
    assert!(raw.contains("정류장별 승하차"));

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["summary"]["testable_apis"], 2);
    assert_eq!(value["summary"]["success_rate"], 50.0);
    assert_eq!(value["detailed_results"]["api_2"]["status"], "failed_all_attempts");
    assert_eq!(value["detailed_results"]["api_6"]["status"], "discontinued");

    let loaded = load_report(&path).unwrap();
    assert_eq!(loaded, report);
}

#[test]
fn test_junit_file() {
    let dir = TempDir::new().unwrap();
    let at = Local.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let report = sample_report();
    let results = write_report(&report, dir.path(), &at).unwrap();
    let path = junit::write_report(&report, &results).unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "final_api_test_results_20250801_120000_junit.xml"
    );
    let xml = std::fs::read_to_string(&path).unwrap();
    assert!(xml.contains(r#"<testcase name="API 2""#));
    assert!(xml.contains(r#"type="failed_all_attempts""#));
    assert!(xml.contains("<skipped"));
}

#[test]
fn test_junit_files_follow_each_run() {
    let dir = TempDir::new().unwrap();
    let at = Local.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let report = sample_report();

    let first = write_report(&report, dir.path(), &at).unwrap();
    let second = write_report(&report, dir.path(), &at).unwrap();
    let first_junit = junit::write_report(&report, &first).unwrap();
    let second_junit = junit::write_report(&report, &second).unwrap();

    assert_ne!(first_junit, second_junit);
    assert!(first_junit.exists() && second_junit.exists());
    assert!(junit::write_report(&report, &first).is_err());
}
