use super::types::ProbeReport;
use colored::Colorize;

/// Human-readable digest of the successful endpoints
pub fn success_digest(report: &ProbeReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "Successful APIs:".bold()));
    out.push_str(&format!("{}\n", "-".repeat(40)));

    for api_id in &report.summary.successful_list {
        let Some(record) = report.record(*api_id) else {
            continue;
        };

        out.push_str(&format!(
            "{} API {}: {}\n",
            "✅".green(),
            api_id,
            record.name.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!(
            "   URL: {}\n",
            record.url.as_deref().unwrap_or("-").cyan()
        ));
        if let Some(count) = record.record_count {
            out.push_str(&format!("   Records: {}\n", count));
        }
        if let Some(fields) = record.fields.as_ref().filter(|f| !f.is_empty()) {
            out.push_str(&format!("   Fields: {}\n", fields.len()));
        }
        out.push('\n');
    }

    out
}

/// One-paragraph overview of the run
pub fn summary_lines(report: &ProbeReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    out.push_str(&format!(
        "{} Succeeded: {}/{} ({:.1}%)\n",
        "✅".green(),
        s.successful_apis,
        s.testable_apis,
        s.success_rate
    ));
    out.push_str(&format!("{} Failed: {}\n", "❌".red(), s.failed_apis));
    out.push_str(&format!("{} Discontinued: {}\n", "⚠️".yellow(), s.discontinued_apis));

    for record in report.records() {
        if record.status.is_failure() {
            out.push_str(&format!(
                "   API {}: {}\n",
                record.api_id,
                record.reason().red()
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{OutcomeRecord, OutcomeStatus};
    use chrono::Local;

    #[test]
    fn test_digest_lists_only_successes() {
        colored::control::set_override(false);

        let records = vec![
            OutcomeRecord {
                url: Some("http://example/TaimsTpssStaRouteInfoH/1.0".to_string()),
                record_count: Some(10),
                fields: Some(vec!["stdrDe".to_string(), "routeId".to_string()]),
                ..OutcomeRecord::new(1, OutcomeStatus::Success).with_name("정류장별 승하차")
            },
            OutcomeRecord::new(2, OutcomeStatus::FailedAllAttempts).with_name("구간별 승객수"),
        ];
        let report = ProbeReport::from_records(records, Local::now());

        let digest = success_digest(&report);
        assert!(digest.contains("API 1: 정류장별 승하차"));
        assert!(digest.contains("Records: 10"));
        assert!(digest.contains("Fields: 2"));
        assert!(!digest.contains("API 2"));

        let summary = summary_lines(&report);
        assert!(summary.contains("Succeeded: 1/2 (50.0%)"));
        assert!(summary.contains("API 2: failed_all_attempts"));
    }
}
