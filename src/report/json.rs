use super::types::ProbeReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Prefix of every results file
pub const REPORT_FILE_PREFIX: &str = "final_api_test_results";

/// `final_api_test_results_<YYYYMMDD_HHMMSS>.json`
pub fn report_file_name(at: &DateTime<Local>) -> String {
    format!("{}_{}.json", REPORT_FILE_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

/// Write the report into `output_dir` under a timestamped name.
///
/// An existing file is never replaced: a `_1`, `_2`, ... suffix is added until
/// an unused name is found.
pub fn write_report(report: &ProbeReport, output_dir: &Path, at: &DateTime<Local>) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let json = serde_json::to_string_pretty(report)?;
    let base_name = report_file_name(at);
    let stem = base_name.trim_end_matches(".json");

    let mut candidate = output_dir.join(&base_name);
    let mut suffix = 0u32;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(json.as_bytes())
                    .with_context(|| format!("Failed to write report: {}", candidate.display()))?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                suffix += 1;
                candidate = output_dir.join(format!("{}_{}.json", stem, suffix));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create report: {}", candidate.display()));
            }
        }
    }
}

/// Read a previously written report
pub fn load_report(path: &Path) -> Result<ProbeReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results: {}", path.display()))
}

/// Write the report as JSON to `output`, or print it
pub fn generate(report: &ProbeReport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output {
        std::fs::write(path, json)?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_file_name() {
        let at = Local.with_ymd_and_hms(2025, 8, 1, 9, 5, 7).unwrap();
        assert_eq!(report_file_name(&at), "final_api_test_results_20250801_090507.json");
    }
}
