pub mod console;
pub mod json;
pub mod junit;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::ProbeReport;

/// Re-render a results file written by an earlier run
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let report = json::load_report(results_path)?;

    match format {
        "json" => json::generate(&report, output),
        "junit" => {
            let xml = junit::generate_junit_xml(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(path, xml)?;
                    println!("JUnit report saved to: {}", path.display());
                }
                None => println!("{}", xml),
            }
            Ok(())
        }
        "summary" => {
            print!("{}", console::summary_lines(&report));
            print!("{}", console::success_digest(&report));
            Ok(())
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}
