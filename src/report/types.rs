use crate::runner::state::{result_key, DetailedResults, OutcomeRecord, RunSummary};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Everything written to the results file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeReport {
    pub summary: RunSummary,
    pub detailed_results: DetailedResults,
}

impl ProbeReport {
    /// Key the records by identifier and summarize what was kept.
    ///
    /// When an identifier occurs more than once, the first record wins.
    pub fn from_records(records: Vec<OutcomeRecord>, generated_at: DateTime<Local>) -> Self {
        let mut detailed_results = DetailedResults::new();
        for record in records {
            detailed_results
                .entry(result_key(record.api_id))
                .or_insert(record);
        }
        let summary =
            RunSummary::from_records(detailed_results.values(), &generated_at.to_rfc3339());

        Self {
            summary,
            detailed_results,
        }
    }

    /// Records in ascending identifier order
    pub fn records(&self) -> Vec<&OutcomeRecord> {
        let mut records: Vec<&OutcomeRecord> = self.detailed_results.values().collect();
        records.sort_by_key(|r| r.api_id);
        records
    }

    pub fn record(&self, api_id: u8) -> Option<&OutcomeRecord> {
        self.detailed_results.get(&result_key(api_id))
    }
}
