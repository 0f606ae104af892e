use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome category assigned to one endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    XmlSuccess,
    Discontinued,
    AuthError,
    ServiceDiscontinued,
    JsonError,
    XmlUnknown,
    UnknownFormat,
    HttpError,
    RequestError,
    FailedAllAttempts,
    NotDefined,
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success | OutcomeStatus::XmlSuccess)
    }

    pub fn is_discontinued(&self) -> bool {
        matches!(self, OutcomeStatus::Discontinued)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success() && !self.is_discontinued()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::XmlSuccess => "xml_success",
            OutcomeStatus::Discontinued => "discontinued",
            OutcomeStatus::AuthError => "auth_error",
            OutcomeStatus::ServiceDiscontinued => "service_discontinued",
            OutcomeStatus::JsonError => "json_error",
            OutcomeStatus::XmlUnknown => "xml_unknown",
            OutcomeStatus::UnknownFormat => "unknown_format",
            OutcomeStatus::HttpError => "http_error",
            OutcomeStatus::RequestError => "request_error",
            OutcomeStatus::FailedAllAttempts => "failed_all_attempts",
            OutcomeStatus::NotDefined => "not_defined",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a decoded JSON payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataStructure {
    Array {
        count: usize,
        sample_type: Option<String>,
    },
    Object {
        keys: Vec<String>,
    },
    String,
    Number,
    Bool,
    Null,
}

/// Result of probing a single endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    pub api_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_structure: Option<DataStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl OutcomeRecord {
    pub fn new(api_id: u8, status: OutcomeStatus) -> Self {
        Self {
            api_id,
            name: None,
            status,
            description: None,
            url: None,
            parameters: None,
            status_code: None,
            error: None,
            response_size: None,
            record_count: None,
            sample_data: None,
            fields: None,
            data_structure: None,
            response_preview: None,
            result_code: None,
            result_message: None,
            attempts: None,
            duration_ms: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Error message if present, otherwise the status name
    pub fn reason(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| self.status.as_str().to_string())
    }
}

/// Aggregate counts over one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub total_apis: usize,
    pub testable_apis: usize,
    pub successful_apis: usize,
    pub failed_apis: usize,
    pub discontinued_apis: usize,
    /// Percentage of testable endpoints that succeeded, one decimal place
    pub success_rate: f64,
    pub successful_list: Vec<u8>,
    pub failed_list: Vec<u8>,
    pub timestamp: String,
}

impl RunSummary {
    pub fn from_records<'a, I>(records: I, timestamp: &str) -> Self
    where
        I: IntoIterator<Item = &'a OutcomeRecord>,
    {
        let mut total_apis = 0;
        let mut discontinued_apis = 0;
        let mut successful_list = Vec::new();
        let mut failed_list = Vec::new();

        for record in records {
            total_apis += 1;
            if record.status.is_success() {
                successful_list.push(record.api_id);
            } else if record.status.is_discontinued() {
                discontinued_apis += 1;
            } else {
                failed_list.push(record.api_id);
            }
        }
        successful_list.sort_unstable();
        failed_list.sort_unstable();

        let testable_apis = total_apis - discontinued_apis;

        Self {
            total_apis,
            testable_apis,
            successful_apis: successful_list.len(),
            failed_apis: failed_list.len(),
            discontinued_apis,
            success_rate: success_rate(successful_list.len(), testable_apis),
            successful_list,
            failed_list,
            timestamp: timestamp.to_string(),
        }
    }
}

/// `successful / testable * 100`, rounded to one decimal place
pub fn success_rate(successful: usize, testable: usize) -> f64 {
    if testable == 0 {
        return 0.0;
    }
    let rate = successful as f64 / testable as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Records keyed as `api_<id>`
pub type DetailedResults = BTreeMap<String, OutcomeRecord>;

pub fn result_key(api_id: u8) -> String {
    format!("api_{}", api_id)
}
