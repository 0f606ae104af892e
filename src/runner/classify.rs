//! Response classification
//!
//! Turns one HTTP response into an [`OutcomeRecord`]. The decision only looks at the
//! status code, the `Content-Type` header and the body text, so it is kept free of any
//! networking and shared by the traffic and population paths.

use super::state::{DataStructure, OutcomeRecord, OutcomeStatus};
use crate::registry::EndpointSpec;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Result code the Seoul open-data service returns for an invalid key
pub const XML_AUTH_FAILURE_CODE: &str = "INFO-100";
/// Result code for a normally processed request
pub const XML_OK_CODE: &str = "INFO-000";

const PREVIEW_CHARS: usize = 300;
const XML_SUCCESS_PREVIEW_CHARS: usize = 500;
const SAMPLE_RECORDS: usize = 2;
const SAMPLE_OBJECT_ENTRIES: usize = 5;
const STRUCTURE_KEYS: usize = 10;

/// What the executor observed for one attempt
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The response settles the outcome
    Final(OutcomeRecord),
    /// Any status other than 200/401/410; the caller decides whether to retry
    Unexpected { status: u16, preview: String },
}

/// Classify one response for `spec`
pub fn classify(spec: &EndpointSpec, response: &ResponseSnapshot) -> Classification {
    match response.status {
        200 => Classification::Final(classify_body(spec, response)),
        401 => Classification::Final(
            OutcomeRecord::new(spec.id, OutcomeStatus::AuthError)
                .with_error("API key authentication failed (401)"),
        ),
        410 => Classification::Final(
            OutcomeRecord::new(spec.id, OutcomeStatus::ServiceDiscontinued)
                .with_error("API service has been discontinued (410)"),
        ),
        status => Classification::Unexpected {
            status,
            preview: preview(&response.body, 100),
        },
    }
}

/// Classify a 200 body: JSON, then XML, then unknown
pub fn classify_body(spec: &EndpointSpec, response: &ResponseSnapshot) -> OutcomeRecord {
    let body = response.body.as_str();
    let trimmed = body.trim_start();
    let is_xml = trimmed.starts_with('<');

    if expects_json(response.content_type.as_deref(), trimmed) {
        match serde_json::from_str::<Value>(body) {
            Ok(data) => return json_success(spec, body, data),
            Err(e) if !is_xml => {
                log::error!("   JSON parse failed: {}", e);
                return OutcomeRecord {
                    error: Some(e.to_string()),
                    response_preview: Some(preview_or_placeholder(body)),
                    ..OutcomeRecord::new(spec.id, OutcomeStatus::JsonError)
                };
            }
            Err(_) => log::warn!("   JSON parse failed, body looks like XML"),
        }
    }

    if is_xml {
        log::info!("   XML response detected");
        return classify_xml(spec, body);
    }

    OutcomeRecord {
        response_preview: Some(preview(body, PREVIEW_CHARS)),
        ..OutcomeRecord::new(spec.id, OutcomeStatus::UnknownFormat)
    }
}

fn expects_json(content_type: Option<&str>, trimmed_body: &str) -> bool {
    let declared = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    declared || trimmed_body.starts_with('{') || trimmed_body.starts_with('[')
}

fn json_success(spec: &EndpointSpec, body: &str, data: Value) -> OutcomeRecord {
    let record_count = data.as_array().map(Vec::len);
    let fields = data
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect());

    match record_count {
        Some(count) => log::info!("   Success - records: {}", count),
        None => log::info!("   Success - JSON response"),
    }

    OutcomeRecord {
        name: Some(spec.name.clone()),
        url: spec.display_url(),
        response_size: Some(body.chars().count()),
        record_count,
        sample_data: Some(sample_data(&data)),
        fields,
        data_structure: Some(analyze_structure(&data)),
        ..OutcomeRecord::new(spec.id, OutcomeStatus::Success)
    }
}

fn classify_xml(spec: &EndpointSpec, body: &str) -> OutcomeRecord {
    let (result_code, result_message) = extract_xml_result(body);

    let base = if body.contains(XML_AUTH_FAILURE_CODE) {
        OutcomeRecord {
            response_preview: Some(preview(body, PREVIEW_CHARS)),
            ..OutcomeRecord::new(spec.id, OutcomeStatus::AuthError)
                .with_error("API key is not valid (INFO-100)")
        }
    } else if body.contains(XML_OK_CODE) {
        OutcomeRecord {
            name: Some(spec.name.clone()),
            url: spec.display_url(),
            response_size: Some(body.chars().count()),
            response_preview: Some(preview(body, XML_SUCCESS_PREVIEW_CHARS)),
            ..OutcomeRecord::new(spec.id, OutcomeStatus::XmlSuccess)
        }
    } else {
        OutcomeRecord {
            response_preview: Some(preview(body, PREVIEW_CHARS)),
            ..OutcomeRecord::new(spec.id, OutcomeStatus::XmlUnknown)
        }
    };

    OutcomeRecord {
        result_code,
        result_message,
        ..base
    }
}

/// Pull `<CODE>` and `<MESSAGE>` text out of a Seoul `<RESULT>` block
pub fn extract_xml_result(body: &str) -> (Option<String>, Option<String>) {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut current: Option<Vec<u8>> = None;
    let mut code = None;
    let mut message = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current = Some(e.name().as_ref().to_vec()),
            Ok(Event::End(_)) => current = None,
            Ok(Event::Text(t)) => {
                let Some(tag) = current.as_deref() else {
                    continue;
                };
                let Ok(text) = t.unescape() else {
                    continue;
                };
                match tag {
                    b"CODE" if code.is_none() => code = Some(text.into_owned()),
                    b"MESSAGE" if message.is_none() => message = Some(text.into_owned()),
                    _ => {}
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    (code, message)
}

/// Summarize the top-level shape of a payload
pub fn analyze_structure(data: &Value) -> DataStructure {
    match data {
        Value::Array(items) => DataStructure::Array {
            count: items.len(),
            sample_type: items.first().map(|v| json_type_name(v).to_string()),
        },
        Value::Object(map) => DataStructure::Object {
            keys: map.keys().take(STRUCTURE_KEYS).cloned().collect(),
        },
        Value::String(_) => DataStructure::String,
        Value::Number(_) => DataStructure::Number,
        Value::Bool(_) => DataStructure::Bool,
        Value::Null => DataStructure::Null,
    }
}

/// First two array elements, first five object entries, or a truncated scalar
pub fn sample_data(data: &Value) -> Value {
    match data {
        Value::Array(items) => Value::Array(items.iter().take(SAMPLE_RECORDS).cloned().collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .take(SAMPLE_OBJECT_ENTRIES)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        ),
        other => Value::String(preview(&other.to_string(), 200)),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::Null => "null",
    }
}

/// First `max_chars` characters of `text`
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn preview_or_placeholder(body: &str) -> String {
    let p = preview(body, PREVIEW_CHARS);
    if p.is_empty() {
        "<empty body>".to_string()
    } else {
        p
    }
}
