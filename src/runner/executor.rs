use super::classify::{classify, Classification, ResponseSnapshot};
use super::state::{OutcomeRecord, OutcomeStatus};
use crate::registry::EndpointSpec;
use crate::utils::{mask_key, Settings};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// Query parameter carrying the traffic API key
pub const API_KEY_PARAM: &str = "apikey";

/// Issues the HTTP requests for one run
pub struct RequestExecutor {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl RequestExecutor {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_retries: settings.api_max_retries.max(1),
            retry_delay: settings.retry_delay(),
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// GET a traffic endpoint with `apikey` injected, retrying failures.
    ///
    /// 401 and 410 settle the outcome on first sight; other statuses and
    /// transport errors are retried until `max_retries` attempts are spent.
    pub async fn probe_traffic(
        &self,
        spec: &EndpointSpec,
        url: &str,
        params: &[(String, String)],
    ) -> OutcomeRecord {
        let mut query = params.to_vec();
        query.push((API_KEY_PARAM.to_string(), spec.api_key.clone()));
        let reported_params = masked_parameters(&query, &spec.api_key);

        log::debug!("   Parameters: {}", Value::Object(reported_params.clone()));

        let started = Instant::now();
        for attempt in 1..=self.max_retries {
            log::info!("   Attempt {}/{}", attempt, self.max_retries);

            match self.fetch(url, Some(query.as_slice())).await {
                Ok(response) => {
                    log::info!("   Response status: {}", response.status);
                    match classify(spec, &response) {
                        Classification::Final(record) => {
                            let record = OutcomeRecord {
                                parameters: Some(reported_params),
                                attempts: Some(attempt),
                                duration_ms: Some(elapsed_ms(started)),
                                ..record
                            };
                            log_outcome(&record);
                            return record;
                        }
                        Classification::Unexpected { status, preview } => {
                            log::error!("   HTTP error {}: {}", status, preview);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("   Request failed: {}", redact(&e.to_string(), &spec.api_key))
                }
            }

            if attempt < self.max_retries && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        OutcomeRecord {
            parameters: Some(reported_params),
            attempts: Some(self.max_retries),
            duration_ms: Some(elapsed_ms(started)),
            ..OutcomeRecord::new(spec.id, OutcomeStatus::FailedAllAttempts)
                .with_error(format!("All {} attempts failed", self.max_retries))
        }
    }

    /// Single GET against the population endpoint, key already in the path
    pub async fn probe_population(&self, spec: &EndpointSpec, url: &str) -> OutcomeRecord {
        log::info!("   Population API key: {}", mask_key(&spec.api_key));

        let started = Instant::now();
        let record = match self.fetch(url, None).await {
            Ok(response) => {
                log::info!("   Response status: {}", response.status);
                log::info!(
                    "   Content-Type: {}",
                    response.content_type.as_deref().unwrap_or("N/A")
                );
                match classify(spec, &response) {
                    Classification::Final(record) => record,
                    Classification::Unexpected { status, .. } => OutcomeRecord {
                        status_code: Some(status),
                        error: Some(super::classify::preview(&response.body, 200)),
                        ..OutcomeRecord::new(spec.id, OutcomeStatus::HttpError)
                    },
                }
            }
            Err(e) => OutcomeRecord::new(spec.id, OutcomeStatus::RequestError)
                .with_error(redact(&e.to_string(), &spec.api_key)),
        };

        let record = OutcomeRecord {
            attempts: Some(1),
            duration_ms: Some(elapsed_ms(started)),
            ..record
        };
        log_outcome(&record);
        record
    }

    async fn fetch(
        &self,
        url: &str,
        query: Option<&[(String, String)]>,
    ) -> Result<ResponseSnapshot, reqwest::Error> {
        let mut request = self.client.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(ResponseSnapshot {
            status,
            content_type,
            body,
        })
    }
}

/// Query parameters as a JSON object, with the key value masked
fn masked_parameters(query: &[(String, String)], api_key: &str) -> Map<String, Value> {
    query
        .iter()
        .map(|(k, v)| {
            let value = if k == API_KEY_PARAM {
                mask_key(api_key)
            } else {
                v.clone()
            };
            (k.clone(), Value::String(value))
        })
        .collect()
}

fn redact(text: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        text.to_string()
    } else {
        text.replace(api_key, &mask_key(api_key))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn log_outcome(record: &OutcomeRecord) {
    match record.status {
        OutcomeStatus::Success | OutcomeStatus::XmlSuccess => {
            log::info!("   Outcome: {}", record.status)
        }
        _ => log::error!("   Outcome: {} ({})", record.status, record.reason()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_parameters_hide_key() {
        let query = vec![
            ("stdrDe".to_string(), "20250801".to_string()),
            (API_KEY_PARAM.to_string(), "abcdefghijklmnop".to_string()),
        ];
        let params = masked_parameters(&query, "abcdefghijklmnop");
        assert_eq!(params["stdrDe"], "20250801");
        assert_eq!(params[API_KEY_PARAM], "abcdefghij***");
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("error sending request for url (http://h/KEY123456789/json)", "KEY123456789"),
            "error sending request for url (http://h/KEY1234567***/json)"
        );
        assert_eq!(redact("timeout", ""), "timeout");
    }

    #[test]
    fn test_retry_count_floor() {
        let settings = Settings {
            api_max_retries: 0,
            ..Settings::default()
        };
        let executor = RequestExecutor::new(&settings).unwrap();
        assert_eq!(executor.max_retries(), 1);
    }
}
