pub mod classify;
pub mod executor;
pub mod state;

use crate::error::ConfigError;
use crate::registry::{EndpointKind, Registry};
use crate::report::types::ProbeReport;
use crate::utils::{mask_key, Settings};
use anyhow::Result;
use std::collections::BTreeSet;

pub use executor::RequestExecutor;
pub use state::*;

/// Runs the registry through the executor and classifier
pub struct ApiTester {
    settings: Settings,
    registry: Registry,
    executor: RequestExecutor,
}

impl ApiTester {
    /// Validate `settings` and prepare the endpoint table.
    ///
    /// Fails with [`ConfigError::Invalid`] before any network activity if the
    /// settings are incomplete.
    pub fn new(settings: Settings) -> Result<Self> {
        let settings = settings.into_validated().map_err(|e| {
            if let ConfigError::Invalid { issues } = &e {
                log::error!("Settings are not valid:");
                for issue in issues {
                    log::error!("  - {}", issue);
                }
            }
            e
        })?;
        log::info!("Settings loaded and validated");

        let registry = Registry::from_settings(&settings);
        let executor = RequestExecutor::new(&settings)?;

        Ok(Self {
            settings,
            registry,
            executor,
        })
    }

    /// Probe one endpoint by identifier
    pub async fn test_single_api(&self, api_id: u8) -> OutcomeRecord {
        let Some(spec) = self.registry.get(api_id) else {
            return OutcomeRecord::new(api_id, OutcomeStatus::NotDefined);
        };

        let url = match &spec.kind {
            EndpointKind::Discontinued => {
                return OutcomeRecord {
                    description: Some("Service discontinued; no request issued".to_string()),
                    ..OutcomeRecord::new(api_id, OutcomeStatus::Discontinued)
                        .with_name(&spec.name)
                };
            }
            EndpointKind::Active { url, .. } | EndpointKind::SpecialPopulation { url, .. } => url,
        };

        log::info!("Testing API {}: {}", api_id, spec.name);
        log::info!("   URL: {}", spec.display_url().unwrap_or_default());

        match &spec.kind {
            EndpointKind::Active { params, .. } => {
                self.executor.probe_traffic(spec, url, params).await
            }
            _ => self.executor.probe_population(spec, url).await,
        }
    }

    /// Probe every registered endpoint in identifier order
    pub async fn test_all_apis(&self) -> ProbeReport {
        let ids = self.registry.ids();
        self.test_apis(&ids).await
    }

    /// Probe the given identifiers in order, pausing between endpoints.
    ///
    /// Repeated identifiers are probed once, at their first position.
    pub async fn test_apis(&self, ids: &[u8]) -> ProbeReport {
        let mut seen = BTreeSet::new();
        let ids: Vec<u8> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        log::info!("Starting API test run");
        log::info!("{}", "=".repeat(60));
        log::info!(
            "Traffic API key: {}",
            mask_key(self.settings.traffic_api_key())
        );
        log::info!(
            "Population API key: {}",
            mask_key(self.settings.population_api_key())
        );
        log::info!("{}", "-".repeat(60));

        let interval = self.settings.endpoint_interval();
        let mut records = Vec::with_capacity(ids.len());

        for (i, &api_id) in ids.iter().enumerate() {
            let record = self.test_single_api(api_id).await;

            if record.status.is_success() {
                log::info!("API {}: success", api_id);
            } else if record.status.is_discontinued() {
                log::info!("API {}: service discontinued", api_id);
            } else {
                log::error!("API {}: {}", api_id, record.reason());
            }
            records.push(record);

            if i + 1 < ids.len() && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }

        let report = ProbeReport::from_records(records, chrono::Local::now());
        let summary = &report.summary;

        log::info!("Final results:");
        log::info!(
            "   Succeeded: {}/{} ({:.1}%)",
            summary.successful_apis,
            summary.testable_apis,
            summary.success_rate
        );
        log::info!("   Failed: {}", summary.failed_apis);
        log::info!("   Discontinued: {}", summary.discontinued_apis);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            seoul_traffic_api_key: Some("traffic-key".to_string()),
            seoul_population_api_key: Some("population-key".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_invalid_settings_are_fatal() {
        let err = match ApiTester::new(Settings::default()) {
            Ok(_) => panic!("settings without keys must be rejected"),
            Err(e) => e,
        };
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Invalid { issues }) => assert_eq!(issues.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_discontinued_without_network() {
        let tester = ApiTester::new(settings()).unwrap();
        let record = tester.test_single_api(6).await;
        assert_eq!(record.api_id, 6);
        assert_eq!(record.status, OutcomeStatus::Discontinued);
        assert!(record.attempts.is_none());
    }

    #[test]
    fn test_unbounded_delay_is_rejected_not_panicking() {
        let settings = Settings {
            api_retry_delay: 1e30,
            ..settings()
        };
        let err = match ApiTester::new(settings) {
            Ok(_) => panic!("an oversized retry delay must be rejected"),
            Err(e) => e,
        };
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Invalid { issues }) => {
                assert_eq!(issues.len(), 1);
                assert!(issues[0].contains("API_RETRY_DELAY"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repeated_ids_are_probed_once() {
        let settings = Settings {
            endpoint_interval: 0.0,
            ..settings()
        };
        let tester = ApiTester::new(settings).unwrap();
        let report = tester.test_apis(&[6, 6, 42, 42]).await;

        let summary = &report.summary;
        assert_eq!(report.detailed_results.len(), 2);
        assert_eq!(summary.total_apis, 2);
        assert_eq!(summary.discontinued_apis, 1);
        assert_eq!(summary.failed_list, vec![42]);
        assert_eq!(summary.testable_apis, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_defined() {
        let tester = ApiTester::new(settings()).unwrap();
        let record = tester.test_single_api(42).await;
        assert_eq!(record.api_id, 42);
        assert_eq!(record.status, OutcomeStatus::NotDefined);
    }
}
