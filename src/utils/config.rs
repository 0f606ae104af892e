use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SEOUL_API_BASE_URL: &str = "http://t-data.seoul.go.kr/apig/apiman-gateway/tapi";
pub const DEFAULT_POPULATION_BASE_URL: &str = "http://openapi.seoul.go.kr:8088";

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "seoul-api.yaml";

/// Upper bound for the timeout and both delays (seconds)
pub const MAX_WAIT_SECS: u64 = 300;

/// Probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the TOPIS/TAIMS traffic gateway
    pub seoul_api_base_url: String,

    /// Base URL of the Seoul open-data (population) service
    pub seoul_population_base_url: String,

    pub seoul_traffic_api_key: Option<String>,

    pub seoul_population_api_key: Option<String>,

    /// Per-request timeout (seconds)
    pub api_timeout: u64,

    /// Attempts per traffic endpoint
    pub api_max_retries: u32,

    /// Delay between attempts (seconds)
    pub api_retry_delay: f64,

    /// Pause between endpoints (seconds)
    pub endpoint_interval: f64,

    /// `stdrDe` / `stndDt` query value sent to the traffic endpoints
    pub standard_date: String,

    /// Problems found while reading environment overrides
    #[serde(skip)]
    pub(crate) env_issues: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seoul_api_base_url: DEFAULT_SEOUL_API_BASE_URL.to_string(),
            seoul_population_base_url: DEFAULT_POPULATION_BASE_URL.to_string(),
            seoul_traffic_api_key: None,
            seoul_population_api_key: None,
            api_timeout: 30,
            api_max_retries: 3,
            api_retry_delay: 1.0,
            endpoint_interval: 1.0,
            standard_date: "20250801".to_string(),
            env_issues: Vec::new(),
        }
    }
}

/// Result of [`Settings::validate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl Settings {
    /// Load settings from an optional YAML file, then overlay the process environment.
    ///
    /// Without an explicit path, `seoul-api.yaml` in the working directory is used if it exists.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| {
                let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
                fallback.is_file().then_some(fallback)
            });

        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Overlay values from an environment lookup (`std::env::var` in production)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SEOUL_API_BASE_URL") {
            self.seoul_api_base_url = v;
        }
        if let Some(v) = get("SEOUL_POPULATION_BASE_URL") {
            self.seoul_population_base_url = v;
        }
        if let Some(v) = get("SEOUL_TRAFFIC_API_KEY") {
            self.seoul_traffic_api_key = Some(v);
        }
        if let Some(v) = get("SEOUL_POPULATION_API_KEY") {
            self.seoul_population_api_key = Some(v);
        }
        if let Some(v) = get("STANDARD_DATE") {
            self.standard_date = v;
        }

        if let Some(v) = get("API_TIMEOUT") {
            match v.trim().parse() {
                Ok(n) => self.api_timeout = n,
                Err(_) => self.env_issues.push(format!("API_TIMEOUT is not a number: {}", v)),
            }
        }
        if let Some(v) = get("API_MAX_RETRIES") {
            match v.trim().parse() {
                Ok(n) => self.api_max_retries = n,
                Err(_) => self
                    .env_issues
                    .push(format!("API_MAX_RETRIES is not a number: {}", v)),
            }
        }
        if let Some(v) = get("API_RETRY_DELAY") {
            match v.trim().parse() {
                Ok(n) => self.api_retry_delay = n,
                Err(_) => self
                    .env_issues
                    .push(format!("API_RETRY_DELAY is not a number: {}", v)),
            }
        }
        if let Some(v) = get("ENDPOINT_INTERVAL") {
            match v.trim().parse() {
                Ok(n) => self.endpoint_interval = n,
                Err(_) => self
                    .env_issues
                    .push(format!("ENDPOINT_INTERVAL is not a number: {}", v)),
            }
        }
    }

    /// Check every field and collect all problems at once
    pub fn validate(&self) -> ValidationReport {
        let mut issues = self.env_issues.clone();

        if is_blank(&self.seoul_traffic_api_key) {
            issues.push("SEOUL_TRAFFIC_API_KEY is not set".to_string());
        }
        if is_blank(&self.seoul_population_api_key) {
            issues.push("SEOUL_POPULATION_API_KEY is not set".to_string());
        }

        for (name, value) in [
            ("SEOUL_API_BASE_URL", &self.seoul_api_base_url),
            ("SEOUL_POPULATION_BASE_URL", &self.seoul_population_base_url),
        ] {
            if let Err(e) = reqwest::Url::parse(value) {
                issues.push(format!("{} is not a valid URL ({}): {}", name, e, value));
            }
        }

        if self.api_timeout == 0 || self.api_timeout > MAX_WAIT_SECS {
            issues.push(format!(
                "API_TIMEOUT must be between 1 and {} seconds",
                MAX_WAIT_SECS
            ));
        }
        if self.api_max_retries == 0 {
            issues.push("API_MAX_RETRIES must be at least 1".to_string());
        }
        for (name, value) in [
            ("API_RETRY_DELAY", self.api_retry_delay),
            ("ENDPOINT_INTERVAL", self.endpoint_interval),
        ] {
            if !(0.0..=MAX_WAIT_SECS as f64).contains(&value) {
                issues.push(format!(
                    "{} must be between 0 and {} seconds: {}",
                    name, MAX_WAIT_SECS, value
                ));
            }
        }
        if self.standard_date.len() != 8 || !self.standard_date.chars().all(|c| c.is_ascii_digit())
        {
            issues.push(format!(
                "STANDARD_DATE must be in YYYYMMDD form: {}",
                self.standard_date
            ));
        }

        ValidationReport {
            valid: issues.is_empty(),
            issues,
        }
    }

    /// Validate and hand back the settings, or every issue as one error
    pub fn into_validated(self) -> ConfigResult<Self> {
        let report = self.validate();
        if report.valid {
            Ok(self)
        } else {
            Err(ConfigError::Invalid {
                issues: report.issues,
            })
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        wait_duration(self.api_retry_delay)
    }

    pub fn endpoint_interval(&self) -> Duration {
        wait_duration(self.endpoint_interval)
    }

    pub fn traffic_api_key(&self) -> &str {
        self.seoul_traffic_api_key.as_deref().unwrap_or_default()
    }

    pub fn population_api_key(&self) -> &str {
        self.seoul_population_api_key.as_deref().unwrap_or_default()
    }
}

/// Seconds to a `Duration`, clamped to `0..=MAX_WAIT_SECS`; NaN becomes zero
fn wait_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_WAIT_SECS as f64)).unwrap_or_default()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Show only the first 10 characters of a key
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(10).collect();
    format!("{}***", prefix)
}
