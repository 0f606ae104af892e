use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating settings.
///
/// Everything else in the crate is recorded as an outcome rather than
/// returned as an error, so this is the only fatal error family.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid settings:\n  - {}", .issues.join("\n  - "))]
    Invalid { issues: Vec<String> },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
