pub mod config;

pub use config::{mask_key, Settings, ValidationReport};
