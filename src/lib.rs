pub mod error;
pub mod registry;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use error::ConfigError;
pub use report::generate_report;
pub use runner::ApiTester;
pub use utils::Settings;
