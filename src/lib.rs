//! # witkit
//!
//! A library for managing Azure DevOps work items and test cases. It provides:
//!
//! - Typed and raw REST clients for the work item tracking APIs
//! - The test-step XML codec for the `Microsoft.VSTS.TCM.Steps` field
//! - Bulk test case import from JSON and CSV files
//! - Configuration management with layered sources
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use witkit::{AzureDevOpsClient, models::TestStep};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AzureDevOpsClient::new(
//!     "my-org".to_string(),
//!     "my-project".to_string(),
//!     "my-pat".to_string(),
//! )?;
//!
//! let steps = vec![TestStep {
//!     action: "Open the login page".to_string(),
//!     expected: "Login form is shown".to_string(),
//! }];
//! let case = client.create_test_case("Login works", None, &steps, &[]).await?;
//! println!("created test case {}", case.id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod constants_gen;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod output;
pub mod parsed_property;
pub mod steps;
pub mod utils;

// Re-export commonly used types for convenience
pub use api::{AzureDevOpsClient, RestClient};
pub use config::Config;
pub use error::{ApiError, ConfigError, ImportError, WitkitError, WitkitResult};
pub use models::{Args, SharedConfig};
pub use steps::{build_steps_xml, parse_steps_xml};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version string with the build's git commit, shown by `--version`.
pub const FULL_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");
