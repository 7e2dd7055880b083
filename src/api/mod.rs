//! Azure DevOps API clients.
//!
//! Two clients share the work:
//!
//! - [`AzureDevOpsClient`] wraps the typed `azure_devops_rust_api` work item
//!   tracking client for create/read/update operations.
//! - [`RestClient`] talks to the endpoints the typed crate does not model:
//!   WIQL, field and type listings, classification nodes, attachments and
//!   test plans.
//!
//! ## Example
//!
//! ```rust,no_run
//! use witkit::api::AzureDevOpsClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AzureDevOpsClient::new(
//!     "my-org".to_string(),
//!     "my-project".to_string(),
//!     "my-pat".to_string(),
//! )?;
//!
//! let item = client.get_work_item(42).await?;
//! println!("{}: {:?}", item.id, item.title);
//! # Ok(())
//! # }
//! ```

mod client;
mod credential;
mod mappers;
mod rest;

// Re-export the clients and their public items
pub use client::AzureDevOpsClient;
pub use credential::PatCredential;
pub use rest::{RestClient, escape_wiql_literal, flatten_classification_tree};
