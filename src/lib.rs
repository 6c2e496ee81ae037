pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use adapters::console::ConsolePrompter;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::sharepoint::SharePointConnector;
pub use adapters::storage::LocalStorage;
pub use config::{DeployConfig, FailurePolicy};
pub use core::workflow::{DeployWorkflow, DeploymentSummary};
pub use domain::credentials::{Credentials, SecureString};
pub use domain::model::SiteReference;
pub use utils::error::{DeployError, Result};
