pub mod application;
pub mod engine;
pub mod enumeration;
pub mod extraction;
pub mod input;
pub mod provider;
pub mod workflow;

pub use crate::domain::model::{ListItem, SiteReference};
pub use crate::domain::ports::{Progress, Prompter, SiteConnector, SiteSession, Storage};
pub use crate::utils::error::Result;
