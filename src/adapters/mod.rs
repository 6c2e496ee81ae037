// Adapters layer: concrete implementations for external systems (SharePoint REST, local files, console).

#[cfg(feature = "cli")]
pub mod console;
pub mod sharepoint;
pub mod storage;
