use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Authentication failed for {site}: {message}")]
    AuthenticationError { site: String, message: String },

    #[error("SharePoint request to {url} failed with status {status}: {message}")]
    SharePointError {
        url: String,
        status: u16,
        message: String,
    },

    #[error("List '{list}' row is missing field '{field}'")]
    MissingFieldError { list: String, field: String },

    #[error("Template error: {message}")]
    TemplateError { message: String },

    #[error("No Navigation element found in template {path}")]
    NoNavigationError { path: String },

    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Data,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeployError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeployError::ApiError(_) | DeployError::SharePointError { .. } => ErrorCategory::Network,
            DeployError::AuthenticationError { .. } => ErrorCategory::Authentication,
            DeployError::ConfigError { .. }
            | DeployError::ConfigValidationError { .. }
            | DeployError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DeployError::SerializationError(_)
            | DeployError::XmlError(_)
            | DeployError::MissingFieldError { .. }
            | DeployError::TemplateError { .. }
            | DeployError::NoNavigationError { .. }
            | DeployError::ProcessingError { .. } => ErrorCategory::Data,
            DeployError::InputError { .. } => ErrorCategory::Input,
            DeployError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 找不到導覽節點只影響過濾後的檔案
            DeployError::NoNavigationError { .. } => ErrorSeverity::Low,
            DeployError::ApiError(_) => ErrorSeverity::Medium,
            DeployError::SharePointError { status, .. } if *status >= 500 || *status == 429 => {
                ErrorSeverity::Medium
            }
            DeployError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check the site URLs and network connectivity, then run the deployment again"
            }
            ErrorCategory::Authentication => {
                "Verify the user name and password and that the account can sign in to SharePoint Online"
            }
            ErrorCategory::Configuration => "Review the configuration file and command line flags",
            ErrorCategory::Data => {
                "Check the GlobalNavSites list columns and the files in the ProvisioningTemplates library"
            }
            ErrorCategory::Input => "Run the tool again and complete every prompt",
            ErrorCategory::System => "Check that the work directory exists and is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DeployError::AuthenticationError { site, .. } => {
                format!("Could not sign in to {}", site)
            }
            DeployError::MissingFieldError { list, field } => {
                format!("The list '{}' does not have a value for '{}'", list, field)
            }
            DeployError::SharePointError { status: 404, url, .. } => {
                format!("SharePoint could not find {}", url)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
