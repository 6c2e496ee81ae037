use crate::utils::error::{DeployError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub sharepoint: SharePointConfig,
    pub lists: ListsConfig,
    pub artifacts: ArtifactsConfig,
    pub deploy: DeploySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharePointConfig {
    pub sts_endpoint: String,
    /// 0 表示不設逾時
    pub request_timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for SharePointConfig {
    fn default() -> Self {
        Self {
            sts_endpoint: "https://login.microsoftonline.com/extSTS.srf".to_string(),
            request_timeout_seconds: 0,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListsConfig {
    pub sites_list: String,
    pub deploy_field: String,
    pub title_field: String,
    pub url_field: String,
    pub templates_library: String,
    pub row_limit: usize,
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            sites_list: "GlobalNavSites".to_string(),
            deploy_field: "Deploy_x0020_Navigation".to_string(),
            title_field: "Title".to_string(),
            url_field: "Site_x0020_Collection_x0020_URL".to_string(),
            templates_library: "ProvisioningTemplates".to_string(),
            row_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub work_dir: PathBuf,
    pub template_file: String,
    pub filtered_file: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("pnpprovisioningdemo"),
            template_file: "PnPProvisioningDemo.xml".to_string(),
            filtered_file: "GlobalNav.xml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// 第一個網站失敗就停止
    Abort,
    /// 記錄失敗並繼續下一個網站
    Continue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    pub clear_navigation: bool,
    pub on_site_failure: FailurePolicy,
    pub pause_before_apply: bool,
    pub pause_on_exit: bool,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            clear_navigation: true,
            on_site_failure: FailurePolicy::Abort,
            pause_before_apply: true,
            pause_on_exit: true,
        }
    }
}

impl DeployConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeployError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeployError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${WORK_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeployError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("sharepoint.sts_endpoint", &self.sharepoint.sts_endpoint)?;

        validation::validate_non_empty_string("lists.sites_list", &self.lists.sites_list)?;
        validation::validate_non_empty_string("lists.deploy_field", &self.lists.deploy_field)?;
        validation::validate_non_empty_string("lists.title_field", &self.lists.title_field)?;
        validation::validate_non_empty_string("lists.url_field", &self.lists.url_field)?;
        validation::validate_non_empty_string(
            "lists.templates_library",
            &self.lists.templates_library,
        )?;
        validation::validate_positive_number("lists.row_limit", self.lists.row_limit, 1)?;

        validation::validate_path(
            "artifacts.work_dir",
            &self.artifacts.work_dir.display().to_string(),
        )?;
        validation::validate_file_name("artifacts.template_file", &self.artifacts.template_file)?;
        validation::validate_file_name("artifacts.filtered_file", &self.artifacts.filtered_file)?;

        if self.artifacts.template_file == self.artifacts.filtered_file {
            return Err(DeployError::InvalidConfigValueError {
                field: "artifacts.filtered_file".to_string(),
                value: self.artifacts.filtered_file.clone(),
                reason: "Must differ from artifacts.template_file".to_string(),
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        match self.sharepoint.request_timeout_seconds {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

impl Validate for DeployConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
