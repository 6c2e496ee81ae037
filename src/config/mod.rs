pub mod toml_config;

pub use toml_config::{DeployConfig, FailurePolicy};

#[cfg(feature = "cli")]
use clap::Parser;

/// 命令列參數；都不指定時與互動式流程完全相同
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "global-nav-deploy")]
#[command(about = "Extract SharePoint Online global navigation and deploy it to the sites listed on the infrastructure site")]
pub struct CliConfig {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory for the extracted template files
    #[arg(long)]
    pub work_dir: Option<String>,

    /// Keep deploying to the remaining sites when one site fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Do not wait for Enter before applying and before exiting
    #[arg(long)]
    pub no_pause: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Write logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入配置檔（若有）並套用命令列覆蓋
    pub fn load_deploy_config(&self) -> crate::utils::error::Result<DeployConfig> {
        let mut config = match &self.config {
            Some(path) => DeployConfig::from_file(path)?,
            None => DeployConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut DeployConfig) {
        if let Some(work_dir) = &self.work_dir {
            config.artifacts.work_dir = work_dir.into();
        }
        if self.continue_on_error {
            config.deploy.on_site_failure = FailurePolicy::Continue;
        }
        if self.no_pause {
            config.deploy.pause_before_apply = false;
            config.deploy.pause_on_exit = false;
        }
    }
}
