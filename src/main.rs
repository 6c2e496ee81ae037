use clap::Parser;
use global_nav_deploy::utils::{logger, validation::Validate};
use global_nav_deploy::{
    CliConfig, ConsolePrompter, DeployWorkflow, LocalStorage, SharePointConnector,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load_deploy_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let connector = match SharePointConnector::from_config(&config) {
        Ok(connector) => connector,
        Err(e) => {
            tracing::error!("❌ Failed to create SharePoint client: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };
    let storage = LocalStorage::new(config.artifacts.work_dir.clone());
    let workflow = DeployWorkflow::new(connector, storage, ConsolePrompter::new(), config);

    match workflow.run().await {
        Ok(summary) => {
            tracing::info!(
                "✅ Deployment finished: {} site(s), {} succeeded, {} failed",
                summary.sites.len(),
                summary.report.succeeded(),
                summary.report.failed()
            );
            if summary.report.failed() > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Deployment failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
