use crate::config::DeployConfig;
use crate::core::application::TemplateApplier;
use crate::core::enumeration::TargetEnumerator;
use crate::core::extraction::{ExtractedTemplate, TemplateExtractor};
use crate::core::input::{collect_inputs, DeploymentInputs};
use crate::core::{Prompter, SiteConnector, Storage};
use crate::domain::model::{DeploymentReport, SiteReference};
use crate::utils::error::Result;
use std::time::Instant;

pub const EDIT_TEMPLATE_PAUSE: &str = "Go and update the Global Nav file now and Press Enter when ready";
pub const DONE_PAUSE: &str = "We're done. Press Enter to continue.";

#[derive(Debug)]
pub struct DeploymentSummary {
    pub extracted: ExtractedTemplate,
    pub sites: Vec<SiteReference>,
    pub report: DeploymentReport,
}

/// Collect → Extract → Enumerate → (pause) → Apply → (pause)
pub struct DeployWorkflow<C: SiteConnector, S: Storage + Clone, P: Prompter> {
    connector: C,
    storage: S,
    prompter: P,
    config: DeployConfig,
}

impl<C: SiteConnector, S: Storage + Clone, P: Prompter> DeployWorkflow<C, S, P> {
    pub fn new(connector: C, storage: S, prompter: P, config: DeployConfig) -> Self {
        Self {
            connector,
            storage,
            prompter,
            config,
        }
    }

    pub async fn run(&self) -> Result<DeploymentSummary> {
        // 憑證只活在這個作用域，任何離開路徑都會清除密碼
        let inputs = collect_inputs(&self.prompter)?;
        self.run_with_inputs(&inputs).await
    }

    pub async fn run_with_inputs(&self, inputs: &DeploymentInputs) -> Result<DeploymentSummary> {
        tracing::info!("🚀 Starting global navigation deployment");
        tracing::debug!("Target site (not used): {}", inputs.target_site_url);

        // Extract
        let started = Instant::now();
        let extractor = TemplateExtractor::new(
            &self.connector,
            self.storage.clone(),
            self.config.artifacts.clone(),
        );
        let extracted = extractor
            .extract(&inputs.template_site_url, &inputs.credentials)
            .await?;
        tracing::info!(
            "⏱️ Extracted {} navigation node(s) in {:?}",
            extracted.template.node_count(),
            started.elapsed()
        );

        // Enumerate
        println!("Determining which sites to apply global nav to now based on SP List");
        let started = Instant::now();
        let enumerator = TargetEnumerator::new(&self.connector, self.config.lists.clone());
        let sites = enumerator
            .enumerate(&inputs.infrastructure_url, &inputs.credentials)
            .await?;
        tracing::info!("⏱️ Enumerated {} site(s) in {:?}", sites.len(), started.elapsed());

        if self.config.deploy.pause_before_apply {
            self.prompter.pause(EDIT_TEMPLATE_PAUSE)?;
        }

        // Apply
        let started = Instant::now();
        let applier = TemplateApplier::new(
            &self.connector,
            self.config.lists.clone(),
            self.config.deploy.clone(),
        );
        let report = applier
            .retrieve_and_apply(&sites, &inputs.infrastructure_url, &inputs.credentials)
            .await?;
        tracing::info!(
            "⏱️ Applied templates in {:?}: {} succeeded, {} failed",
            started.elapsed(),
            report.succeeded(),
            report.failed()
        );
        for failure in report.failures() {
            if let Err(message) = &failure.result {
                tracing::error!(
                    "❌ {} → {} ({}): {}",
                    failure.template_name,
                    failure.site.title,
                    failure.site.url,
                    message
                );
            }
        }

        if self.config.deploy.pause_on_exit {
            self.prompter.pause(DONE_PAUSE)?;
        }

        Ok(DeploymentSummary {
            extracted,
            sites,
            report,
        })
    }
}
