use crate::config::toml_config::{DeploySettings, FailurePolicy, ListsConfig};
use crate::core::engine::{self, ApplyingInformation, TEMPLATE_ID_PROPERTY, TEMPLATE_INFO_PROPERTY};
use crate::core::provider::XmlTemplateProvider;
use crate::core::{SiteConnector, SiteSession, Storage};
use crate::domain::credentials::Credentials;
use crate::domain::model::{ApplyOutcome, DeploymentReport, SiteOutcome, SiteReference};
use crate::domain::template::ProvisioningTemplate;
use crate::utils::error::{DeployError, Result};

/// 從範本文件庫載入範本並套用到每個目標網站
pub struct TemplateApplier<'a, C: SiteConnector> {
    connector: &'a C,
    lists: ListsConfig,
    settings: DeploySettings,
}

impl<'a, C: SiteConnector> TemplateApplier<'a, C> {
    pub fn new(connector: &'a C, lists: ListsConfig, settings: DeploySettings) -> Self {
        Self {
            connector,
            lists,
            settings,
        }
    }

    pub async fn retrieve_and_apply(
        &self,
        sites: &[SiteReference],
        infrastructure_url: &str,
        credentials: &Credentials,
    ) -> Result<DeploymentReport> {
        let session = self.connector.connect(infrastructure_url, credentials).await?;
        let web = session.web_info().await?;

        let files = session
            .list_library_files(&self.lists.templates_library, self.lists.row_limit)
            .await?;
        tracing::info!(
            "Found {} template file(s) in '{}' on {}",
            files.len(),
            self.lists.templates_library,
            web.url
        );

        let provider = XmlTemplateProvider::new(LibraryStorage { session: &session });
        let mut report = DeploymentReport::default();
        for file in &files {
            let template = provider.get_template(&file.server_relative_url).await?;
            tracing::info!(
                "Loaded template {} from {} ({} navigation node(s))",
                template.id,
                file.name,
                template.node_count()
            );

            self.apply_to_sites(&file.name, &template, sites, credentials, &mut report)
                .await?;
        }

        Ok(report)
    }

    pub async fn apply_to_sites(
        &self,
        template_name: &str,
        template: &ProvisioningTemplate,
        sites: &[SiteReference],
        credentials: &Credentials,
        report: &mut DeploymentReport,
    ) -> Result<()> {
        for site in sites {
            match self.apply_to_site(template, site, credentials).await {
                Ok(outcome) => report.outcomes.push(SiteOutcome {
                    template_name: template_name.to_string(),
                    site: site.clone(),
                    result: Ok(outcome),
                }),
                Err(e) => match self.settings.on_site_failure {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Continue => {
                        tracing::error!("❌ Failed to apply {} to {}: {}", template_name, site.url, e);
                        report.outcomes.push(SiteOutcome {
                            template_name: template_name.to_string(),
                            site: site.clone(),
                            result: Err(e.to_string()),
                        });
                    }
                },
            }
        }
        Ok(())
    }

    async fn apply_to_site(
        &self,
        template: &ProvisioningTemplate,
        site: &SiteReference,
        credentials: &Credentials,
    ) -> Result<ApplyOutcome> {
        let session = self.connector.connect(&site.url, credentials).await?;
        let web = session.web_info().await?;
        tracing::debug!("Applying to '{}' ({})", web.title, site.url);

        tracing::info!("Start Applying Template: {}", clock());

        let info = ApplyingInformation {
            clear_navigation: self.settings.clear_navigation,
        };
        let outcome = engine::apply_template(
            &session,
            &web.url,
            template,
            &info,
            &|message: &str, step: usize, total: usize| {
                tracing::info!("{}/{} Provisioning {}", step, total, message);
            },
        )
        .await?;

        tracing::info!("Done applying template: {}", clock());

        println!("Look what the engine left behind!");
        let template_id = session
            .property_bag_value(TEMPLATE_ID_PROPERTY)
            .await?
            .unwrap_or_default();
        println!("{}: {}", TEMPLATE_ID_PROPERTY, template_id);
        let template_info = session
            .property_bag_value(TEMPLATE_INFO_PROPERTY)
            .await?
            .unwrap_or_default();
        println!("{}: {}", TEMPLATE_INFO_PROPERTY, template_info);

        Ok(ApplyOutcome {
            template_id,
            template_info,
            ..outcome
        })
    }
}

/// 範本文件庫，以伺服器相對 URL 讀取；不支援寫入
struct LibraryStorage<'s, S: SiteSession> {
    session: &'s S,
}

impl<S: SiteSession> Storage for LibraryStorage<'_, S> {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.session.read_file(path).await
    }

    async fn write_file(&self, path: &str, _data: &[u8]) -> Result<()> {
        Err(DeployError::ProcessingError {
            message: format!("cannot write {}: the template library is read-only", path),
        })
    }

    fn location(&self, path: &str) -> String {
        path.to_string()
    }
}

fn clock() -> String {
    chrono::Local::now().format("%I.%M.%S").to_string()
}
