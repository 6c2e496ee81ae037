use crate::config::toml_config::ArtifactsConfig;
use crate::core::engine;
use crate::core::provider::XmlTemplateProvider;
use crate::core::{SiteConnector, SiteSession, Storage};
use crate::domain::credentials::Credentials;
use crate::domain::template::ProvisioningTemplate;
use crate::utils::error::Result;

/// 擷取結果；`template` 是未過濾的原始範本
#[derive(Debug, Clone)]
pub struct ExtractedTemplate {
    pub template: ProvisioningTemplate,
    pub site_title: String,
    pub template_path: String,
    /// 過濾失敗時為 None
    pub global_nav_path: Option<String>,
}

pub struct TemplateExtractor<'a, C: SiteConnector, S: Storage> {
    connector: &'a C,
    provider: XmlTemplateProvider<S>,
    artifacts: ArtifactsConfig,
}

impl<'a, C: SiteConnector, S: Storage> TemplateExtractor<'a, C, S> {
    pub fn new(connector: &'a C, storage: S, artifacts: ArtifactsConfig) -> Self {
        Self {
            connector,
            provider: XmlTemplateProvider::new(storage),
            artifacts,
        }
    }

    pub async fn extract(&self, site_url: &str, credentials: &Credentials) -> Result<ExtractedTemplate> {
        let session = self.connector.connect(site_url, credentials).await?;

        let web = session.web_info().await?;
        tracing::info!("Your site title is: {}", web.title);

        let template_id = format!("TEMPLATE-{}", chrono::Local::now().format("%Y%m%d%H%M%S"));
        let template = engine::extract_navigation_template(
            &session,
            &web.url,
            &template_id,
            &|message: &str, progress: usize, total: usize| {
                tracing::info!("{:02}/{:02} - {}", progress, total, message);
            },
        )
        .await?;

        let template_path = self
            .provider
            .save_as(&template, &self.artifacts.template_file)
            .await?;
        tracing::info!("📁 Template saved to: {}", template_path);

        let global_nav_path = match self
            .provider
            .save_global_navigation_only(&self.artifacts.template_file, &self.artifacts.filtered_file)
            .await
        {
            Ok(path) => {
                tracing::info!("📁 Global navigation template saved to: {}", path);
                Some(path)
            }
            Err(e) => {
                tracing::warn!(
                    "There were no Navigation nodes found in the template for site: {}",
                    web.title
                );
                tracing::warn!("Error: {}", e);
                None
            }
        };

        Ok(ExtractedTemplate {
            template,
            site_title: web.title,
            template_path,
            global_nav_path,
        })
    }
}
