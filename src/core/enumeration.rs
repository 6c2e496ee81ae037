use crate::config::toml_config::ListsConfig;
use crate::core::{SiteConnector, SiteSession};
use crate::domain::credentials::Credentials;
use crate::domain::model::{ListItem, ListQuery, SiteReference};
use crate::utils::error::{DeployError, Result};

/// 從基礎架構網站的清單讀出要部署的網站
pub struct TargetEnumerator<'a, C: SiteConnector> {
    connector: &'a C,
    lists: ListsConfig,
}

impl<'a, C: SiteConnector> TargetEnumerator<'a, C> {
    pub fn new(connector: &'a C, lists: ListsConfig) -> Self {
        Self { connector, lists }
    }

    /// 只回傳部署旗標為 true 的列，保留伺服器回傳的順序
    pub async fn enumerate(
        &self,
        infrastructure_url: &str,
        credentials: &Credentials,
    ) -> Result<Vec<SiteReference>> {
        let session = self.connector.connect(infrastructure_url, credentials).await?;

        let query = ListQuery::boolean_eq(self.lists.deploy_field.as_str(), true);
        tracing::debug!("Querying '{}' with {}", self.lists.sites_list, query.to_view_xml());

        let items = session
            .query_list_items(&self.lists.sites_list, &query)
            .await?;

        let sites = items
            .iter()
            .map(|item| self.to_site_reference(item))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            "Found {} site(s) flagged for global navigation in '{}'",
            sites.len(),
            self.lists.sites_list
        );
        for site in &sites {
            tracing::debug!("Target: {} ({})", site.title, site.url);
        }
        Ok(sites)
    }

    fn to_site_reference(&self, item: &ListItem) -> Result<SiteReference> {
        let field = |name: &str| {
            item.text(name).ok_or_else(|| DeployError::MissingFieldError {
                list: self.lists.sites_list.clone(),
                field: name.to_string(),
            })
        };
        Ok(SiteReference {
            title: field(&self.lists.title_field)?,
            url: field(&self.lists.url_field)?,
        })
    }
}
