//! SharePoint REST implementation of [`SiteConnector`] / [`SiteSession`].

pub mod auth;
pub mod odata;

use crate::config::DeployConfig;
use crate::core::{SiteConnector, SiteSession};
use crate::domain::credentials::Credentials;
use crate::domain::model::{
    ExistingNode, ListItem, ListQuery, NavigationKind, TemplateFile, WebInfo,
};
use crate::domain::template::NavigationNode;
use crate::utils::error::{DeployError, Result};
use async_trait::async_trait;
use auth::SpoAuthenticator;
use odata::{FileItem, NavigationNodeResponse, ValueList, WebResponse, JSON_NO_METADATA};
use quick_xml::escape::escape;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{redirect, Client};
use std::collections::HashMap;
use url::Url;

const CLIENT_QUERY_TYPE_ID: &str = "{3747adcd-a3c3-41b9-bfab-4a64dd2f1e0a}";

pub struct SharePointConnector {
    client: Client,
    sts_endpoint: String,
    application_name: String,
}

impl SharePointConnector {
    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            // 登入回應是 302，要在轉址前讀到 Set-Cookie
            .redirect(redirect::Policy::none())
            .user_agent(config.sharepoint.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            sts_endpoint: config.sharepoint.sts_endpoint.clone(),
            application_name: config.sharepoint.user_agent.clone(),
        })
    }
}

#[async_trait]
impl SiteConnector for SharePointConnector {
    type Session = RestSession;

    async fn connect(&self, site_url: &str, credentials: &Credentials) -> Result<RestSession> {
        let site = Url::parse(site_url.trim()).map_err(|e| DeployError::AuthenticationError {
            site: site_url.to_string(),
            message: format!("invalid site URL: {}", e),
        })?;

        tracing::debug!("🔐 Signing in to {} as {}", site, credentials.username);
        let authenticator = SpoAuthenticator::new(&self.client, &self.sts_endpoint);
        authenticator.sign_in(&site, credentials).await?;

        let site_url = site.as_str().trim_end_matches('/').to_string();
        let digest = authenticator.form_digest(&site_url).await?;

        Ok(RestSession {
            client: self.client.clone(),
            site_url,
            digest,
            application_name: self.application_name.clone(),
        })
    }
}

/// One authenticated site; the cookie jar lives in the shared client.
pub struct RestSession {
    client: Client,
    site_url: String,
    digest: String,
    application_name: String,
}

impl RestSession {
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    fn api(&self, path: &str) -> String {
        format!("{}/_api/{}", self.site_url, path)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON_NO_METADATA)
            .send()
            .await?;
        odata::check(url, response).await
    }

    async fn post(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
        method: Option<&str>,
    ) -> Result<reqwest::Response> {
        tracing::debug!("POST {}", url);
        let mut request = self
            .client
            .post(url)
            .header(ACCEPT, JSON_NO_METADATA)
            .header("X-RequestDigest", &self.digest);
        if let Some(method) = method {
            request = request.header("X-HTTP-Method", method).header("IF-MATCH", "*");
        }
        request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, JSON_NO_METADATA)
                .body(serde_json::to_vec(body)?),
            None => request.body(""),
        };
        let response = request.send().await?;
        odata::check(url, response).await
    }

    fn navigation_url(&self, kind: NavigationKind, parent: Option<i64>) -> String {
        match parent {
            Some(id) => self.api(&format!("web/Navigation/GetNodeById({})/Children", id)),
            None => self.api(&format!("web/Navigation/{}", kind.collection_name())),
        }
    }
}

#[async_trait]
impl SiteSession for RestSession {
    async fn web_info(&self) -> Result<WebInfo> {
        let web: WebResponse = self
            .get(&self.api("web?$select=Title,Url"))
            .await?
            .json()
            .await?;
        Ok(WebInfo {
            title: web.title,
            url: web.url,
        })
    }

    async fn query_list_items(&self, list_title: &str, query: &ListQuery) -> Result<Vec<ListItem>> {
        let url = self.api(&format!(
            "web/lists/GetByTitle('{}')/GetItems",
            odata::literal(list_title)
        ));
        let body = serde_json::json!({ "query": { "ViewXml": query.to_view_xml() } });
        let items: ValueList<HashMap<String, serde_json::Value>> =
            self.post(&url, Some(&body), None).await?.json().await?;
        Ok(items
            .value
            .into_iter()
            .map(|fields| ListItem { fields })
            .collect())
    }

    async fn list_library_files(&self, library: &str, row_limit: usize) -> Result<Vec<TemplateFile>> {
        let url = self.api(&format!(
            "web/lists/GetByTitle('{}')/items?$select=File/Name,File/ServerRelativeUrl&$expand=File&$top={}",
            odata::literal(library),
            row_limit
        ));
        let items: ValueList<FileItem> = self.get(&url).await?.json().await?;
        Ok(items
            .value
            .into_iter()
            .filter_map(|item| item.file)
            .map(|file| TemplateFile {
                name: file.name,
                server_relative_url: file.server_relative_url,
            })
            .collect())
    }

    async fn read_file(&self, server_relative_url: &str) -> Result<Vec<u8>> {
        let url = self.api(&format!(
            "web/GetFileByServerRelativeUrl('{}')/$value",
            odata::literal(server_relative_url)
        ));
        let bytes = self.get(&url).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn navigation_nodes(
        &self,
        kind: NavigationKind,
        parent: Option<i64>,
    ) -> Result<Vec<ExistingNode>> {
        let url = self.navigation_url(kind, parent);
        let nodes: ValueList<NavigationNodeResponse> = self.get(&url).await?.json().await?;
        Ok(nodes
            .value
            .into_iter()
            .map(|node| ExistingNode {
                id: node.id,
                title: node.title,
                url: node.url.unwrap_or_default(),
                is_external: node.is_external,
            })
            .collect())
    }

    async fn delete_navigation_node(&self, id: i64) -> Result<()> {
        let url = self.api(&format!("web/Navigation/GetNodeById({})", id));
        self.post(&url, None, Some("DELETE")).await?;
        Ok(())
    }

    async fn add_navigation_node(
        &self,
        kind: NavigationKind,
        parent: Option<i64>,
        node: &NavigationNode,
    ) -> Result<i64> {
        let url = self.navigation_url(kind, parent);
        let body = serde_json::json!({
            "Title": node.title,
            "Url": node.url,
            "IsExternal": node.is_external,
        });
        let created: NavigationNodeResponse =
            self.post(&url, Some(&body), None).await?.json().await?;
        Ok(created.id)
    }

    async fn property_bag_value(&self, key: &str) -> Result<Option<String>> {
        let encoded = odata::encode_property_key(key);
        let url = self.api(&format!("web/AllProperties?$select={}", encoded));
        let properties: HashMap<String, serde_json::Value> = self.get(&url).await?.json().await?;
        Ok(properties
            .get(&encoded)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }

    async fn set_property_bag_value(&self, key: &str, value: &str) -> Result<()> {
        // REST 無法寫入 AllProperties，改用 client.svc
        let url = format!("{}/_vti_bin/client.svc/ProcessQuery", self.site_url);
        let request = build_set_property_request(&self.application_name, key, value);

        tracing::debug!("POST {} (SetFieldValue {})", url, key);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/xml")
            .header("X-RequestDigest", &self.digest)
            .body(request)
            .send()
            .await?;
        let response = odata::check(&url, response).await?;

        let results: Vec<serde_json::Value> = response.json().await?;
        let error = results
            .first()
            .and_then(|r| r.get("ErrorInfo"))
            .filter(|e| !e.is_null());
        if let Some(error) = error {
            return Err(DeployError::SharePointError {
                url,
                status: 200,
                message: error
                    .get("ErrorMessage")
                    .and_then(|m| m.as_str())
                    .unwrap_or("ProcessQuery failed")
                    .to_string(),
            });
        }
        Ok(())
    }
}

pub fn build_set_property_request(application_name: &str, key: &str, value: &str) -> String {
    format!(
        concat!(
            r#"<Request xmlns="http://schemas.microsoft.com/sharepoint/clientquery/2009" SchemaVersion="15.0.0.0" LibraryVersion="16.0.0.0" ApplicationName="{app}">"#,
            r#"<Actions>"#,
            r#"<Method Name="SetFieldValue" Id="1" ObjectPathId="3"><Parameters>"#,
            r#"<Parameter Type="String">{key}</Parameter><Parameter Type="String">{value}</Parameter>"#,
            r#"</Parameters></Method>"#,
            r#"<Method Name="Update" Id="2" ObjectPathId="1" />"#,
            r#"</Actions>"#,
            r#"<ObjectPaths>"#,
            r#"<StaticProperty Id="0" TypeId="{type_id}" Name="Current" />"#,
            r#"<Property Id="1" ParentId="0" Name="Web" />"#,
            r#"<Property Id="3" ParentId="1" Name="AllProperties" />"#,
            r#"</ObjectPaths>"#,
            r#"</Request>"#
        ),
        app = escape(application_name),
        key = escape(key),
        value = escape(value),
        type_id = CLIENT_QUERY_TYPE_ID,
    )
}
