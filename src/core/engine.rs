//! 佈建引擎：擷取與套用導覽
//!
//! 建立在 [`SiteSession`] 的基本操作上，不直接碰 HTTP。

use crate::core::{Progress, SiteSession};
use crate::domain::model::{ApplyOutcome, ExistingNode, NavigationKind};
use crate::domain::template::{
    Navigation, NavigationNode, NavigationSection, NavigationType, ProvisioningTemplate,
};
use crate::utils::error::{DeployError, Result};
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

pub const TEMPLATE_ID_PROPERTY: &str = "_PnP_ProvisioningTemplateId";
pub const TEMPLATE_INFO_PROPERTY: &str = "_PnP_ProvisioningTemplateInfo";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy)]
pub struct ApplyingInformation {
    /// 先刪除現有導覽節點再新增
    pub clear_navigation: bool,
}

impl Default for ApplyingInformation {
    fn default() -> Self {
        Self {
            clear_navigation: true,
        }
    }
}

/// 網站 URL 權杖：`{site}`、`{sitecollection}`、`{siteurl}`（不分大小寫）
pub struct TokenParser {
    site_url: String,
    site_path: Option<String>,
    pattern: Regex,
}

impl TokenParser {
    pub fn new(site_url: &str) -> Result<Self> {
        let pattern = Regex::new(r"(?i)\{(?:site|sitecollection|siteurl)\}").map_err(|e| {
            DeployError::TemplateError {
                message: e.to_string(),
            }
        })?;
        let site_url = site_url.trim_end_matches('/').to_string();
        // 根網站的路徑是 "/"，不能拿來比對相對 URL
        let site_path = url::Url::parse(&site_url)
            .ok()
            .map(|u| u.path().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());
        Ok(Self {
            site_url,
            site_path,
            pattern,
        })
    }

    /// Replaces site tokens with the absolute URL of the site.
    pub fn resolve(&self, value: &str) -> String {
        self.pattern
            .replace_all(value, NoExpand(self.site_url.as_str()))
            .into_owned()
    }

    /// Rewrites URLs under the site, absolute or server-relative, as `{site}…`.
    pub fn tokenize(&self, value: &str) -> String {
        let prefixes = std::iter::once(self.site_url.as_str()).chain(self.site_path.as_deref());
        for prefix in prefixes {
            if let Some(rest) = strip_url_prefix(value, prefix) {
                return format!("{{site}}{}", rest);
            }
        }
        value.to_string()
    }
}

fn strip_url_prefix<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &value[prefix.len()..];
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateInfo<'a> {
    template_id: &'a str,
    template_version: &'a str,
    template_site_policy: Option<&'a str>,
    result: bool,
    provisioning_time: String,
}

/// Captures global (top navigation bar) and current (quick launch) navigation.
pub async fn extract_navigation_template<S: SiteSession + ?Sized>(
    session: &S,
    site_url: &str,
    template_id: &str,
    progress: Progress<'_>,
) -> Result<ProvisioningTemplate> {
    progress("Navigation", 1, 1);

    let tokens = TokenParser::new(site_url)?;
    let global = read_tree(session, &tokens, NavigationKind::TopNavigationBar, None).await?;
    let current = read_tree(session, &tokens, NavigationKind::QuickLaunch, None).await?;

    let mut template = ProvisioningTemplate::new(template_id);
    // 兩邊都沒有節點時不輸出 Navigation 元素
    if !global.is_empty() || !current.is_empty() {
        template.navigation = Some(Navigation {
            global: Some(NavigationSection::structural(global)),
            current: Some(NavigationSection::structural(current)),
        });
    }

    tracing::debug!(
        "Captured {} navigation node(s) into {}",
        template.node_count(),
        template_id
    );
    Ok(template)
}

fn read_tree<'a, S: SiteSession + ?Sized>(
    session: &'a S,
    tokens: &'a TokenParser,
    kind: NavigationKind,
    parent: Option<i64>,
) -> BoxFuture<'a, Result<Vec<NavigationNode>>> {
    Box::pin(async move {
        let mut nodes = Vec::new();
        for existing in session.navigation_nodes(kind, parent).await? {
            let children = read_tree(session, tokens, kind, Some(existing.id)).await?;
            nodes.push(NavigationNode {
                title: existing.title,
                url: tokens.tokenize(&existing.url),
                is_external: existing.is_external,
                children,
            });
        }
        Ok(nodes)
    })
}

/// Applies the template's navigation and records the tracking properties.
pub async fn apply_template<S: SiteSession + ?Sized>(
    session: &S,
    site_url: &str,
    template: &ProvisioningTemplate,
    info: &ApplyingInformation,
    progress: Progress<'_>,
) -> Result<ApplyOutcome> {
    const TOTAL: usize = 2;
    let mut nodes_removed = 0;
    let mut nodes_added = 0;

    progress("Navigation", 1, TOTAL);
    let tokens = TokenParser::new(site_url)?;
    if let Some(navigation) = &template.navigation {
        let sections = [
            (NavigationKind::TopNavigationBar, navigation.global.as_ref()),
            (NavigationKind::QuickLaunch, navigation.current.as_ref()),
        ];
        for (kind, section) in sections {
            let Some(section) = section else { continue };
            if section.navigation_type != NavigationType::Structural {
                tracing::warn!(
                    "⚠️ Template {} {} navigation is {}, only Structural navigation is applied; section ignored",
                    template.id,
                    kind.collection_name(),
                    section.navigation_type.as_str()
                );
                continue;
            }

            let clear = info.clear_navigation || section.remove_existing_nodes;
            if clear {
                nodes_removed += clear_nodes(session, kind).await?;
            }
            nodes_added +=
                add_nodes(session, &tokens, kind, None, &section.nodes, !clear).await?;
        }
    } else {
        tracing::warn!("Template {} has no navigation to apply", template.id);
    }

    progress("Tracking properties", 2, TOTAL);
    let template_info = serde_json::to_string(&TemplateInfo {
        template_id: &template.id,
        template_version: &template.version,
        template_site_policy: None,
        result: true,
        provisioning_time: chrono::Utc::now().to_rfc3339(),
    })?;
    session
        .set_property_bag_value(TEMPLATE_ID_PROPERTY, &template.id)
        .await?;
    session
        .set_property_bag_value(TEMPLATE_INFO_PROPERTY, &template_info)
        .await?;

    Ok(ApplyOutcome {
        nodes_removed,
        nodes_added,
        template_id: template.id.clone(),
        template_info,
    })
}

/// 刪除最上層節點（子節點會一起刪除）
async fn clear_nodes<S: SiteSession + ?Sized>(session: &S, kind: NavigationKind) -> Result<usize> {
    let existing = session.navigation_nodes(kind, None).await?;
    for node in &existing {
        tracing::debug!("Removing {} node '{}'", kind.collection_name(), node.title);
        session.delete_navigation_node(node.id).await?;
    }
    Ok(existing.len())
}

fn add_nodes<'a, S: SiteSession + ?Sized>(
    session: &'a S,
    tokens: &'a TokenParser,
    kind: NavigationKind,
    parent: Option<i64>,
    nodes: &'a [NavigationNode],
    reuse_existing: bool,
) -> BoxFuture<'a, Result<usize>> {
    Box::pin(async move {
        let existing: Vec<ExistingNode> = if reuse_existing {
            session.navigation_nodes(kind, parent).await?
        } else {
            Vec::new()
        };

        let mut added = 0;
        for node in nodes {
            let url = tokens.resolve(&node.url);
            let matched = existing
                .iter()
                .find(|e| e.title == node.title && e.url == url)
                .map(|e| e.id);
            let id = match matched {
                Some(id) => id,
                None => {
                    added += 1;
                    let resolved = NavigationNode {
                        title: node.title.clone(),
                        url,
                        is_external: node.is_external,
                        children: Vec::new(),
                    };
                    session.add_navigation_node(kind, parent, &resolved).await?
                }
            };
            // 新建立的節點沒有子節點，不需要查詢
            added += add_nodes(
                session,
                tokens,
                kind,
                Some(id),
                &node.children,
                matched.is_some(),
            )
            .await?;
        }
        Ok(added)
    })
}
