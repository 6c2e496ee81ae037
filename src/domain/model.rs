use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 要套用全域導覽的網站集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteReference {
    pub title: String,
    pub url: String,
}

impl SiteReference {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebInfo {
    pub title: String,
    pub url: String,
}

/// One row of a SharePoint list, field name to raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub fields: HashMap<String, serde_json::Value>,
}

impl ListItem {
    /// 欄位的字串值；URL 欄位取其中的 Url
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            serde_json::Value::Object(obj) => obj
                .get("Url")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            _ => None,
        }
    }

    /// 布林欄位；REST 可能回傳 true/false、0/1 或 "Yes"/"No"
    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.fields.get(field)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::Number(n) => n.as_i64().map(|v| v != 0),
            serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub name: String,
    pub server_relative_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationKind {
    /// 頂端導覽列（全域導覽）
    TopNavigationBar,
    /// 快速啟動（目前導覽）
    QuickLaunch,
}

impl NavigationKind {
    pub fn collection_name(&self) -> &'static str {
        match self {
            NavigationKind::TopNavigationBar => "TopNavigationBar",
            NavigationKind::QuickLaunch => "QuickLaunch",
        }
    }
}

/// A navigation node as it exists on a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingNode {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub is_external: bool,
}

/// Server-side list filter: `field == value` on a boolean column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: Option<(String, bool)>,
}

impl ListQuery {
    pub fn boolean_eq(field: impl Into<String>, value: bool) -> Self {
        Self {
            filter: Some((field.into(), value)),
        }
    }

    /// CAML ViewXml
    pub fn to_view_xml(&self) -> String {
        let mut xml = String::from("<View>");
        if let Some((field, value)) = &self.filter {
            xml.push_str(&format!(
                "<Query><Where><Eq><FieldRef Name='{}'/><Value Type='Boolean'>{}</Value></Eq></Where></Query>",
                quick_xml::escape::escape(field.as_str()),
                if *value { 1 } else { 0 }
            ));
        }
        xml.push_str("</View>");
        xml
    }

    /// Evaluate the filter the way the server would.
    pub fn matches(&self, item: &ListItem) -> bool {
        match &self.filter {
            Some((field, value)) => item.flag(field) == Some(*value),
            None => true,
        }
    }
}

/// 單一網站的套用結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub nodes_removed: usize,
    pub nodes_added: usize,
    pub template_id: String,
    pub template_info: String,
}

#[derive(Debug, Clone)]
pub struct SiteOutcome {
    pub template_name: String,
    pub site: SiteReference,
    pub result: std::result::Result<ApplyOutcome, String>,
}

/// 所有範本、所有網站的彙總
#[derive(Debug, Clone, Default)]
pub struct DeploymentReport {
    pub outcomes: Vec<SiteOutcome>,
}

impl DeploymentReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SiteOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(pairs: &[(&str, serde_json::Value)]) -> ListItem {
        ListItem {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_view_xml_for_deploy_flag() {
        let query = ListQuery::boolean_eq("Deploy_x0020_Navigation", true);
        assert_eq!(
            query.to_view_xml(),
            "<View><Query><Where><Eq><FieldRef Name='Deploy_x0020_Navigation'/><Value Type='Boolean'>1</Value></Eq></Where></Query></View>"
        );
    }

    #[test]
    fn test_query_matches_flag_variants() {
        let query = ListQuery::boolean_eq("Deploy", true);
        assert!(query.matches(&item(&[("Deploy", json!(true))])));
        assert!(query.matches(&item(&[("Deploy", json!(1))])));
        assert!(query.matches(&item(&[("Deploy", json!("Yes"))])));
        assert!(!query.matches(&item(&[("Deploy", json!(false))])));
        assert!(!query.matches(&item(&[("Other", json!(true))])));
    }

    #[test]
    fn test_text_reads_url_field_value() {
        let row = item(&[(
            "Site_x0020_Collection_x0020_URL",
            json!({"Url": "https://x/a", "Description": "A"}),
        )]);
        assert_eq!(
            row.text("Site_x0020_Collection_x0020_URL").as_deref(),
            Some("https://x/a")
        );
        assert_eq!(row.text("Title"), None);
    }

    #[test]
    fn test_report_counts() {
        let site = SiteReference::new("A", "https://x/a");
        let report = DeploymentReport {
            outcomes: vec![
                SiteOutcome {
                    template_name: "GlobalNav.xml".to_string(),
                    site: site.clone(),
                    result: Ok(ApplyOutcome {
                        nodes_removed: 1,
                        nodes_added: 2,
                        template_id: "T".to_string(),
                        template_info: "{}".to_string(),
                    }),
                },
                SiteOutcome {
                    template_name: "GlobalNav.xml".to_string(),
                    site,
                    result: Err("boom".to_string()),
                },
            ],
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures().count(), 1);
    }
}
