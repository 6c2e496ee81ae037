//! REST 回應格式（odata=nometadata）

use crate::utils::error::{DeployError, Result};
use serde::Deserialize;

pub const JSON_NO_METADATA: &str = "application/json;odata=nometadata";

#[derive(Debug, Deserialize)]
pub struct ValueList<T> {
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContextInfo {
    pub form_digest_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebResponse {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NavigationNodeResponse {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_external: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileItem {
    #[serde(default)]
    pub file: Option<FileResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileResponse {
    pub name: String,
    pub server_relative_url: String,
}

/// 非 2xx 回應轉成 SharePointError
pub async fn check(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    });
    Err(DeployError::SharePointError {
        url: url.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// 支援 `{"odata.error": …}` 與 `{"error": …}` 兩種錯誤格式
pub fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = json.get("odata.error").or_else(|| json.get("error"))?;
    let message = error.get("message")?;
    match message {
        serde_json::Value::String(s) => Some(s.clone()),
        other => other.get("value")?.as_str().map(|s| s.to_string()),
    }
}

/// OData 字串常值中的單引號要重複
pub fn literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// AllProperties 回應中的屬性名稱編碼，例如 `_` → `_x005f_`
pub fn encode_property_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_ascii_alphanumeric() {
            encoded.push(c);
        } else {
            encoded.push_str(&format!("_x{:04x}_", c as u32));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_property_key() {
        assert_eq!(
            encode_property_key("_PnP_ProvisioningTemplateId"),
            "_x005f_PnP_x005f_ProvisioningTemplateId"
        );
        assert_eq!(encode_property_key("vti.x y"), "vti_x002e_x_x0020_y");
    }

    #[test]
    fn test_error_message_formats() {
        let light = r#"{"odata.error":{"code":"-1, System.ArgumentException","message":{"lang":"en-US","value":"List 'GlobalNavSites' does not exist."}}}"#;
        assert_eq!(
            error_message(light).as_deref(),
            Some("List 'GlobalNavSites' does not exist.")
        );

        let plain = r#"{"error":{"code":"accessDenied","message":"Access denied."}}"#;
        assert_eq!(error_message(plain).as_deref(), Some("Access denied."));

        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn test_literal_doubles_quotes() {
        assert_eq!(literal("Bob's Sites"), "Bob''s Sites");
    }

    #[test]
    fn test_file_item_without_file() {
        let items: ValueList<FileItem> =
            serde_json::from_str(r#"{"value":[{"File":null},{"File":{"Name":"GlobalNav.xml","ServerRelativeUrl":"/sites/infra/ProvisioningTemplates/GlobalNav.xml"}}]}"#)
                .unwrap();
        assert!(items.value[0].file.is_none());
        assert_eq!(items.value[1].file.as_ref().unwrap().name, "GlobalNav.xml");
    }
}
