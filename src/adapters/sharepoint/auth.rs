//! SharePoint Online 的 claims 登入流程
//!
//! 1. 以 SAML RequestSecurityToken 向 STS 取得 BinarySecurityToken
//! 2. 將 token 送到 `/_forms/default.aspx?wa=wsignin1.0` 換取 FedAuth/rtFa cookie
//! 3. 從 `/_api/contextinfo` 取得寫入用的 form digest

use crate::adapters::sharepoint::odata::{self, ContextInfo};
use crate::domain::credentials::{Credentials, SecureString};
use crate::utils::error::{DeployError, Result};
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

const SIGN_IN_PATH: &str = "/_forms/default.aspx?wa=wsignin1.0";
const AUTH_COOKIE: &str = "FedAuth";

pub struct SpoAuthenticator<'a> {
    client: &'a Client,
    sts_endpoint: &'a str,
}

impl<'a> SpoAuthenticator<'a> {
    pub fn new(client: &'a Client, sts_endpoint: &'a str) -> Self {
        Self {
            client,
            sts_endpoint,
        }
    }

    /// Signs in and leaves the auth cookies in the client's cookie jar.
    pub async fn sign_in(&self, site: &Url, credentials: &Credentials) -> Result<()> {
        let sign_in_url = format!("{}{}", site.origin().ascii_serialization(), SIGN_IN_PATH);
        let token = self.request_security_token(site, &sign_in_url, credentials).await?;

        tracing::debug!("Submitting security token to {}", sign_in_url);
        let response = self
            .client
            .post(&sign_in_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(token)
            .send()
            .await?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(DeployError::AuthenticationError {
                site: site.to_string(),
                message: format!("sign-in endpoint returned {}", status),
            });
        }
        if !response.cookies().any(|c| c.name() == AUTH_COOKIE) {
            return Err(DeployError::AuthenticationError {
                site: site.to_string(),
                message: format!("sign-in response did not set the {} cookie", AUTH_COOKIE),
            });
        }

        Ok(())
    }

    async fn request_security_token(
        &self,
        site: &Url,
        sign_in_url: &str,
        credentials: &Credentials,
    ) -> Result<String> {
        tracing::debug!(
            "Requesting security token for {} from {}",
            credentials.username,
            self.sts_endpoint
        );
        let envelope = build_token_request(
            &credentials.username,
            credentials.password.expose(),
            self.sts_endpoint,
            sign_in_url,
        );

        // 請求本體與 envelope 共用同一塊緩衝區，最後一個參考釋放時清零
        let envelope = Bytes::from_owner(envelope);
        let response = self
            .client
            .post(self.sts_endpoint)
            .header(CONTENT_TYPE, "application/soap+xml; charset=utf-8")
            .body(envelope.clone())
            .send()
            .await;
        drop(envelope);
        let body = response?.text().await?;

        match parse_security_token(&body)? {
            TokenResponse::Token(token) => Ok(token),
            TokenResponse::Fault(reason) => Err(DeployError::AuthenticationError {
                site: site.to_string(),
                message: reason,
            }),
        }
    }

    pub async fn form_digest(&self, site_url: &str) -> Result<String> {
        let url = format!("{}/_api/contextinfo", site_url);
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, odata::JSON_NO_METADATA)
            .header(CONTENT_TYPE, odata::JSON_NO_METADATA)
            .body("")
            .send()
            .await?;
        let response = odata::check(&url, response).await?;
        let info: ContextInfo = response.json().await?;
        Ok(info.form_digest_value)
    }
}

const ENVELOPE_HEADER: &str = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://www.w3.org/2005/08/addressing" xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
  <s:Header>
    <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/02/trust/RST/Issue</a:Action>
    <a:ReplyTo><a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address></a:ReplyTo>
    <a:To s:mustUnderstand="1">"#;

const USERNAME_OPEN: &str = r#"</a:To>
    <o:Security s:mustUnderstand="1" xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <o:UsernameToken><o:Username>"#;

const PASSWORD_OPEN: &str = "</o:Username><o:Password>";

const APPLIES_TO_OPEN: &str = r#"</o:Password></o:UsernameToken>
    </o:Security>
  </s:Header>
  <s:Body>
    <t:RequestSecurityToken xmlns:t="http://schemas.xmlsoap.org/ws/2005/02/trust">
      <wsp:AppliesTo xmlns:wsp="http://schemas.xmlsoap.org/ws/2004/09/policy"><a:EndpointReference><a:Address>"#;

const ENVELOPE_FOOTER: &str = r#"</a:Address></a:EndpointReference></wsp:AppliesTo>
      <t:KeyType>http://schemas.xmlsoap.org/ws/2005/05/identity/NoProofKey</t:KeyType>
      <t:RequestType>http://schemas.xmlsoap.org/ws/2005/02/trust/Issue</t:RequestType>
      <t:TokenType>urn:oasis:names:tc:SAML:1.0:assertion</t:TokenType>
    </t:RequestSecurityToken>
  </s:Body>
</s:Envelope>"#;

/// 組出 RequestSecurityToken envelope
///
/// 密碼直接跳脫寫入 `SecureString`，envelope 釋放時整塊清零。
pub fn build_token_request(
    username: &str,
    password: &str,
    sts_endpoint: &str,
    applies_to: &str,
) -> SecureString {
    let parts = [
        (ENVELOPE_HEADER, sts_endpoint),
        (USERNAME_OPEN, username),
        (PASSWORD_OPEN, password),
        (APPLIES_TO_OPEN, applies_to),
    ];
    let capacity = parts
        .iter()
        .map(|(literal, value)| literal.len() + value.len() * 6)
        .sum::<usize>()
        + ENVELOPE_FOOTER.len();

    let mut envelope = SecureString::with_capacity(capacity);
    for (literal, value) in parts {
        envelope.push_str(literal);
        envelope.push_xml_escaped(value);
    }
    envelope.push_str(ENVELOPE_FOOTER);
    envelope
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenResponse {
    Token(String),
    Fault(String),
}

/// 取出 BinarySecurityToken；失敗時回傳 Fault 中的第一段說明文字
pub fn parse_security_token(body: &str) -> Result<TokenResponse> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut capture: Option<&'static str> = None;
    let mut fault: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                capture = match e.local_name().as_ref() {
                    b"BinarySecurityToken" => Some("token"),
                    b"Text" | b"text" if fault.is_none() => Some("fault"),
                    _ => None,
                };
            }
            Event::Text(t) => match capture.take() {
                Some("token") => return Ok(TokenResponse::Token(t.unescape()?.into_owned())),
                Some("fault") => fault = Some(t.unescape()?.into_owned()),
                _ => {}
            },
            Event::End(_) => capture = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(TokenResponse::Fault(fault.unwrap_or_else(|| {
        "STS response did not contain a security token".to_string()
    })))
}
