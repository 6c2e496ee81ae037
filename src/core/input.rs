//! 互動式輸入
//!
//! 依序詢問五個值，不做任何格式驗證。

use crate::core::Prompter;
use crate::domain::credentials::{Credentials, SecureString};
use crate::utils::error::Result;

pub const TEMPLATE_SITE_PROMPT: &str = "Enter the URL of the Infrastructure template site: ";
pub const TARGET_SITE_PROMPT: &str = "Enter the URL of the target site: ";
pub const INFRASTRUCTURE_SITE_PROMPT: &str = "Enter the URL of the Infrastructure site with list: ";
pub const USERNAME_PROMPT: &str = "Enter your user name:";
pub const PASSWORD_PROMPT: &str = "Enter your password:";

#[derive(Debug)]
pub struct DeploymentInputs {
    pub template_site_url: String,
    /// 收集但後續流程不使用
    pub target_site_url: String,
    pub infrastructure_url: String,
    pub credentials: Credentials,
}

pub fn collect_inputs<P: Prompter + ?Sized>(prompter: &P) -> Result<DeploymentInputs> {
    let template_site_url = prompter.read_line(TEMPLATE_SITE_PROMPT)?;
    let target_site_url = prompter.read_line(TARGET_SITE_PROMPT)?;
    let infrastructure_url = prompter.read_line(INFRASTRUCTURE_SITE_PROMPT)?;
    let username = prompter.read_line(USERNAME_PROMPT)?;
    let password = prompter.read_secret(PASSWORD_PROMPT)?;

    Ok(DeploymentInputs {
        template_site_url,
        target_site_url,
        infrastructure_url,
        credentials: Credentials::new(username, password),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Cancel,
    Other,
}

/// What the terminal should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Echo(char),
    Erase,
    Ignored,
    Done,
    Cancelled,
}

/// Key-by-key line input with backspace and optional masking.
pub struct LineEditor {
    masked: bool,
    value: SecureString,
}

impl LineEditor {
    pub fn new(masked: bool) -> Self {
        Self {
            masked,
            value: SecureString::new(),
        }
    }

    pub fn handle(&mut self, key: Key) -> EditOutcome {
        match key {
            Key::Enter => EditOutcome::Done,
            Key::Cancel => EditOutcome::Cancelled,
            Key::Backspace => match self.value.pop() {
                Some(_) => EditOutcome::Erase,
                None => EditOutcome::Ignored,
            },
            Key::Char(c) if !c.is_control() => {
                self.value.push(c);
                EditOutcome::Echo(if self.masked { '*' } else { c })
            }
            _ => EditOutcome::Ignored,
        }
    }

    pub fn into_secret(self) -> SecureString {
        self.value
    }

    pub fn into_string(self) -> String {
        self.value.expose().to_string()
    }
}
