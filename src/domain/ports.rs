use crate::domain::credentials::{Credentials, SecureString};
use crate::domain::model::{
    ExistingNode, ListItem, ListQuery, NavigationKind, TemplateFile, WebInfo,
};
use crate::domain::template::NavigationNode;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 進度回呼：(訊息, 目前步驟, 總步驟)
pub type Progress<'a> = &'a (dyn Fn(&str, usize, usize) + Send + Sync);

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 給使用者看的完整路徑
    fn location(&self, path: &str) -> String;
}

/// Opens an authenticated session against one site.
#[async_trait]
pub trait SiteConnector: Send + Sync {
    type Session: SiteSession;

    async fn connect(&self, site_url: &str, credentials: &Credentials) -> Result<Self::Session>;
}

/// Remote operations on a single site. Dropping the session releases it.
#[async_trait]
pub trait SiteSession: Send + Sync {
    async fn web_info(&self) -> Result<WebInfo>;

    async fn query_list_items(&self, list_title: &str, query: &ListQuery) -> Result<Vec<ListItem>>;

    async fn list_library_files(&self, library: &str, row_limit: usize) -> Result<Vec<TemplateFile>>;

    async fn read_file(&self, server_relative_url: &str) -> Result<Vec<u8>>;

    /// `parent` 為 None 時回傳最上層節點
    async fn navigation_nodes(
        &self,
        kind: NavigationKind,
        parent: Option<i64>,
    ) -> Result<Vec<ExistingNode>>;

    async fn delete_navigation_node(&self, id: i64) -> Result<()>;

    /// Creates a node (without its children) and returns the new id.
    async fn add_navigation_node(
        &self,
        kind: NavigationKind,
        parent: Option<i64>,
        node: &NavigationNode,
    ) -> Result<i64>;

    async fn property_bag_value(&self, key: &str) -> Result<Option<String>>;

    async fn set_property_bag_value(&self, key: &str, value: &str) -> Result<()>;
}

/// 主控台輸入
pub trait Prompter {
    fn read_line(&self, label: &str) -> Result<String>;
    fn read_secret(&self, label: &str) -> Result<SecureString>;
    fn pause(&self, message: &str) -> Result<()>;
}

impl<T: Prompter + ?Sized> Prompter for &T {
    fn read_line(&self, label: &str) -> Result<String> {
        (**self).read_line(label)
    }

    fn read_secret(&self, label: &str) -> Result<SecureString> {
        (**self).read_secret(label)
    }

    fn pause(&self, message: &str) -> Result<()> {
        (**self).pause(message)
    }
}
