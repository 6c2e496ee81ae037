#![allow(dead_code)]

use async_trait::async_trait;
use global_nav_deploy::core::{Prompter, SiteConnector, SiteSession};
use global_nav_deploy::domain::model::{
    ExistingNode, ListItem, ListQuery, NavigationKind, TemplateFile, WebInfo,
};
use global_nav_deploy::domain::template::NavigationNode;
use global_nav_deploy::{Credentials, DeployError, Result, SecureString};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "P@ssw0rd";

#[derive(Debug, Clone)]
struct FakeNode {
    id: i64,
    parent: Option<i64>,
    kind: NavigationKind,
    title: String,
    url: String,
    is_external: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub title: String,
    lists: HashMap<String, Vec<ListItem>>,
    library: HashMap<String, Vec<(TemplateFile, Vec<u8>)>>,
    nodes: Vec<FakeNode>,
    properties: HashMap<String, String>,
    fail_writes: bool,
}

impl FakeSite {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_list(mut self, name: &str, rows: Vec<ListItem>) -> Self {
        self.lists.insert(name.to_string(), rows);
        self
    }

    pub fn with_file(mut self, library: &str, name: &str, content: &str) -> Self {
        let file = TemplateFile {
            name: name.to_string(),
            server_relative_url: format!("/sites/infra/{}/{}", library, name),
        };
        self.library
            .entry(library.to_string())
            .or_default()
            .push((file, content.as_bytes().to_vec()));
        self
    }

    /// 所有寫入操作都回傳 500
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

#[derive(Default)]
struct FakeState {
    sites: HashMap<String, FakeSite>,
    calls: Vec<String>,
    next_id: i64,
}

/// In-memory SharePoint that records every call.
#[derive(Clone, Default)]
pub struct FakeSharePoint {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSharePoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_site(&self, url: &str, site: FakeSite) {
        self.state.lock().unwrap().sites.insert(url.to_string(), site);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn seed_navigation(&self, url: &str, kind: NavigationKind, nodes: &[NavigationNode]) {
        let mut state = self.state.lock().unwrap();
        for node in nodes {
            insert_tree(&mut state, url, kind, None, node);
        }
    }

    pub fn navigation(&self, url: &str, kind: NavigationKind) -> Vec<NavigationNode> {
        let state = self.state.lock().unwrap();
        let site = &state.sites[url];
        build_tree(site, kind, None)
    }

    pub fn property(&self, url: &str, key: &str) -> Option<String> {
        self.state.lock().unwrap().sites[url].properties.get(key).cloned()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn insert_tree(
    state: &mut FakeState,
    url: &str,
    kind: NavigationKind,
    parent: Option<i64>,
    node: &NavigationNode,
) {
    state.next_id += 1;
    let id = state.next_id;
    state.sites.get_mut(url).unwrap().nodes.push(FakeNode {
        id,
        parent,
        kind,
        title: node.title.clone(),
        url: node.url.clone(),
        is_external: node.is_external,
    });
    for child in &node.children {
        insert_tree(state, url, kind, Some(id), child);
    }
}

fn build_tree(site: &FakeSite, kind: NavigationKind, parent: Option<i64>) -> Vec<NavigationNode> {
    site.nodes
        .iter()
        .filter(|n| n.kind == kind && n.parent == parent)
        .map(|n| NavigationNode {
            title: n.title.clone(),
            url: n.url.clone(),
            is_external: n.is_external,
            children: build_tree(site, kind, Some(n.id)),
        })
        .collect()
}

#[async_trait]
impl SiteConnector for FakeSharePoint {
    type Session = FakeSession;

    async fn connect(&self, site_url: &str, credentials: &Credentials) -> Result<FakeSession> {
        self.record(format!("connect {}", site_url));
        let known = self.state.lock().unwrap().sites.contains_key(site_url);
        if !known || credentials.password.expose() != PASSWORD {
            return Err(DeployError::AuthenticationError {
                site: site_url.to_string(),
                message: "Authentication Failure".to_string(),
            });
        }
        Ok(FakeSession {
            fake: self.clone(),
            url: site_url.to_string(),
        })
    }
}

pub struct FakeSession {
    fake: FakeSharePoint,
    url: String,
}

impl FakeSession {
    fn with_site<T>(&self, f: impl FnOnce(&mut FakeSite) -> T) -> T {
        let mut state = self.fake.state.lock().unwrap();
        f(state.sites.get_mut(&self.url).unwrap())
    }

    fn check_writable(&self, operation: &str) -> Result<()> {
        if self.with_site(|site| site.fail_writes) {
            return Err(DeployError::SharePointError {
                url: format!("{}/_api/{}", self.url, operation),
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SiteSession for FakeSession {
    async fn web_info(&self) -> Result<WebInfo> {
        self.fake.record(format!("web_info {}", self.url));
        Ok(WebInfo {
            title: self.with_site(|site| site.title.clone()),
            url: self.url.clone(),
        })
    }

    async fn query_list_items(&self, list_title: &str, query: &ListQuery) -> Result<Vec<ListItem>> {
        self.fake
            .record(format!("query {} {}", list_title, query.to_view_xml()));
        self.with_site(|site| match site.lists.get(list_title) {
            Some(rows) => Ok(rows.iter().filter(|r| query.matches(r)).cloned().collect()),
            None => Err(DeployError::SharePointError {
                url: format!("{}/_api/web/lists/GetByTitle('{}')", self.url, list_title),
                status: 404,
                message: format!("List '{}' does not exist.", list_title),
            }),
        })
    }

    async fn list_library_files(&self, library: &str, row_limit: usize) -> Result<Vec<TemplateFile>> {
        self.fake.record(format!("list_files {}", library));
        Ok(self.with_site(|site| {
            site.library
                .get(library)
                .map(|files| files.iter().take(row_limit).map(|(f, _)| f.clone()).collect())
                .unwrap_or_default()
        }))
    }

    async fn read_file(&self, server_relative_url: &str) -> Result<Vec<u8>> {
        self.fake.record(format!("read_file {}", server_relative_url));
        self.with_site(|site| {
            site.library
                .values()
                .flatten()
                .find(|(f, _)| f.server_relative_url == server_relative_url)
                .map(|(_, data)| data.clone())
                .ok_or_else(|| DeployError::SharePointError {
                    url: server_relative_url.to_string(),
                    status: 404,
                    message: "File Not Found.".to_string(),
                })
        })
    }

    async fn navigation_nodes(
        &self,
        kind: NavigationKind,
        parent: Option<i64>,
    ) -> Result<Vec<ExistingNode>> {
        Ok(self.with_site(|site| {
            site.nodes
                .iter()
                .filter(|n| n.kind == kind && n.parent == parent)
                .map(|n| ExistingNode {
                    id: n.id,
                    title: n.title.clone(),
                    url: n.url.clone(),
                    is_external: n.is_external,
                })
                .collect()
        }))
    }

    async fn delete_navigation_node(&self, id: i64) -> Result<()> {
        self.check_writable("delete")?;
        let title = self.with_site(|site| {
            let title = site
                .nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.title.clone())
                .unwrap_or_default();
            // 連同子節點一起刪除
            let mut doomed = vec![id];
            let mut i = 0;
            while i < doomed.len() {
                let current = doomed[i];
                doomed.extend(
                    site.nodes
                        .iter()
                        .filter(|n| n.parent == Some(current))
                        .map(|n| n.id),
                );
                i += 1;
            }
            site.nodes.retain(|n| !doomed.contains(&n.id));
            title
        });
        self.fake.record(format!("delete {} {}", self.url, title));
        Ok(())
    }

    async fn add_navigation_node(
        &self,
        kind: NavigationKind,
        parent: Option<i64>,
        node: &NavigationNode,
    ) -> Result<i64> {
        self.check_writable("add")?;
        let id = {
            let mut state = self.fake.state.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.sites.get_mut(&self.url).unwrap().nodes.push(FakeNode {
                id,
                parent,
                kind,
                title: node.title.clone(),
                url: node.url.clone(),
                is_external: node.is_external,
            });
            id
        };
        self.fake.record(format!("add {} {}", self.url, node.title));
        Ok(id)
    }

    async fn property_bag_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.with_site(|site| site.properties.get(key).cloned()))
    }

    async fn set_property_bag_value(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable("property")?;
        self.with_site(|site| {
            site.properties.insert(key.to_string(), value.to_string());
        });
        self.fake.record(format!("set_property {} {}", self.url, key));
        Ok(())
    }
}

pub fn site_row(title: &str, deploy: bool, url: &str) -> ListItem {
    let mut fields = HashMap::new();
    fields.insert("Title".to_string(), serde_json::json!(title));
    fields.insert("Deploy_x0020_Navigation".to_string(), serde_json::json!(deploy));
    fields.insert(
        "Site_x0020_Collection_x0020_URL".to_string(),
        serde_json::json!({ "Url": url, "Description": title }),
    );
    ListItem { fields }
}

pub fn credentials() -> Credentials {
    Credentials::new("admin@contoso.com", SecureString::from(PASSWORD))
}

/// Answers prompts from a script and records pauses.
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    pub pauses: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|s| s.to_string()).collect()),
            pauses: RefCell::new(Vec::new()),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&self, _label: &str) -> Result<String> {
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| DeployError::InputError {
                message: "no scripted answer left".to_string(),
            })
    }

    fn read_secret(&self, label: &str) -> Result<SecureString> {
        let value = self.read_line(label)?;
        Ok(SecureString::from(value.as_str()))
    }

    fn pause(&self, message: &str) -> Result<()> {
        self.pauses.borrow_mut().push(message.to_string());
        Ok(())
    }
}
