//! 佈建範本（只建模導覽部分）

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningTemplate {
    pub id: String,
    pub version: String,
    pub navigation: Option<Navigation>,
}

impl ProvisioningTemplate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: "1".to_string(),
            navigation: None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.navigation
            .as_ref()
            .map(|nav| {
                nav.global.as_ref().map(NavigationSection::node_count).unwrap_or(0)
                    + nav.current.as_ref().map(NavigationSection::node_count).unwrap_or(0)
            })
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    pub global: Option<NavigationSection>,
    pub current: Option<NavigationSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    Structural,
    Inherit,
    Managed,
}

impl NavigationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationType::Structural => "Structural",
            NavigationType::Inherit => "Inherit",
            NavigationType::Managed => "Managed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Structural" => Some(NavigationType::Structural),
            "Inherit" => Some(NavigationType::Inherit),
            "Managed" => Some(NavigationType::Managed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSection {
    pub navigation_type: NavigationType,
    pub remove_existing_nodes: bool,
    pub nodes: Vec<NavigationNode>,
}

impl NavigationSection {
    pub fn structural(nodes: Vec<NavigationNode>) -> Self {
        Self {
            navigation_type: NavigationType::Structural,
            remove_existing_nodes: false,
            nodes,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(NavigationNode::node_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationNode {
    pub title: String,
    pub url: String,
    pub is_external: bool,
    pub children: Vec<NavigationNode>,
}

impl NavigationNode {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            is_external: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NavigationNode>) -> Self {
        self.children = children;
        self
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NavigationNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count_includes_children() {
        let mut template = ProvisioningTemplate::new("TEMPLATE-1");
        template.navigation = Some(Navigation {
            global: Some(NavigationSection::structural(vec![
                NavigationNode::new("Home", "/").with_children(vec![
                    NavigationNode::new("News", "/news"),
                    NavigationNode::new("Events", "/events"),
                ]),
            ])),
            current: Some(NavigationSection::structural(vec![NavigationNode::new(
                "Docs", "/docs",
            )])),
        });
        assert_eq!(template.node_count(), 4);
    }

    #[test]
    fn test_navigation_type_parse() {
        assert_eq!(NavigationType::parse("Inherit"), Some(NavigationType::Inherit));
        assert_eq!(NavigationType::parse("Other"), None);
        assert_eq!(NavigationType::Managed.as_str(), "Managed");
    }
}
