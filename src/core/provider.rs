//! PnP 佈建範本的 XML 讀寫
//!
//! 只處理導覽相關元素，其餘元素讀取時略過。比對時只看 local name，
//! 所以任何命名空間前綴都可以。

use crate::core::Storage;
use crate::domain::template::{
    Navigation, NavigationNode, NavigationSection, NavigationType, ProvisioningTemplate,
};
use crate::utils::error::{DeployError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

pub const PNP_NAMESPACE: &str = "http://schemas.dev.office.com/PnP/2020/02/ProvisioningSchema";

const GENERATOR: &str = concat!(env!("CARGO_PKG_NAME"), ", ", env!("CARGO_PKG_VERSION"));

/// File-backed template provider on top of a [`Storage`].
pub struct XmlTemplateProvider<S: Storage> {
    storage: S,
}

impl<S: Storage> XmlTemplateProvider<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// 序列化範本並寫入儲存體，回傳完整路徑
    pub async fn save_as(&self, template: &ProvisioningTemplate, file_name: &str) -> Result<String> {
        let xml = serialize_template(template)?;
        tracing::debug!("Writing template {} ({} bytes)", file_name, xml.len());
        self.storage.write_file(file_name, xml.as_bytes()).await?;
        Ok(self.storage.location(file_name))
    }

    pub async fn get_template(&self, file_name: &str) -> Result<ProvisioningTemplate> {
        let data = self.storage.read_file(file_name).await?;
        let xml = String::from_utf8(data).map_err(|e| DeployError::TemplateError {
            message: format!("{} is not valid UTF-8: {}", file_name, e),
        })?;
        parse_template(&xml)
    }

    /// Reads `source_file`, drops current navigation and writes `target_file`.
    pub async fn save_global_navigation_only(
        &self,
        source_file: &str,
        target_file: &str,
    ) -> Result<String> {
        let data = self.storage.read_file(source_file).await?;
        let xml = String::from_utf8_lossy(&data);
        let filtered = strip_current_navigation(&xml, &self.storage.location(source_file))?;
        self.storage.write_file(target_file, filtered.as_bytes()).await?;
        Ok(self.storage.location(target_file))
    }
}

pub fn serialize_template(template: &ProvisioningTemplate) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("pnp:Provisioning");
    root.push_attribute(("xmlns:pnp", PNP_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    let mut preferences = BytesStart::new("pnp:Preferences");
    preferences.push_attribute(("Generator", GENERATOR));
    writer.write_event(Event::Empty(preferences))?;

    let container_id = format!("CONTAINER-{}", template.id);
    let mut templates = BytesStart::new("pnp:Templates");
    templates.push_attribute(("ID", container_id.as_str()));
    writer.write_event(Event::Start(templates))?;

    let mut element = BytesStart::new("pnp:ProvisioningTemplate");
    element.push_attribute(("ID", template.id.as_str()));
    element.push_attribute(("Version", template.version.as_str()));

    match &template.navigation {
        Some(navigation) => {
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::Start(BytesStart::new("pnp:Navigation")))?;
            if let Some(global) = &navigation.global {
                write_section(&mut writer, "pnp:GlobalNavigation", global)?;
            }
            if let Some(current) = &navigation.current {
                write_section(&mut writer, "pnp:CurrentNavigation", current)?;
            }
            writer.write_event(Event::End(BytesEnd::new("pnp:Navigation")))?;
            writer.write_event(Event::End(BytesEnd::new("pnp:ProvisioningTemplate")))?;
        }
        None => writer.write_event(Event::Empty(element))?,
    }

    writer.write_event(Event::End(BytesEnd::new("pnp:Templates")))?;
    writer.write_event(Event::End(BytesEnd::new("pnp:Provisioning")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| DeployError::TemplateError {
        message: format!("Serialized template is not valid UTF-8: {}", e),
    })
}

fn write_section(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    section: &NavigationSection,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("NavigationType", section.navigation_type.as_str()));

    if section.navigation_type != NavigationType::Structural {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    let mut structural = BytesStart::new("pnp:StructuralNavigation");
    structural.push_attribute((
        "RemoveExistingNodes",
        if section.remove_existing_nodes { "true" } else { "false" },
    ));
    if section.nodes.is_empty() {
        writer.write_event(Event::Empty(structural))?;
    } else {
        writer.write_event(Event::Start(structural))?;
        for node in &section.nodes {
            write_node(writer, node)?;
        }
        writer.write_event(Event::End(BytesEnd::new("pnp:StructuralNavigation")))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &NavigationNode) -> Result<()> {
    let mut start = BytesStart::new("pnp:NavigationNode");
    start.push_attribute(("Title", node.title.as_str()));
    start.push_attribute(("Url", node.url.as_str()));
    start.push_attribute(("IsExternal", if node.is_external { "true" } else { "false" }));

    if node.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("pnp:NavigationNode")))?;
    Ok(())
}

pub fn parse_template(xml: &str) -> Result<ProvisioningTemplate> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parser = TemplateParser::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.open(&e)?,
            Event::Empty(e) => {
                parser.open(&e)?;
                parser.close(e.local_name().as_ref());
            }
            Event::End(e) => parser.close(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }

    parser.template.ok_or_else(|| DeployError::TemplateError {
        message: "Document does not contain a ProvisioningTemplate element".to_string(),
    })
}

enum Slot {
    Global,
    Current,
}

#[derive(Default)]
struct TemplateParser {
    template: Option<ProvisioningTemplate>,
    inside_template: bool,
    navigation: Option<Navigation>,
    section: Option<(Slot, NavigationSection)>,
    nodes: Vec<NavigationNode>,
}

impl TemplateParser {
    fn open(&mut self, e: &BytesStart) -> Result<()> {
        let name = e.local_name();
        match name.as_ref() {
            // 只讀第一個範本
            b"ProvisioningTemplate" if self.template.is_none() => {
                let mut template =
                    ProvisioningTemplate::new(attribute(e, b"ID")?.unwrap_or_default());
                if let Some(version) = attribute(e, b"Version")? {
                    template.version = version;
                }
                self.template = Some(template);
                self.inside_template = true;
            }
            _ if !self.inside_template => {}
            b"Navigation" => self.navigation = Some(Navigation::default()),
            b"GlobalNavigation" | b"CurrentNavigation" => {
                let slot = if name.as_ref() == b"GlobalNavigation" {
                    Slot::Global
                } else {
                    Slot::Current
                };
                let navigation_type = attribute(e, b"NavigationType")?
                    .and_then(|v| NavigationType::parse(&v))
                    .unwrap_or(NavigationType::Structural);
                self.section = Some((
                    slot,
                    NavigationSection {
                        navigation_type,
                        remove_existing_nodes: false,
                        nodes: Vec::new(),
                    },
                ));
            }
            b"StructuralNavigation" => {
                let remove = attribute(e, b"RemoveExistingNodes")?
                    .map(|v| parse_bool(&v))
                    .unwrap_or(false);
                if let Some((_, section)) = self.section.as_mut() {
                    section.remove_existing_nodes = remove;
                }
            }
            b"NavigationNode" if self.section.is_some() => {
                self.nodes.push(NavigationNode {
                    title: attribute(e, b"Title")?.unwrap_or_default(),
                    url: attribute(e, b"Url")?.unwrap_or_default(),
                    is_external: attribute(e, b"IsExternal")?
                        .map(|v| parse_bool(&v))
                        .unwrap_or(false),
                    children: Vec::new(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, local_name: &[u8]) {
        if !self.inside_template {
            return;
        }
        match local_name {
            b"ProvisioningTemplate" => {
                self.inside_template = false;
                if let Some(template) = self.template.as_mut() {
                    template.navigation = self.navigation.take();
                }
            }
            b"NavigationNode" if self.section.is_some() => {
                if let Some(node) = self.nodes.pop() {
                    match self.nodes.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => {
                            if let Some((_, section)) = self.section.as_mut() {
                                section.nodes.push(node);
                            }
                        }
                    }
                }
            }
            b"GlobalNavigation" | b"CurrentNavigation" => {
                if let (Some((slot, section)), Some(navigation)) =
                    (self.section.take(), self.navigation.as_mut())
                {
                    match slot {
                        Slot::Global => navigation.global = Some(section),
                        Slot::Current => navigation.current = Some(section),
                    }
                }
            }
            _ => {}
        }
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Removes every `CurrentNavigation` subtree, leaving the rest of the
/// document as written. `source` is only used in the error.
pub fn strip_current_navigation(xml: &str, source: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::new());

    let mut found_navigation = false;
    let mut skip_depth = 0usize;
    let mut removed = 0usize;

    loop {
        let event = reader.read_event()?;
        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }
        match &event {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Navigation" => {
                found_navigation = true;
            }
            Event::Start(e) if e.local_name().as_ref() == b"CurrentNavigation" => {
                skip_depth = 1;
                removed += 1;
                continue;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"CurrentNavigation" => {
                removed += 1;
                continue;
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event)?;
    }

    if !found_navigation {
        return Err(DeployError::NoNavigationError {
            path: source.to_string(),
        });
    }

    tracing::debug!("Removed {} CurrentNavigation element(s) from {}", removed, source);
    String::from_utf8(writer.into_inner()).map_err(|e| DeployError::TemplateError {
        message: format!("Filtered template is not valid UTF-8: {}", e),
    })
}
