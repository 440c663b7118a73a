//! Document abstraction: the page elements the pipeline reads and writes.
//!
//! [`Document`] is the minimal capability set the translation applier needs
//! (enumerate targets, read and write content or placeholder).
//! [`PageQuery`] adds the lookups used by the auxiliary page updaters.
//! [`MemoryDocument`] is an in-memory element tree implementing both, built
//! from a JSON page manifest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute naming the translation key for rendered content.
pub const I18N_ATTR: &str = "data-i18n";

/// Attribute naming the translation key for placeholder-only targets.
pub const I18N_PLACEHOLDER_ATTR: &str = "data-i18n-placeholder";

/// Index of an element inside a document.
pub type NodeId = usize;

/// How an element displays translated text bound by `data-i18n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Text inputs and text areas: the translation becomes the placeholder
    TextInput,
    /// Everything else: the translation becomes the rendered content
    Rich,
}

impl ElementKind {
    /// Classify an element from its tag name and `type` attribute.
    pub fn classify(tag: &str, input_type: Option<&str>) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "textarea" => ElementKind::TextInput,
            "input" if !input_type.is_some_and(|t| t.eq_ignore_ascii_case("submit")) => {
                ElementKind::TextInput
            }
            _ => ElementKind::Rich,
        }
    }
}

/// An element annotated with translation keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub node: NodeId,
    pub kind: ElementKind,
    /// Value of `data-i18n`
    pub content_key: Option<String>,
    /// Value of `data-i18n-placeholder`
    pub placeholder_key: Option<String>,
}

/// Minimal document capabilities used by the translation applier.
pub trait Document {
    /// All elements carrying `data-i18n` or `data-i18n-placeholder`, in
    /// document order.
    fn targets(&self) -> Vec<Target>;

    /// Rendered content (markup) of an element.
    fn content(&self, node: NodeId) -> Option<&str>;

    fn placeholder(&self, node: NodeId) -> Option<&str>;

    /// Replace the rendered content. The value is markup and is not escaped.
    fn set_content(&mut self, node: NodeId, value: &str);

    fn set_placeholder(&mut self, node: NodeId, value: &str);
}

/// Element lookups used by the auxiliary page updaters.
pub trait PageQuery: Document {
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    fn elements_with_class(&self, class: &str) -> Vec<NodeId>;

    /// First descendant of `node` with the given tag, depth first.
    fn descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId>;

    /// The `<body>` element, if present.
    fn body(&self) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Add (`enabled`) or remove a class.
    fn set_class(&mut self, node: NodeId, class: &str, enabled: bool);
}

/// Serializable description of a page element and its subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// `type` attribute of inputs
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Shorthand for `with_attr("data-i18n", key)`.
    pub fn with_key(self, key: impl Into<String>) -> Self {
        self.with_attr(I18N_ATTR, key)
    }

    /// Shorthand for `with_attr("data-i18n-placeholder", key)`.
    pub fn with_placeholder_key(self, key: impl Into<String>) -> Self {
        self.with_attr(I18N_PLACEHOLDER_ATTR, key)
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    id: Option<String>,
    input_type: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    content: String,
    placeholder: Option<String>,
    children: Vec<NodeId>,
}

/// In-memory element tree.
///
/// Nodes live in an arena in document (pre-order) order, so `NodeId`
/// ordering matches document order.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    elements: Vec<Element>,
}

impl MemoryDocument {
    /// Build a document from a root element description.
    pub fn from_spec(root: &ElementSpec) -> Self {
        let mut doc = Self {
            elements: Vec::new(),
        };
        doc.push(root);
        doc
    }

    /// Parse a JSON page manifest.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let root: ElementSpec = serde_json::from_str(json)?;
        Ok(Self::from_spec(&root))
    }

    /// Convert the current tree back into its description.
    pub fn to_spec(&self) -> ElementSpec {
        self.spec_at(0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node).map(|e| e.tag.as_str())
    }

    fn push(&mut self, spec: &ElementSpec) -> NodeId {
        let node = self.elements.len();
        self.elements.push(Element {
            tag: spec.tag.clone(),
            id: spec.id.clone(),
            input_type: spec.input_type.clone(),
            classes: spec.classes.clone(),
            attrs: spec.attrs.clone(),
            content: spec.content.clone(),
            placeholder: spec.placeholder.clone(),
            children: Vec::new(),
        });

        let children: Vec<NodeId> = spec.children.iter().map(|c| self.push(c)).collect();
        self.elements[node].children = children;
        node
    }

    fn spec_at(&self, node: NodeId) -> ElementSpec {
        match self.elements.get(node) {
            Some(e) => ElementSpec {
                tag: e.tag.clone(),
                id: e.id.clone(),
                input_type: e.input_type.clone(),
                classes: e.classes.clone(),
                attrs: e.attrs.clone(),
                content: e.content.clone(),
                placeholder: e.placeholder.clone(),
                children: e.children.iter().map(|&c| self.spec_at(c)).collect(),
            },
            None => ElementSpec::default(),
        }
    }
}

impl Document for MemoryDocument {
    fn targets(&self) -> Vec<Target> {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(node, e)| {
                let content_key = e.attrs.get(I18N_ATTR).cloned();
                let placeholder_key = e.attrs.get(I18N_PLACEHOLDER_ATTR).cloned();
                if content_key.is_none() && placeholder_key.is_none() {
                    return None;
                }
                Some(Target {
                    node,
                    kind: ElementKind::classify(&e.tag, e.input_type.as_deref()),
                    content_key,
                    placeholder_key,
                })
            })
            .collect()
    }

    fn content(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node).map(|e| e.content.as_str())
    }

    fn placeholder(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node).and_then(|e| e.placeholder.as_deref())
    }

    fn set_content(&mut self, node: NodeId, value: &str) {
        if let Some(e) = self.elements.get_mut(node) {
            e.content = value.to_string();
        }
    }

    fn set_placeholder(&mut self, node: NodeId, value: &str) {
        if let Some(e) = self.elements.get_mut(node) {
            e.placeholder = Some(value.to_string());
        }
    }
}

impl PageQuery for MemoryDocument {
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
    }

    fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.classes.iter().any(|c| c == class))
            .map(|(node, _)| node)
            .collect()
    }

    fn descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let element = self.elements.get(node)?;
        element.children.iter().find_map(|&child| {
            if self.elements[child].tag.eq_ignore_ascii_case(tag) {
                Some(child)
            } else {
                self.descendant_by_tag(child, tag)
            }
        })
    }

    fn body(&self) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|e| e.tag.eq_ignore_ascii_case("body"))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        let element = self.elements.get(node)?;
        match name {
            "id" => element.id.as_deref(),
            "type" => element.input_type.as_deref(),
            _ => element.attrs.get(name).map(String::as_str),
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(e) = self.elements.get_mut(node) {
            e.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements
            .get(node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    fn set_class(&mut self, node: NodeId, class: &str, enabled: bool) {
        if let Some(e) = self.elements.get_mut(node) {
            let present = e.classes.iter().any(|c| c == class);
            if enabled && !present {
                e.classes.push(class.to_string());
            } else if !enabled && present {
                e.classes.retain(|c| c != class);
            }
        }
    }
}
