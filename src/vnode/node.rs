//! The virtual node.
//!
//! A `VNode` is one point in the virtual tree. Exactly one of these holds:
//!
//! - `tag` is `Some(Tag::Element)`: a primitive element
//! - `tag` is `Some(Tag::Component)`: a component placeholder
//! - `tag` is `None`: a text node (`NodeFlags::TEXT`) or the empty/comment
//!   node (`NodeFlags::COMMENT`)
//!
//! Nodes built in one render are never rewritten to represent another
//! render. The patcher consumes the old tree and hands the backing handles
//! over to the new one.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::component::{AsyncComponent, ComponentDefinition, ComponentInstance};
use crate::types::{ElmId, Key, Namespace, NodeFlags, Value};

use super::data::{Handler, NodeData};

// =============================================================================
// Tag
// =============================================================================

/// What a tagged node represents.
#[derive(Clone)]
pub enum Tag {
    Element(String),
    Component(Rc<ComponentDefinition>),
}

impl Tag {
    /// Identity comparison: element names, or component identity ordinals.
    pub fn same(&self, other: &Tag) -> bool {
        match (self, other) {
            (Tag::Element(a), Tag::Element(b)) => a == b,
            (Tag::Component(a), Tag::Component(b)) => a.cid() == b.cid(),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&str> {
        match self {
            Tag::Element(tag) => Some(tag),
            Tag::Component(_) => None,
        }
    }

    pub fn definition(&self) -> Option<&Rc<ComponentDefinition>> {
        match self {
            Tag::Component(def) => Some(def),
            Tag::Element(_) => None,
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Element(tag) => write!(f, "{tag}"),
            Tag::Component(def) => match def.name() {
                Some(name) => write!(f, "component-{}-{name}", def.cid()),
                None => write!(f, "component-{}", def.cid()),
            },
        }
    }
}

// =============================================================================
// Component Node Options
// =============================================================================

/// What a component placeholder hands to its instance.
#[derive(Clone, Default)]
pub struct ComponentNodeOptions {
    /// Props extracted from `data.props` and `data.attrs`.
    pub props_data: BTreeMap<String, Value>,
    /// Component event listeners (from `data.on`).
    pub listeners: BTreeMap<String, Handler>,
    /// Children destined for slot projection.
    pub children: Vec<VNode>,
    /// The tag name used at the call site, if any.
    pub tag: Option<String>,
}

// =============================================================================
// VNode
// =============================================================================

#[derive(Clone, Default)]
pub struct VNode {
    pub tag: Option<Tag>,
    pub data: Option<NodeData>,
    pub children: Vec<VNode>,
    pub text: Option<String>,
    /// Backing handle, set once created. Component placeholders use
    /// [`VNode::elm`] instead, which follows the instance's root.
    pub elm: Option<ElmId>,
    pub ns: Option<Namespace>,
    /// Owning component instance (the one whose render built this node).
    pub context: Option<Weak<ComponentInstance>>,
    pub key: Option<Key>,
    pub component_options: Option<ComponentNodeOptions>,
    pub component_instance: Option<Rc<ComponentInstance>>,
    pub flags: NodeFlags,
    pub async_factory: Option<AsyncComponent>,
}

impl VNode {
    /// The canonical empty node: a comment with no data.
    pub fn empty() -> Self {
        Self::comment("")
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            flags: NodeFlags::COMMENT,
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            flags: NodeFlags::TEXT,
            ..Default::default()
        }
    }

    /// A primitive element node.
    pub fn element(tag: impl Into<String>, data: Option<NodeData>, children: Vec<VNode>) -> Self {
        Self {
            tag: Some(Tag::Element(tag.into())),
            data,
            children,
            ..Default::default()
        }
    }

    /// An element node whose content is a single text run.
    pub fn element_with_text(
        tag: impl Into<String>,
        data: Option<NodeData>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            tag: Some(Tag::Element(tag.into())),
            data,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A component placeholder node.
    pub fn component(
        definition: Rc<ComponentDefinition>,
        data: Option<NodeData>,
        options: ComponentNodeOptions,
    ) -> Self {
        Self {
            tag: Some(Tag::Component(definition)),
            data,
            component_options: Some(options),
            ..Default::default()
        }
    }

    /// Empty node standing in for an unresolved async component.
    pub fn async_placeholder(factory: AsyncComponent) -> Self {
        let mut node = Self::empty();
        node.flags |= NodeFlags::ASYNC_PLACEHOLDER;
        node.async_factory = Some(factory);
        node
    }

    /// Shallow clone for reuse in another render, flagged as cloned.
    ///
    /// The backing handle is carried over so static trees can be reused.
    pub fn clone_node(&self) -> Self {
        let mut cloned = self.clone();
        cloned.flags |= NodeFlags::CLONED;
        cloned
    }

    /// Mark this subtree static (never changes across renders).
    pub fn mark_static(mut self, key: impl Into<String>, once: bool) -> Self {
        self.flags |= NodeFlags::STATIC;
        if once {
            self.flags |= NodeFlags::ONCE;
        }
        self.key = Some(Key::Str(key.into()));
        self
    }

    pub fn with_context(mut self, context: Option<Weak<ComponentInstance>>) -> Self {
        self.context = context;
        self
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn is_comment(&self) -> bool {
        self.flags.contains(NodeFlags::COMMENT)
    }

    pub fn is_text(&self) -> bool {
        self.tag.is_none() && !self.is_comment()
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.is_comment() && self.data.is_none()
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(NodeFlags::STATIC)
    }

    pub fn is_cloned(&self) -> bool {
        self.flags.contains(NodeFlags::CLONED)
    }

    pub fn is_once(&self) -> bool {
        self.flags.contains(NodeFlags::ONCE)
    }

    pub fn is_async_placeholder(&self) -> bool {
        self.flags.contains(NodeFlags::ASYNC_PLACEHOLDER)
    }

    pub fn is_component(&self) -> bool {
        matches!(self.tag, Some(Tag::Component(_)))
    }

    /// Element tag name, if this is a primitive element.
    pub fn element_tag(&self) -> Option<&str> {
        self.tag.as_ref().and_then(Tag::as_element)
    }

    pub fn definition(&self) -> Option<&Rc<ComponentDefinition>> {
        self.tag.as_ref().and_then(Tag::definition)
    }

    /// Backing handle. Component placeholders are transparent: they report
    /// the root handle of their rendered output.
    pub fn elm(&self) -> Option<ElmId> {
        match &self.component_instance {
            Some(instance) => instance.el(),
            None => self.elm,
        }
    }

    /// Owning instance, if still alive.
    pub fn context(&self) -> Option<Rc<ComponentInstance>> {
        self.context.as_ref().and_then(Weak::upgrade)
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &VNode, out: &mut String) {
    if node.is_comment() {
        return;
    }
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for child in &node.children {
        collect_text(child, out);
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_text() {
            return write!(f, "Text({:?})", self.text.as_deref().unwrap_or_default());
        }
        if self.tag.is_none() {
            return write!(f, "Comment({:?})", self.text.as_deref().unwrap_or_default());
        }
        let mut s = f.debug_struct("VNode");
        s.field("tag", &self.tag);
        if let Some(key) = &self.key {
            s.field("key", key);
        }
        if let Some(ns) = &self.ns {
            s.field("ns", ns);
        }
        if let Some(text) = &self.text {
            s.field("text", text);
        }
        if !self.children.is_empty() {
            s.field("children", &self.children);
        }
        s.field("elm", &self.elm).finish()
    }
}
