//! Tree builder.
//!
//! [`create_element`] turns a `(tag, data, children)` triple into one
//! normalized node. It never fails: misuse is reported through
//! diagnostics and degrades to the canonical empty node.
//!
//! # Tag resolution
//!
//! 1. `data.is` overrides the tag.
//! 2. Platform elements build element nodes directly.
//! 3. Other names are looked up in the context's component registry.
//! 4. Anything unresolved stays a plain element (custom elements).
//!
//! Definitions, inline specs and async handles skip the lookup.

use std::rc::Rc;

use crate::component::{
    self, AsyncComponent, ComponentDefinition, ComponentInstance, ComponentRef, ExtendSpec,
};
use crate::config;
use crate::diagnostics;
use crate::error::VdomError;
use crate::reactivity;
use crate::types::{Key, Namespace, Normalization, Value};

use super::data::NodeData;
use super::node::{ComponentNodeOptions, VNode};
use super::normalize::{normalize, Child};

// =============================================================================
// Arguments
// =============================================================================

/// What a node is built from.
#[derive(Clone, Default)]
pub enum TagRef {
    #[default]
    None,
    Primitive(String),
    Definition(Rc<ComponentDefinition>),
    /// An inline definition, derived from the base on use.
    Inline(Rc<ExtendSpec>),
    Async(AsyncComponent),
}

impl TagRef {
    pub fn is_none(&self) -> bool {
        match self {
            TagRef::None => true,
            TagRef::Primitive(tag) => tag.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for TagRef {
    fn from(tag: &str) -> Self {
        TagRef::Primitive(tag.to_string())
    }
}

impl From<String> for TagRef {
    fn from(tag: String) -> Self {
        TagRef::Primitive(tag)
    }
}

impl From<Rc<ComponentDefinition>> for TagRef {
    fn from(def: Rc<ComponentDefinition>) -> Self {
        TagRef::Definition(def)
    }
}

impl From<&Rc<ComponentDefinition>> for TagRef {
    fn from(def: &Rc<ComponentDefinition>) -> Self {
        TagRef::Definition(def.clone())
    }
}

impl From<Rc<ExtendSpec>> for TagRef {
    fn from(spec: Rc<ExtendSpec>) -> Self {
        TagRef::Inline(spec)
    }
}

impl From<AsyncComponent> for TagRef {
    fn from(factory: AsyncComponent) -> Self {
        TagRef::Async(factory)
    }
}

impl From<ComponentRef> for TagRef {
    fn from(component: ComponentRef) -> Self {
        match component {
            ComponentRef::Definition(def) => TagRef::Definition(def),
            ComponentRef::Spec(spec) => TagRef::Inline(spec),
            ComponentRef::SelfRef(weak) => weak.upgrade().map(TagRef::Definition).unwrap_or_default(),
            ComponentRef::Async(factory) => TagRef::Async(factory),
        }
    }
}

/// The data position of a builder call.
///
/// Passing children (or a primitive) here selects the optional-data calling
/// convention: the value is used as the children and the separate children
/// argument is ignored.
#[derive(Clone, Default)]
pub enum DataArg {
    #[default]
    None,
    Data(NodeData),
    /// A value handed over as node data. Refused when it is a live reactive
    /// cell.
    Observed(Value),
    Children(Vec<Child>),
    Primitive(Value),
}

impl From<NodeData> for DataArg {
    fn from(data: NodeData) -> Self {
        DataArg::Data(data)
    }
}

impl From<Option<NodeData>> for DataArg {
    fn from(data: Option<NodeData>) -> Self {
        data.map(DataArg::Data).unwrap_or_default()
    }
}

impl From<Vec<Child>> for DataArg {
    fn from(children: Vec<Child>) -> Self {
        DataArg::Children(children)
    }
}

impl From<Vec<VNode>> for DataArg {
    fn from(nodes: Vec<VNode>) -> Self {
        DataArg::Children(nodes.into_iter().map(Child::Node).collect())
    }
}

impl From<&str> for DataArg {
    fn from(text: &str) -> Self {
        DataArg::Primitive(Value::from(text))
    }
}

impl From<String> for DataArg {
    fn from(text: String) -> Self {
        DataArg::Primitive(Value::Str(text))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Build one node.
pub fn create_element(
    context: Option<&Rc<ComponentInstance>>,
    tag: impl Into<TagRef>,
    data: impl Into<DataArg>,
    children: Vec<Child>,
    normalization: Normalization,
) -> VNode {
    let (data, children) = match data.into() {
        DataArg::None => (None, children),
        DataArg::Data(data) => (Some(data), children),
        DataArg::Observed(value) => {
            if reactivity::is_tracked(&value) {
                let error = VdomError::ObservedData {
                    summary: format!("{:?}", value.resolve()),
                };
                diagnostics::report(&error, context.map(|c| &**c));
                return VNode::empty();
            }
            (Some(NodeData::from_value(&value)), children)
        }
        DataArg::Children(list) => (None, list),
        DataArg::Primitive(value) => (None, vec![Child::Value(value)]),
    };
    build(context, tag.into(), data, children, normalization)
}

fn build(
    context: Option<&Rc<ComponentInstance>>,
    mut tag: TagRef,
    mut data: Option<NodeData>,
    mut children: Vec<Child>,
    normalization: Normalization,
) -> VNode {
    let ctx = context.map(|c| &**c);

    if let Some(is) = data.as_mut().and_then(|d| d.is.take()) {
        tag = is;
    }
    if tag.is_none() {
        return VNode::empty();
    }

    let key = data
        .as_mut()
        .and_then(|d| d.key.take())
        .and_then(|raw| validate_key(raw, ctx));

    // A callable first child is the default scoped slot, not content.
    if matches!(children.first(), Some(Child::Slot(_))) {
        if let Child::Slot(provider) = children.swap_remove(0) {
            data.get_or_insert_with(NodeData::default)
                .scoped_slots
                .insert("default".to_string(), provider);
        }
        children.clear();
    }

    let children = normalize(children, normalization);

    let (mut vnode, ns) = match tag {
        TagRef::Primitive(name) => {
            let ns = context
                .and_then(|c| c.placeholder_ns())
                .or_else(|| config::get_tag_namespace(&name));
            if config::is_reserved_tag(&name) {
                if let Some(d) = &data {
                    if config::is_development() && !d.native_on.is_empty() {
                        let error = VdomError::NativeModifierOnElement { tag: name.clone() };
                        diagnostics::report(&error, ctx);
                    }
                }
                let platform_tag = config::parse_platform_tag_name(&name);
                (VNode::element(platform_tag, data, children), ns)
            } else {
                let is_pre = data.as_ref().is_some_and(|d| d.pre);
                let resolved = if is_pre {
                    None
                } else {
                    component::resolve_component(ctx, &name)
                };
                match resolved {
                    Some(component) => {
                        let node = create_component(component.into(), data, context, children, Some(name));
                        (node, ns)
                    }
                    None => (VNode::element(name, data, children), ns),
                }
            }
        }
        other => (create_component(other, data, context, children, None), None),
    };

    vnode.key = key;
    vnode.context = context.map(Rc::downgrade);
    if let Some(ns) = ns {
        apply_ns(&mut vnode, Some(ns), false);
    }
    if let Some(data) = &vnode.data {
        register_deep_bindings(data);
    }
    vnode
}

fn validate_key(raw: Value, ctx: Option<&ComponentInstance>) -> Option<Key> {
    if Key::is_valid_key_value(&raw) {
        return Key::from_value(&raw);
    }
    if config::is_development() {
        diagnostics::report(&VdomError::NonPrimitiveKey, ctx);
    }
    None
}

/// Build a component placeholder.
fn create_component(
    tag: TagRef,
    data: Option<NodeData>,
    context: Option<&Rc<ComponentInstance>>,
    children: Vec<VNode>,
    tag_name: Option<String>,
) -> VNode {
    let mut async_factory = None;
    let definition = match tag {
        TagRef::Definition(def) => def,
        TagRef::Inline(spec) => component::derive(&component::base(), &spec),
        TagRef::Async(factory) => match factory.resolved() {
            Some(def) => {
                async_factory = Some(factory);
                def
            }
            None => {
                if let Some(owner) = context {
                    factory.add_owner(owner);
                }
                return VNode::async_placeholder(factory);
            }
        },
        TagRef::None | TagRef::Primitive(_) => return VNode::empty(),
    };

    let options = component::resolve_options(&definition);
    let mut data = data.unwrap_or_default();
    let props_data = component::extract_props(&mut data, &options);

    // Component listeners come from `on`; `native_on` becomes the root
    // element's listeners.
    let listeners = std::mem::take(&mut data.on);
    data.on = std::mem::take(&mut data.native_on);

    let mut vnode = VNode::component(
        definition,
        Some(data),
        ComponentNodeOptions {
            props_data,
            listeners,
            children,
            tag: tag_name,
        },
    );
    vnode.async_factory = async_factory;
    vnode
}

// =============================================================================
// Finalization
// =============================================================================

/// Propagate a namespace through a subtree.
///
/// Children that already carry a namespace keep it unless `force` is set.
/// Inside `foreignObject` the namespace resets to the host default and is
/// forced onto every descendant except nested `svg` roots.
pub fn apply_ns(vnode: &mut VNode, ns: Option<Namespace>, force: bool) {
    vnode.ns = ns.clone();
    let (ns, force) = if vnode.element_tag() == Some("foreignObject") {
        (None, true)
    } else {
        (ns, force)
    };
    for child in &mut vnode.children {
        if child.tag.is_some() && (child.ns.is_none() || (force && child.element_tag() != Some("svg"))) {
            apply_ns(child, ns.clone(), force);
        }
    }
}

/// Subscribe the running render to deep changes of style/class containers.
///
/// Slot content may carry style or class objects owned by another
/// component; the node itself is shallow, so their contents are read here.
pub fn register_deep_bindings(data: &NodeData) {
    if let Some(style) = data.style.as_ref().filter(|v| v.is_container()) {
        reactivity::register_dependency(style);
    }
    if let Some(class) = data.class.as_ref().filter(|v| v.is_container()) {
        reactivity::register_dependency(class);
    }
}
