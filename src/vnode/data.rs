//! Node data - Render-time attributes carried by a virtual node.
//!
//! A fresh `NodeData` is built on every render. It is plain data: reactive
//! cells may appear inside values, but the record itself is never a
//! reactive object (see [`create_element`](super::create_element)).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::types::{ElmId, Value};

use super::create::TagRef;
use super::node::VNode;

// =============================================================================
// Callback Types
// =============================================================================

/// Event handler. Receives the emitted payload.
///
/// Rc so handlers can be cloned from node data into component listeners.
pub type Handler = Rc<dyn Fn(&Value)>;

/// Per-node lifecycle hook. Receives the node's backing handle.
pub type ElmHook = Rc<dyn Fn(Option<ElmId>)>;

/// Scoped slot provider: slot props in, nodes out.
pub type ScopedSlotFn = Rc<dyn Fn(&Value) -> Vec<VNode>>;

// =============================================================================
// Node Hooks
// =============================================================================

/// Per-node hook overrides, run after the registry modules.
#[derive(Clone, Default)]
pub struct NodeHooks {
    /// Backing node created, children attached, not yet inserted.
    pub create: Option<ElmHook>,
    /// Whole tree inserted.
    pub insert: Option<ElmHook>,
    /// Node patched in place.
    pub update: Option<ElmHook>,
    /// Node destroyed.
    pub destroy: Option<ElmHook>,
}

impl NodeHooks {
    pub fn is_empty(&self) -> bool {
        self.create.is_none() && self.insert.is_none() && self.update.is_none() && self.destroy.is_none()
    }
}

// =============================================================================
// Directive Binding
// =============================================================================

/// A directive applied to a node (`v-name:arg.modifier="value"`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectiveBinding {
    pub name: String,
    pub value: Value,
    /// Value from the previous render, filled in during update.
    pub old_value: Option<Value>,
    pub arg: Option<String>,
    pub modifiers: Vec<String>,
}

impl DirectiveBinding {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = Some(arg.into());
        self
    }

    pub fn modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }
}

// =============================================================================
// Node Data
// =============================================================================

/// Render-time attributes of a node.
#[derive(Clone, Default)]
pub struct NodeData {
    /// Identity hint. Validated and moved to `VNode::key` by the builder.
    pub key: Option<Value>,
    /// Dynamic tag override.
    pub is: Option<TagRef>,
    pub attrs: BTreeMap<String, Value>,
    pub props: BTreeMap<String, Value>,
    pub static_class: Option<String>,
    /// String, list or map of class names.
    pub class: Option<Value>,
    /// Map of properties (or a list of maps).
    pub style: Option<Value>,
    pub on: BTreeMap<String, Handler>,
    /// Element listeners for a component's root (components only).
    pub native_on: BTreeMap<String, Handler>,
    pub hook: NodeHooks,
    pub scoped_slots: BTreeMap<String, ScopedSlotFn>,
    /// Named slot this node is projected into.
    pub slot: Option<String>,
    pub ref_name: Option<String>,
    /// Register the ref as a list entry.
    pub ref_in_for: bool,
    pub directives: Vec<DirectiveBinding>,
    /// Raw subtree: no component resolution.
    pub pre: bool,
    /// Cache the component instance on removal instead of destroying it.
    pub keep_alive: bool,
    /// Attribute strings last written to the element. Values may hold
    /// signals shared with the next render, so updates diff against this
    /// snapshot rather than the old node's live values.
    pub(crate) rendered: RefCell<BTreeMap<String, String>>,
}

impl NodeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build data from a plain value map.
    ///
    /// Recognized entries: `key`, `attrs`, `props`, `class`, `staticClass`,
    /// `style`, `slot`, `ref`. Unknown entries are ignored.
    pub fn from_value(value: &Value) -> Self {
        let mut data = NodeData::default();
        let Value::Map(map) = value else {
            return data;
        };
        for (name, entry) in map {
            match name.as_str() {
                "key" => data.key = Some(entry.clone()),
                "attrs" => data.attrs = entries(entry),
                "props" => data.props = entries(entry),
                "class" => data.class = Some(entry.clone()),
                "staticClass" => data.static_class = Some(entry.to_text()),
                "style" => data.style = Some(entry.clone()),
                "slot" => data.slot = Some(entry.to_text()),
                "ref" => data.ref_name = Some(entry.to_text()),
                _ => {}
            }
        }
        data
    }

    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn is(mut self, tag: impl Into<TagRef>) -> Self {
        self.is = Some(tag.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn static_class(mut self, class: impl Into<String>) -> Self {
        self.static_class = Some(class.into());
        self
    }

    pub fn class(mut self, class: impl Into<Value>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn style(mut self, style: impl Into<Value>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn on(mut self, event: impl Into<String>, handler: impl Fn(&Value) + 'static) -> Self {
        self.on.insert(event.into(), Rc::new(handler));
        self
    }

    pub fn native_on(mut self, event: impl Into<String>, handler: impl Fn(&Value) + 'static) -> Self {
        self.native_on.insert(event.into(), Rc::new(handler));
        self
    }

    pub fn slot(mut self, name: impl Into<String>) -> Self {
        self.slot = Some(name.into());
        self
    }

    pub fn scoped_slot(
        mut self,
        name: impl Into<String>,
        render: impl Fn(&Value) -> Vec<VNode> + 'static,
    ) -> Self {
        self.scoped_slots.insert(name.into(), Rc::new(render));
        self
    }

    pub fn ref_name(mut self, name: impl Into<String>) -> Self {
        self.ref_name = Some(name.into());
        self
    }

    pub fn ref_in_for(mut self, name: impl Into<String>) -> Self {
        self.ref_name = Some(name.into());
        self.ref_in_for = true;
        self
    }

    pub fn directive(mut self, binding: DirectiveBinding) -> Self {
        self.directives.push(binding);
        self
    }

    pub fn on_create(mut self, hook: impl Fn(Option<ElmId>) + 'static) -> Self {
        self.hook.create = Some(Rc::new(hook));
        self
    }

    pub fn on_insert(mut self, hook: impl Fn(Option<ElmId>) + 'static) -> Self {
        self.hook.insert = Some(Rc::new(hook));
        self
    }

    pub fn on_update(mut self, hook: impl Fn(Option<ElmId>) + 'static) -> Self {
        self.hook.update = Some(Rc::new(hook));
        self
    }

    pub fn on_destroy(mut self, hook: impl Fn(Option<ElmId>) + 'static) -> Self {
        self.hook.destroy = Some(Rc::new(hook));
        self
    }

    pub fn pre(mut self) -> Self {
        self.pre = true;
        self
    }

    pub fn keep_alive(mut self) -> Self {
        self.keep_alive = true;
        self
    }

    /// Attribute value as compared by `<input>` sameness.
    pub fn input_type(&self) -> Option<&Value> {
        self.attrs.get("type")
    }
}

fn entries(value: &Value) -> BTreeMap<String, Value> {
    match value {
        Value::Map(map) => map.clone(),
        _ => BTreeMap::new(),
    }
}

impl fmt::Debug for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeData")
            .field("key", &self.key)
            .field("attrs", &self.attrs)
            .field("props", &self.props)
            .field("class", &self.class)
            .field("style", &self.style)
            .field("on", &self.on.keys().collect::<Vec<_>>())
            .field("slot", &self.slot)
            .field("ref_name", &self.ref_name)
            .field("directives", &self.directives)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value_map;

    #[test]
    fn test_builder() {
        let data = NodeData::new()
            .key("a")
            .attr("id", "main")
            .class(value_map([("active", true)]))
            .on("click", |_| {});
        assert_eq!(data.key, Some(Value::from("a")));
        assert_eq!(data.attrs.get("id"), Some(&Value::from("main")));
        assert!(data.on.contains_key("click"));
        assert!(data.hook.is_empty());
    }

    #[test]
    fn test_from_value() {
        let raw = value_map([
            ("key", Value::from(7)),
            ("attrs", value_map([("title", "hi")])),
            ("ref", Value::from("box")),
            ("unknown", Value::from(true)),
        ]);
        let data = NodeData::from_value(&raw);
        assert_eq!(data.key, Some(Value::from(7)));
        assert_eq!(data.attrs.get("title"), Some(&Value::from("hi")));
        assert_eq!(data.ref_name.as_deref(), Some("box"));
    }
}
