//! Children normalization.
//!
//! Render functions hand the builder heterogeneous children: nodes, raw
//! text, values, nested lists and generated lists. Normalization turns them
//! into the flat `Vec<VNode>` the patcher diffs.
//!
//! # Levels
//!
//! - `Normalization::None`: children are already nodes
//! - `Normalization::Simple`: flatten one level (compiled, known shallow)
//! - `Normalization::Always`: flatten recursively, merge adjacent text,
//!   drop null/boolean entries, wrap primitives as text nodes
//!
//! A cheaper level that meets input it cannot handle falls back to the next
//! stronger one, so every level always produces valid nodes.

use crate::config;
use crate::types::{Normalization, Value};

use super::data::ScopedSlotFn;
use super::node::VNode;

// =============================================================================
// Child
// =============================================================================

/// One entry of a render function's children list.
#[derive(Clone)]
pub enum Child {
    Node(VNode),
    /// Primitives become text. Null and booleans are dropped. Lists nest.
    Value(Value),
    /// A nested list of children.
    List(Vec<Child>),
    /// A list produced by iterating a collection.
    RenderedList(Vec<Child>),
    /// A slot provider. Only meaningful as the first child, where the
    /// builder turns it into the default scoped slot.
    Slot(ScopedSlotFn),
}

impl Child {
    fn is_node(&self) -> bool {
        matches!(self, Child::Node(_))
    }

    fn is_flat_list(&self) -> bool {
        match self {
            Child::List(items) | Child::RenderedList(items) => items.iter().all(Child::is_node),
            _ => false,
        }
    }
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Child::Node(node)
    }
}

impl From<Option<VNode>> for Child {
    fn from(node: Option<VNode>) -> Self {
        match node {
            Some(node) => Child::Node(node),
            None => Child::Value(Value::Null),
        }
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Value(Value::from(text))
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Value(Value::Str(text))
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        Child::Value(value)
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Value(Value::from(value))
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Value(Value::from(value))
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Value(Value::Bool(value))
    }
}

impl From<Vec<VNode>> for Child {
    fn from(nodes: Vec<VNode>) -> Self {
        Child::List(nodes.into_iter().map(Child::Node).collect())
    }
}

impl From<Vec<Child>> for Child {
    fn from(children: Vec<Child>) -> Self {
        Child::List(children)
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Normalize at the requested level.
pub fn normalize(children: Vec<Child>, level: Normalization) -> Vec<VNode> {
    match level {
        Normalization::None if children.iter().all(Child::is_node) => children
            .into_iter()
            .filter_map(|c| match c {
                Child::Node(node) => Some(node),
                _ => None,
            })
            .collect(),
        Normalization::None | Normalization::Simple => simple_normalize_children(children),
        Normalization::Always => normalize_children(children),
    }
}

/// One level of flattening.
///
/// Only valid when every entry is a node or a list of nodes. Anything else
/// goes through full normalization.
pub fn simple_normalize_children(children: Vec<Child>) -> Vec<VNode> {
    if !children.iter().all(|c| c.is_node() || c.is_flat_list()) {
        return normalize_children(children);
    }
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Child::Node(node) => out.push(node),
            Child::List(items) | Child::RenderedList(items) => {
                out.extend(items.into_iter().filter_map(|c| match c {
                    Child::Node(node) => Some(node),
                    _ => None,
                }));
            }
            Child::Value(_) | Child::Slot(_) => {}
        }
    }
    out
}

/// Full recursive normalization.
pub fn normalize_children(children: Vec<Child>) -> Vec<VNode> {
    let synthetic_keys = config::with_config(|c| c.synthetic_list_keys);
    let mut out = Vec::with_capacity(children.len());
    normalize_list(children, None, false, synthetic_keys, &mut out);
    out
}

fn normalize_list(
    children: Vec<Child>,
    nested_index: Option<&str>,
    is_rendered_list: bool,
    synthetic_keys: bool,
    out: &mut Vec<VNode>,
) {
    for (i, child) in children.into_iter().enumerate() {
        match child {
            Child::List(items) => {
                let index = format!("{}_{i}", nested_index.unwrap_or_default());
                normalize_list(items, Some(&index), false, synthetic_keys, out);
            }
            Child::RenderedList(items) => {
                let index = format!("{}_{i}", nested_index.unwrap_or_default());
                normalize_list(items, Some(&index), true, synthetic_keys, out);
            }
            Child::Value(value) => push_value(value, nested_index, synthetic_keys, out),
            Child::Node(mut node) => {
                if node.is_text() {
                    push_text(node.text.take().unwrap_or_default(), out);
                    continue;
                }
                // Positional keys for unkeyed nodes of a nested generated list.
                if synthetic_keys && is_rendered_list && node.tag.is_some() && node.key.is_none() {
                    if let Some(nested) = nested_index {
                        node.key = Some(format!("__vlist{nested}_{i}__").into());
                    }
                }
                out.push(node);
            }
            Child::Slot(_) => {}
        }
    }
}

fn push_value(value: Value, nested_index: Option<&str>, synthetic_keys: bool, out: &mut Vec<VNode>) {
    match value {
        Value::Null | Value::Bool(_) | Value::Map(_) => {}
        Value::Str(_) | Value::Number(_) => {
            let text = value.to_text();
            if !text.is_empty() {
                push_text(text, out);
            }
        }
        Value::Signal(signal) => push_value(signal.get(), nested_index, synthetic_keys, out),
        Value::List(items) => {
            let children = items.into_iter().map(Child::Value).collect();
            normalize_list(children, nested_index, false, synthetic_keys, out);
        }
    }
}

/// Append text, merging into a trailing text node.
fn push_text(text: String, out: &mut Vec<VNode>) {
    match out.last_mut() {
        Some(last) if last.is_text() => {
            let merged = format!("{}{text}", last.text.as_deref().unwrap_or_default());
            *last = VNode::text(merged);
        }
        _ => out.push(VNode::text(text)),
    }
}
