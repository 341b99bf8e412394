//! Attribute, class and style module.
//!
//! Applies `data.attrs`, the rendered class string and the rendered style
//! string of element nodes as backing attributes. Component placeholders
//! are skipped: their attrs were consumed as props.

use std::collections::BTreeMap;

use crate::component::hyphenate;
use crate::patch::{HookCx, HookModule, ModulePhase, NodeOps};
use crate::types::Value;
use crate::vnode::{NodeData, VNode};

pub struct AttrsModule;

impl AttrsModule {
    fn apply<O: NodeOps>(ops: &mut O, old: Option<&VNode>, vnode: &VNode) {
        if vnode.is_component() {
            return;
        }
        let Some(elm) = vnode.elm else { return };
        let old_rendered = old
            .and_then(|o| o.data.as_ref())
            .map(|d| d.rendered.borrow().clone())
            .unwrap_or_default();
        let rendered = vnode.data.as_ref().map(resolve_attrs).unwrap_or_default();

        for (name, value) in &rendered {
            if old_rendered.get(name) != Some(value) {
                ops.set_attribute(elm, name, value);
            }
        }
        for name in old_rendered.keys() {
            if !rendered.contains_key(name) {
                ops.remove_attribute(elm, name);
            }
        }

        if let Some(data) = &vnode.data {
            data.rendered.replace(rendered);
        }
    }
}

impl<O: NodeOps> HookModule<O> for AttrsModule {
    fn name(&self) -> &'static str {
        "attrs"
    }

    fn phase(&self) -> ModulePhase {
        ModulePhase::Platform
    }

    fn create(&self, cx: &mut HookCx<'_, O>, vnode: &VNode) {
        Self::apply(cx.ops, None, vnode);
    }

    fn update(&self, cx: &mut HookCx<'_, O>, old: &VNode, vnode: &VNode) {
        Self::apply(cx.ops, Some(old), vnode);
    }
}

/// Attribute strings for `data`. Null and `false` attrs are absent, as are
/// empty class and style strings.
fn resolve_attrs(data: &NodeData) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in &data.attrs {
        match value.resolve() {
            Value::Null | Value::Bool(false) => {}
            value => {
                out.insert(name.clone(), value.to_text());
            }
        }
    }
    for (name, text) in [("class", render_class(data)), ("style", render_style(data))] {
        if !text.is_empty() {
            out.insert(name.to_string(), text);
        }
    }
    out
}

// =============================================================================
// Class and Style Rendering
// =============================================================================

/// `static_class` followed by the dynamic class descriptor.
pub fn render_class(data: &NodeData) -> String {
    let dynamic = data.class.as_ref().map(stringify_class).unwrap_or_default();
    match (data.static_class.as_deref(), dynamic.as_str()) {
        (Some(s), "") => s.to_string(),
        (Some(s), d) if !s.is_empty() => format!("{s} {d}"),
        (_, d) => d.to_string(),
    }
}

fn stringify_class(value: &Value) -> String {
    match value.resolve() {
        Value::Str(s) => s,
        Value::List(items) => items
            .iter()
            .map(stringify_class)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Map(map) => map
            .iter()
            .filter(|(_, v)| v.is_truthy())
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// Style declarations in property order. A list of maps merges left to right.
pub fn render_style(data: &NodeData) -> String {
    let mut merged = BTreeMap::new();
    if let Some(style) = &data.style {
        collect_style(style, &mut merged);
    }
    merged
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn collect_style(value: &Value, out: &mut BTreeMap<String, String>) {
    match value.resolve() {
        Value::Map(map) => {
            for (name, value) in map {
                let text = value.to_text();
                if text.is_empty() {
                    continue;
                }
                out.insert(hyphenate(&name), text);
            }
        }
        Value::List(items) => items.iter().for_each(|item| collect_style(item, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryDom;
    use crate::patch::{ModuleRegistry, PatchTarget, Patcher};
    use crate::types::value_map;

    fn patcher() -> Patcher<MemoryDom> {
        let mut modules = ModuleRegistry::with_defaults();
        modules.register(AttrsModule);
        Patcher::with_modules(MemoryDom::new(), modules)
    }

    #[test]
    fn test_render_class_forms() {
        let data = NodeData::new()
            .static_class("base")
            .class(Value::List(vec![
                Value::from("a"),
                value_map([("on", true), ("off", false)]),
            ]));
        assert_eq!(render_class(&data), "base a on");
        assert_eq!(render_class(&NodeData::new()), "");
    }

    #[test]
    fn test_render_style_hyphenates() {
        let data = NodeData::new().style(Value::List(vec![
            value_map([("fontSize", "12px")]),
            value_map([("color", "red"), ("fontSize", "14px")]),
        ]));
        assert_eq!(render_style(&data), "color: red; font-size: 14px");
    }

    #[test]
    fn test_attrs_applied_and_diffed() {
        let mut patcher = patcher();
        let first = VNode::element("a", Some(NodeData::new().attr("href", "/x").attr("title", "t")), vec![]);
        let first = patcher.patch(PatchTarget::None, first);
        let elm = first.elm.expect("element created");
        assert_eq!(patcher.ops().attr(elm, "href"), Some("/x"));

        let second = VNode::element("a", Some(NodeData::new().attr("href", "/y").class("hot")), vec![]);
        patcher.patch(PatchTarget::Node(first), second);
        assert_eq!(patcher.ops().attr(elm, "href"), Some("/y"));
        assert_eq!(patcher.ops().attr(elm, "title"), None);
        assert_eq!(patcher.ops().attr(elm, "class"), Some("hot"));
    }
}
