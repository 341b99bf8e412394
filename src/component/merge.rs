//! Option merging.
//!
//! Combines a parent configuration with a child configuration:
//!
//! - lifecycle hooks concatenate (parent first), deduplicated by identity
//! - data factories merge (child keys win, nested maps merge recursively)
//! - props, computed, methods: child shadows parent by key
//! - components, directives: parent entries, shadowed by child entries
//! - everything else: the child's value if set, else the parent's
//!
//! `extends` and `mixins` on the child fold into the parent side first.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config;
use crate::diagnostics;
use crate::types::Value;

use super::name::{camelize, validate_component_name};
use super::options::{ComponentOptions, DataFn, HookFn, LifecycleHook, PropSpec};

/// Merge `child` over `parent`.
///
/// The result has no `extends` or `mixins` left: they are folded in.
pub fn merge_options(parent: &ComponentOptions, child: &ComponentOptions) -> ComponentOptions {
    if config::is_development() {
        check_components(child);
    }

    let mut folded: Option<ComponentOptions> = None;
    if let Some(extends) = &child.extends {
        folded = Some(merge_options(folded.as_ref().unwrap_or(parent), extends));
    }
    for mixin in &child.mixins {
        folded = Some(merge_options(folded.as_ref().unwrap_or(parent), mixin));
    }
    let parent = folded.as_ref().unwrap_or(parent);

    ComponentOptions {
        name: child.name.clone().or_else(|| parent.name.clone()),
        props: shadow(&parent.props, &normalize_props(&child.props)),
        data: merge_data(parent.data.clone(), child.data.clone()),
        computed: shadow(&parent.computed, &child.computed),
        methods: shadow(&parent.methods, &child.methods),
        render: child.render.clone().or_else(|| parent.render.clone()),
        hooks: merge_hooks(&parent.hooks, &child.hooks),
        components: shadow(&parent.components, &child.components),
        directives: shadow(&parent.directives, &child.directives),
        extends: None,
        mixins: Vec::new(),
        scope_id: child.scope_id.clone().or_else(|| parent.scope_id.clone()),
    }
}

fn check_components(options: &ComponentOptions) {
    for name in options.components.keys() {
        if let Err(error) = validate_component_name(name) {
            diagnostics::report(&error, None);
        }
    }
}

fn shadow<V: Clone>(parent: &BTreeMap<String, V>, child: &BTreeMap<String, V>) -> BTreeMap<String, V> {
    let mut merged = parent.clone();
    merged.extend(child.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Hyphenated prop names are stored camelized.
fn normalize_props(props: &BTreeMap<String, PropSpec>) -> BTreeMap<String, PropSpec> {
    props.iter().map(|(name, spec)| (camelize(name), spec.clone())).collect()
}

fn merge_hooks(
    parent: &BTreeMap<LifecycleHook, Vec<HookFn>>,
    child: &BTreeMap<LifecycleHook, Vec<HookFn>>,
) -> BTreeMap<LifecycleHook, Vec<HookFn>> {
    let mut merged = parent.clone();
    for (hook, fns) in child {
        let list = merged.entry(*hook).or_default();
        for f in fns {
            if !list.iter().any(|existing| Rc::ptr_eq(existing, f)) {
                list.push(f.clone());
            }
        }
    }
    merged
}

fn merge_data(parent: Option<DataFn>, child: Option<DataFn>) -> Option<DataFn> {
    match (parent, child) {
        (None, child) => child,
        (parent, None) => parent,
        (Some(parent), Some(child)) => Some(Rc::new(move || {
            let mut to = child();
            merge_data_maps(&mut to, parent());
            to
        })),
    }
}

/// Copy entries of `from` missing in `to`; merge nested maps present in both.
pub fn merge_data_maps(to: &mut BTreeMap<String, Value>, from: BTreeMap<String, Value>) {
    for (key, from_value) in from {
        match to.get_mut(&key) {
            None => {
                to.insert(key, from_value);
            }
            Some(Value::Map(to_map)) => {
                if let Value::Map(from_map) = from_value {
                    merge_data_maps(to_map, from_map);
                }
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value_map;
    use std::cell::RefCell;

    #[test]
    fn test_hooks_concatenate_parent_first() {
        config::reset_config();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (l1, l2) = (log.clone(), log.clone());
        let parent = ComponentOptions::new().hook(LifecycleHook::Created, move |_| l1.borrow_mut().push("parent"));
        let child = ComponentOptions::new().hook(LifecycleHook::Created, move |_| l2.borrow_mut().push("child"));

        let merged = merge_options(&parent, &child);
        assert_eq!(merged.hooks_for(LifecycleHook::Created).len(), 2);

        // Merging the same parent again does not duplicate its hook.
        let again = merge_options(&merged, &parent);
        assert_eq!(again.hooks_for(LifecycleHook::Created).len(), 2);
    }

    #[test]
    fn test_data_merges_child_wins() {
        config::reset_config();
        let parent = ComponentOptions::new().data(|| {
            BTreeMap::from([
                ("a".to_string(), Value::from(1)),
                ("nested".to_string(), value_map([("x", 1), ("y", 1)])),
            ])
        });
        let child = ComponentOptions::new().data(|| {
            BTreeMap::from([
                ("a".to_string(), Value::from(2)),
                ("nested".to_string(), value_map([("y", 2)])),
            ])
        });
        let merged = merge_options(&parent, &child);
        let data = (merged.data.expect("merged data"))();
        assert_eq!(data["a"], Value::from(2));
        assert_eq!(data["nested"], value_map([("x", 1), ("y", 2)]));
    }

    #[test]
    fn test_props_shadow_and_camelize() {
        config::reset_config();
        let parent = ComponentOptions::new().prop("title", PropSpec::with_default("p"));
        let child = ComponentOptions::new()
            .prop("title", PropSpec::with_default("c"))
            .prop("max-count", PropSpec::new());
        let merged = merge_options(&parent, &child);
        assert_eq!(merged.props["title"].default, Some(Value::from("c")));
        assert!(merged.props.contains_key("maxCount"));
    }

    #[test]
    fn test_extends_and_mixins_fold_first() {
        config::reset_config();
        let base = ComponentOptions::new().name("base").prop("a", PropSpec::new());
        let mixin = ComponentOptions::new().prop("b", PropSpec::new());
        let child = ComponentOptions::new().extends(base).mixin(mixin);
        let merged = merge_options(&ComponentOptions::new(), &child);
        assert!(merged.props.contains_key("a"));
        assert!(merged.props.contains_key("b"));
        assert_eq!(merged.name.as_deref(), Some("base"));
        assert!(merged.mixins.is_empty());
        assert!(merged.extends.is_none());
    }

    #[test]
    fn test_invalid_local_component_name_reported() {
        config::reset_config();
        config::update_config(|c| c.production = false);
        let sink = diagnostics::collect();
        let child = ComponentOptions::new().component("div", ComponentOptions::new().into_spec());
        let merged = merge_options(&ComponentOptions::new(), &child);
        assert!(merged.components.contains_key("div"));
        assert!(sink.contains("reserved HTML elements"));
        diagnostics::reset_sink();
    }
}
