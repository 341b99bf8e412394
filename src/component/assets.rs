//! Asset resolution.
//!
//! Components and directives are looked up by id, then by its camelized and
//! capitalized forms. Registries are searched from the context instance's
//! merged configuration; without a context, the base definition's global
//! registries are used.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::diagnostics;
use crate::error::VdomError;

use super::extend::base;
use super::instance::ComponentInstance;
use super::name::{camelize, capitalize};
use super::options::{ComponentOptions, ComponentRef, DirectiveDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Components,
    Directives,
}

impl AssetCategory {
    pub fn label(self) -> &'static str {
        match self {
            AssetCategory::Components => "component",
            AssetCategory::Directives => "directive",
        }
    }
}

/// Look `id` up in a registry: exact, camelized, then capitalized.
pub fn lookup<'a, V>(registry: &'a BTreeMap<String, V>, id: &str) -> Option<&'a V> {
    if let Some(found) = registry.get(id) {
        return Some(found);
    }
    let camelized = camelize(id);
    if let Some(found) = registry.get(&camelized) {
        return Some(found);
    }
    registry.get(&capitalize(&camelized))
}

/// Component registered under `id`.
pub fn resolve_component(context: Option<&ComponentInstance>, id: &str) -> Option<ComponentRef> {
    with_options(context, |options| lookup(&options.components, id).cloned())
}

/// Directive registered under `id`. Reports when `warn_missing` is set.
pub fn resolve_directive(
    context: Option<&ComponentInstance>,
    id: &str,
    warn_missing: bool,
) -> Option<Rc<DirectiveDef>> {
    let found = with_options(context, |options| lookup(&options.directives, id).cloned());
    if found.is_none() && warn_missing {
        let error = VdomError::UnresolvedAsset {
            category: AssetCategory::Directives.label(),
            id: id.to_string(),
        };
        diagnostics::report(&error, context);
    }
    found
}

fn with_options<R>(context: Option<&ComponentInstance>, f: impl FnOnce(&ComponentOptions) -> R) -> R {
    match context {
        Some(instance) => f(&instance.options()),
        None => f(&base().options()),
    }
}
