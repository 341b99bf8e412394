//! Definition derivation with per-spec caching.
//!
//! [`derive`] produces a definition from a base definition and an
//! extension spec. Each [`ExtendSpec`] carries a private cache keyed by the
//! base's identity ordinal, so deriving the same spec from the same base
//! twice returns the same definition and allocates no new ordinal.
//! Registration code can run more than once without creating new classes.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::config;
use crate::diagnostics;

use super::definition::ComponentDefinition;
use super::merge::merge_options;
use super::name::validate_component_name;
use super::options::ComponentOptions;

// =============================================================================
// Extension Spec
// =============================================================================

/// An extension request plus its private derivation cache.
pub struct ExtendSpec {
    options: ComponentOptions,
    /// Base cid → definition derived from that base.
    cache: RefCell<HashMap<u32, Rc<ComponentDefinition>>>,
}

impl ExtendSpec {
    pub fn new(options: ComponentOptions) -> Rc<Self> {
        Rc::new(Self {
            options,
            cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.options
    }

    /// Definition previously derived from the base with this cid.
    pub fn cached(&self, base_cid: u32) -> Option<Rc<ComponentDefinition>> {
        self.cache.borrow().get(&base_cid).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl ComponentOptions {
    /// Wrap these options as an extension spec.
    pub fn into_spec(self) -> Rc<ExtendSpec> {
        ExtendSpec::new(self)
    }
}

// =============================================================================
// Identity Ordinals and the Base Definition
// =============================================================================

thread_local! {
    /// Next cid. The base definition is cid 0.
    static NEXT_CID: Cell<u32> = const { Cell::new(1) };

    static BASE: RefCell<Option<Rc<ComponentDefinition>>> = const { RefCell::new(None) };
}

fn allocate_cid() -> u32 {
    NEXT_CID.with(|next| {
        let cid = next.get();
        next.set(cid + 1);
        cid
    })
}

/// The cid the next derivation will receive.
pub fn next_cid() -> u32 {
    NEXT_CID.with(Cell::get)
}

/// Restart ordinals (for testing).
pub fn reset_cid_counter() {
    NEXT_CID.with(|next| next.set(1));
}

/// The root definition: global asset registries and global mixins.
pub fn base() -> Rc<ComponentDefinition> {
    BASE.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| ComponentDefinition::new_base(ComponentOptions::default()))
            .clone()
    })
}

/// Replace the base with a fresh one and restart ordinals (for testing).
pub fn reset_base() {
    BASE.with(|slot| *slot.borrow_mut() = None);
    reset_cid_counter();
}

// =============================================================================
// Derivation
// =============================================================================

/// Derive a definition from `base` using `spec`.
///
/// Never fails. An invalid name is reported and kept.
pub fn derive(base: &Rc<ComponentDefinition>, spec: &Rc<ExtendSpec>) -> Rc<ComponentDefinition> {
    let base_cid = base.cid();
    if let Some(cached) = spec.cached(base_cid) {
        return cached;
    }

    let name = spec.options.name.clone().or_else(|| base.name());
    if let Some(name) = &name {
        if config::is_development() {
            if let Err(error) = validate_component_name(name) {
                diagnostics::report(&error, None);
            }
        }
    }

    let cid = allocate_cid();
    let super_options = base.options();
    let merged = merge_options(&super_options, &spec.options);
    let def = ComponentDefinition::new_derived(
        cid,
        base.clone(),
        super_options,
        spec.options.clone(),
        merged,
    );

    spec.cache.borrow_mut().insert(base_cid, def.clone());
    tracing::debug!(target: "spark_vdom", cid, base = base_cid, name = ?name, "derived component definition");
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentRef, LifecycleHook};

    #[test]
    fn test_derive_is_idempotent() {
        reset_base();
        let spec = ComponentOptions::new().name("card").into_spec();

        let first = derive(&base(), &spec);
        let counter = next_cid();
        let second = derive(&base(), &spec);

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(next_cid(), counter, "cached derivation must not allocate a cid");
        assert_eq!(spec.cache_len(), 1);
    }

    #[test]
    fn test_cache_is_per_base() {
        reset_base();
        let parent = derive(&base(), &ComponentOptions::new().into_spec());
        let spec = ComponentOptions::new().into_spec();

        let from_base = derive(&base(), &spec);
        let from_parent = derive(&parent, &spec);

        assert!(!Rc::ptr_eq(&from_base, &from_parent));
        assert_ne!(from_base.cid(), from_parent.cid());
        assert_eq!(spec.cache_len(), 2);
        assert_eq!(from_parent.parent().map(|p| p.cid()), Some(parent.cid()));
    }

    #[test]
    fn test_distinct_specs_get_distinct_ordinals() {
        reset_base();
        let a = derive(&base(), &ComponentOptions::new().into_spec());
        let b = derive(&base(), &ComponentOptions::new().into_spec());
        assert_eq!(a.cid(), 1);
        assert_eq!(b.cid(), 2);
    }

    #[test]
    fn test_invalid_name_reported_but_derived() {
        reset_base();
        config::reset_config();
        config::update_config(|c| c.production = false);
        let sink = diagnostics::collect();

        let def = derive(&base(), &ComponentOptions::new().name("1-bad").into_spec());
        assert_eq!(def.name().as_deref(), Some("1-bad"));
        assert!(sink.contains("Invalid component name"));
        diagnostics::reset_sink();
    }

    #[test]
    fn test_base_assets_propagate() {
        reset_base();
        let widget = derive(&base(), &ComponentOptions::new().into_spec());
        base().component("app-widget", &widget);

        let derived = derive(&base(), &ComponentOptions::new().into_spec());
        assert!(matches!(
            derived.options().components.get("app-widget"),
            Some(ComponentRef::Definition(_))
        ));
    }

    #[test]
    fn test_hooks_inherited() {
        reset_base();
        let parent = derive(
            &base(),
            &ComponentOptions::new().hook(LifecycleHook::Mounted, |_| {}).into_spec(),
        );
        let child = derive(
            &parent,
            &ComponentOptions::new().hook(LifecycleHook::Mounted, |_| {}).into_spec(),
        );
        assert_eq!(child.options().hooks_for(LifecycleHook::Mounted).len(), 2);
    }
}
