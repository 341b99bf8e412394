//! Component definitions.
//!
//! A `ComponentDefinition` describes a component "class": a unique identity
//! ordinal (`cid`), the merged configuration, and the definition it was
//! derived from. Inheritance is explicit: each derived definition holds its
//! parent and a snapshot of the parent's configuration at derivation time.
//!
//! # Staleness
//!
//! Configuration is shared as `Rc<ComponentOptions>` and replaced, never
//! mutated. When a parent's configuration is replaced after derivation
//! (a global mixin, a late asset registration), [`resolve_options`] notices
//! the identity change at instantiation and re-merges.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::extend::{derive, ExtendSpec};
use super::merge::merge_options;
use super::options::{ComponentOptions, ComponentRef, ComputedFn, DirectiveDef};

/// Precomputed property access for instances of a definition.
#[derive(Clone)]
pub enum Accessor {
    Prop,
    Computed(ComputedFn),
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Prop => write!(f, "Prop"),
            Accessor::Computed(_) => write!(f, "Computed"),
        }
    }
}

pub struct ComponentDefinition {
    cid: u32,
    options: RefCell<Rc<ComponentOptions>>,
    parent: Option<Rc<ComponentDefinition>>,
    /// Parent configuration seen at derivation (or last re-resolution).
    super_options: RefCell<Option<Rc<ComponentOptions>>>,
    /// The extension configuration this definition was derived with.
    extend_options: ComponentOptions,
    /// Merged configuration as first produced.
    sealed_options: Rc<ComponentOptions>,
    /// Configuration applied to this definition after derivation.
    local_mixins: RefCell<Vec<ComponentOptions>>,
    accessors: RefCell<Rc<HashMap<String, Accessor>>>,
    self_ref: Weak<ComponentDefinition>,
}

impl ComponentDefinition {
    /// The root definition everything derives from.
    pub(crate) fn new_base(options: ComponentOptions) -> Rc<Self> {
        let options = Rc::new(options);
        Rc::new_cyclic(|weak| Self {
            cid: 0,
            accessors: RefCell::new(Rc::new(build_accessors(&options))),
            options: RefCell::new(options.clone()),
            parent: None,
            super_options: RefCell::new(None),
            extend_options: ComponentOptions::default(),
            sealed_options: options,
            local_mixins: RefCell::new(Vec::new()),
            self_ref: weak.clone(),
        })
    }

    pub(crate) fn new_derived(
        cid: u32,
        parent: Rc<ComponentDefinition>,
        super_options: Rc<ComponentOptions>,
        extend_options: ComponentOptions,
        mut merged: ComponentOptions,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak| {
            register_self(&mut merged, weak);
            let options = Rc::new(merged);
            Self {
                cid,
                accessors: RefCell::new(Rc::new(build_accessors(&options))),
                options: RefCell::new(options.clone()),
                parent: Some(parent),
                super_options: RefCell::new(Some(super_options)),
                extend_options,
                sealed_options: options,
                local_mixins: RefCell::new(Vec::new()),
                self_ref: weak.clone(),
            }
        })
    }

    pub fn cid(&self) -> u32 {
        self.cid
    }

    pub fn name(&self) -> Option<String> {
        self.options.borrow().name.clone()
    }

    /// Current merged configuration.
    pub fn options(&self) -> Rc<ComponentOptions> {
        self.options.borrow().clone()
    }

    pub fn parent(&self) -> Option<&Rc<ComponentDefinition>> {
        self.parent.as_ref()
    }

    pub fn super_options(&self) -> Option<Rc<ComponentOptions>> {
        self.super_options.borrow().clone()
    }

    pub fn extend_options(&self) -> &ComponentOptions {
        &self.extend_options
    }

    pub fn sealed_options(&self) -> Rc<ComponentOptions> {
        self.sealed_options.clone()
    }

    /// Accessor for a declared prop or computed property.
    pub fn accessor(&self, key: &str) -> Option<Accessor> {
        self.accessors.borrow().get(key).cloned()
    }

    pub fn accessors(&self) -> Rc<HashMap<String, Accessor>> {
        self.accessors.borrow().clone()
    }

    /// Derive a new definition from this one.
    pub fn extend(self: &Rc<Self>, spec: &Rc<ExtendSpec>) -> Rc<ComponentDefinition> {
        derive(self, spec)
    }

    /// Merge extra configuration into this definition.
    ///
    /// Replaces the configuration, so definitions derived from this one
    /// re-resolve on their next instantiation.
    pub fn mixin(&self, mixin: ComponentOptions) {
        let merged = merge_options(&self.options(), &mixin);
        self.local_mixins.borrow_mut().push(mixin);
        self.set_options(merged);
    }

    /// Register a component asset on this definition.
    ///
    /// The name is validated by the merge.
    pub fn component(&self, name: impl Into<String>, component: impl Into<ComponentRef>) {
        self.mixin(ComponentOptions::new().component(name, component));
    }

    /// Register a directive asset on this definition.
    pub fn directive(&self, name: impl Into<String>, def: DirectiveDef) {
        self.mixin(ComponentOptions::new().directive(name, def));
    }

    fn set_options(&self, mut options: ComponentOptions) {
        register_self(&mut options, &self.self_ref);
        let options = Rc::new(options);
        *self.accessors.borrow_mut() = Rc::new(build_accessors(&options));
        *self.options.borrow_mut() = options;
    }
}

/// A named definition can refer to itself by name in its own tree.
fn register_self(options: &mut ComponentOptions, weak: &Weak<ComponentDefinition>) {
    if let Some(name) = options.name.clone() {
        options.components.insert(name, ComponentRef::SelfRef(weak.clone()));
    }
}

fn build_accessors(options: &ComponentOptions) -> HashMap<String, Accessor> {
    let mut accessors = HashMap::with_capacity(options.props.len() + options.computed.len());
    for name in options.props.keys() {
        accessors.insert(name.clone(), Accessor::Prop);
    }
    for (name, getter) in &options.computed {
        accessors
            .entry(name.clone())
            .or_insert_with(|| Accessor::Computed(getter.clone()));
    }
    accessors
}

/// Current configuration of `def`, re-merged if an ancestor changed.
pub fn resolve_options(def: &ComponentDefinition) -> Rc<ComponentOptions> {
    let Some(parent) = def.parent() else {
        return def.options();
    };
    let super_options = resolve_options(parent);
    let unchanged = def
        .super_options
        .borrow()
        .as_ref()
        .is_some_and(|cached| Rc::ptr_eq(cached, &super_options));
    if unchanged {
        return def.options();
    }

    tracing::debug!(target: "spark_vdom", cid = def.cid, "parent options changed, re-resolving");
    *def.super_options.borrow_mut() = Some(super_options.clone());
    let mut merged = merge_options(&super_options, &def.extend_options);
    for mixin in def.local_mixins.borrow().iter() {
        merged = merge_options(&merged, mixin);
    }
    def.set_options(merged);
    def.options()
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("cid", &self.cid)
            .field("name", &self.name())
            .field("parent", &self.parent.as_ref().map(|p| p.cid))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{base, reset_base, PropSpec};
    use crate::types::Value;

    #[test]
    fn test_accessors_precomputed() {
        reset_base();
        let spec = ExtendSpec::new(
            ComponentOptions::new()
                .prop("title", PropSpec::new())
                .computed("shout", |_| Value::from("!")),
        );
        let def = base().extend(&spec);
        assert!(matches!(def.accessor("title"), Some(Accessor::Prop)));
        assert!(matches!(def.accessor("shout"), Some(Accessor::Computed(_))));
        assert!(def.accessor("missing").is_none());
    }

    #[test]
    fn test_self_registration() {
        reset_base();
        let spec = ExtendSpec::new(ComponentOptions::new().name("tree-node"));
        let def = base().extend(&spec);
        let options = def.options();
        match options.components.get("tree-node") {
            Some(ComponentRef::SelfRef(weak)) => {
                let upgraded = weak.upgrade().expect("self reference alive");
                assert!(Rc::ptr_eq(&upgraded, &def));
            }
            other => panic!("expected self reference, got {other:?}"),
        }
    }

    #[test]
    fn test_parent_mixin_triggers_reresolve() {
        reset_base();
        let parent = base().extend(&ExtendSpec::new(ComponentOptions::new().prop("a", PropSpec::new())));
        let child = parent.extend(&ExtendSpec::new(ComponentOptions::new().prop("b", PropSpec::new())));
        let before = child.options();

        parent.mixin(ComponentOptions::new().prop("late", PropSpec::new()));
        let resolved = resolve_options(&child);

        assert!(!Rc::ptr_eq(&before, &resolved));
        assert!(resolved.props.contains_key("late"));
        assert!(resolved.props.contains_key("b"));
        assert!(child.accessor("late").is_some());

        // Second resolution is a no-op.
        let again = resolve_options(&child);
        assert!(Rc::ptr_eq(&again, &resolved));
    }

    #[test]
    fn test_local_mixin_survives_reresolve() {
        reset_base();
        let child = base().extend(&ExtendSpec::new(ComponentOptions::new()));
        child.mixin(ComponentOptions::new().prop("own", PropSpec::new()));
        base().mixin(ComponentOptions::new().prop("global", PropSpec::new()));

        let resolved = resolve_options(&child);
        assert!(resolved.props.contains_key("own"));
        assert!(resolved.props.contains_key("global"));
        // Derivation snapshot is kept.
        assert!(!child.sealed_options().props.contains_key("own"));
    }
}
