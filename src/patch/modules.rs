//! Hook module registry.
//!
//! A hook module reacts to node lifecycle points while the patcher works:
//! applying attributes, registering refs, running directives. Modules are
//! kept in registration order within their phase, and phases run in order:
//!
//! ```text
//! Platform (attrs, class, style)  →  Base (refs)  →  Directive (always last)
//! ```
//!
//! so directives observe fully applied element state.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::component::{resolve_directive, RefTarget};
use crate::types::ElmId;
use crate::vnode::{DirectiveBinding, VNode};

use super::ops::NodeOps;

/// Deferred work run once the whole tree is inserted.
pub type InsertHook = Box<dyn FnOnce()>;

// =============================================================================
// Hook Context
// =============================================================================

/// What a module callback may touch.
pub struct HookCx<'a, O: NodeOps> {
    pub ops: &'a mut O,
    insert_queue: &'a mut Vec<InsertHook>,
}

impl<'a, O: NodeOps> HookCx<'a, O> {
    pub(crate) fn new(ops: &'a mut O, insert_queue: &'a mut Vec<InsertHook>) -> Self {
        Self { ops, insert_queue }
    }

    /// Run `f` after the tree being patched is in place.
    pub fn on_insert(&mut self, f: impl FnOnce() + 'static) {
        self.insert_queue.push(Box::new(f));
    }
}

// =============================================================================
// Remove Callback
// =============================================================================

/// Counts outstanding holds on a node's physical removal.
///
/// The patcher holds once while it runs the `remove` callbacks. A module that
/// needs the node to stay (an exit transition) calls [`hold`](Self::hold) and
/// later [`release`](Self::release); the node is detached once nobody holds
/// it.
#[derive(Clone)]
pub struct RemoveCallback {
    elm: ElmId,
    holds: Rc<Cell<usize>>,
}

impl RemoveCallback {
    pub(crate) fn new(elm: ElmId) -> Self {
        Self {
            elm,
            holds: Rc::new(Cell::new(1)),
        }
    }

    pub fn elm(&self) -> ElmId {
        self.elm
    }

    pub fn hold(&self) {
        self.holds.set(self.holds.get() + 1);
    }

    pub fn release(&self) {
        self.holds.set(self.holds.get().saturating_sub(1));
    }

    pub fn is_ready(&self) -> bool {
        self.holds.get() == 0
    }
}

// =============================================================================
// Module Trait
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModulePhase {
    Platform,
    Base,
    Directive,
}

/// Lifecycle callbacks. Every callback is optional.
pub trait HookModule<O: NodeOps> {
    fn name(&self) -> &'static str;

    fn phase(&self) -> ModulePhase {
        ModulePhase::Platform
    }

    /// Backing node created with its children, before insertion.
    fn create(&self, _cx: &mut HookCx<'_, O>, _vnode: &VNode) {}

    /// A kept-alive component was put back into the tree.
    fn activate(&self, _cx: &mut HookCx<'_, O>, _vnode: &VNode) {}

    fn update(&self, _cx: &mut HookCx<'_, O>, _old: &VNode, _vnode: &VNode) {}

    /// The node is about to be detached. Hold `rm` to delay that.
    fn remove(&self, _cx: &mut HookCx<'_, O>, _vnode: &VNode, _rm: &RemoveCallback) {}

    fn destroy(&self, _cx: &mut HookCx<'_, O>, _vnode: &VNode) {}
}

// =============================================================================
// Registry
// =============================================================================

pub struct ModuleRegistry<O: NodeOps> {
    modules: Vec<Box<dyn HookModule<O>>>,
}

impl<O: NodeOps> Default for ModuleRegistry<O> {
    fn default() -> Self {
        Self { modules: Vec::new() }
    }
}

impl<O: NodeOps> ModuleRegistry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the ref and directive modules.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RefModule);
        registry.register(DirectivesModule);
        registry
    }

    pub fn register(&mut self, module: impl HookModule<O> + 'static) {
        tracing::debug!(target: "spark_vdom", module = module.name(), "hook module registered");
        self.modules.push(Box::new(module));
        // Stable: registration order holds within a phase.
        self.modules.sort_by_key(|m| m.phase());
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn HookModule<O>> {
        self.modules.iter().map(|m| m.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// =============================================================================
// Ref Module
// =============================================================================

/// Registers `data.ref_name` on the owning instance.
pub struct RefModule;

impl RefModule {
    fn target(vnode: &VNode) -> Option<RefTarget> {
        match &vnode.component_instance {
            Some(instance) => Some(RefTarget::Instance(instance.clone())),
            None => vnode.elm().map(RefTarget::Element),
        }
    }

    fn register(vnode: &VNode) {
        let Some(data) = &vnode.data else { return };
        let (Some(name), Some(context), Some(target)) = (&data.ref_name, vnode.context(), Self::target(vnode)) else {
            return;
        };
        context.register_ref(name, target, data.ref_in_for);
    }

    fn unregister(vnode: &VNode) {
        let Some(name) = vnode.data.as_ref().and_then(|d| d.ref_name.as_ref()) else {
            return;
        };
        if let (Some(context), Some(target)) = (vnode.context(), Self::target(vnode)) {
            context.unregister_ref(name, &target);
        }
    }
}

impl<O: NodeOps> HookModule<O> for RefModule {
    fn name(&self) -> &'static str {
        "ref"
    }

    fn phase(&self) -> ModulePhase {
        ModulePhase::Base
    }

    fn create(&self, _cx: &mut HookCx<'_, O>, vnode: &VNode) {
        Self::register(vnode);
    }

    fn update(&self, _cx: &mut HookCx<'_, O>, old: &VNode, vnode: &VNode) {
        let old_ref = old.data.as_ref().and_then(|d| d.ref_name.as_ref());
        let new_ref = vnode.data.as_ref().and_then(|d| d.ref_name.as_ref());
        let moved = old.elm() != vnode.elm();
        if old_ref != new_ref || moved {
            Self::unregister(old);
            Self::register(vnode);
        }
    }

    fn destroy(&self, _cx: &mut HookCx<'_, O>, vnode: &VNode) {
        Self::unregister(vnode);
    }
}

// =============================================================================
// Directives Module
// =============================================================================

/// Runs `data.directives` through the owning instance's directive assets.
pub struct DirectivesModule;

impl DirectivesModule {
    fn bindings(vnode: &VNode) -> &[DirectiveBinding] {
        vnode.data.as_ref().map(|d| d.directives.as_slice()).unwrap_or_default()
    }

    fn apply<O: NodeOps>(cx: &mut HookCx<'_, O>, old: Option<&VNode>, vnode: Option<&VNode>) {
        let old_bindings = old.map(Self::bindings).unwrap_or_default();
        let new_bindings = vnode.map(Self::bindings).unwrap_or_default();
        if old_bindings.is_empty() && new_bindings.is_empty() {
            return;
        }

        let context = vnode.or(old).and_then(VNode::context);
        let context = context.as_deref();
        let previous: BTreeMap<&str, &DirectiveBinding> =
            old_bindings.iter().map(|b| (b.name.as_str(), b)).collect();

        if let Some(vnode) = vnode {
            let elm = vnode.elm();
            for binding in new_bindings {
                let Some(def) = resolve_directive(context, &binding.name, true) else {
                    continue;
                };
                match previous.get(binding.name.as_str()) {
                    Some(prev) => {
                        let mut binding = binding.clone();
                        binding.old_value = Some(prev.value.clone());
                        if let Some(update) = &def.update {
                            update(elm, &binding);
                        }
                    }
                    None => {
                        if let Some(bind) = &def.bind {
                            bind(elm, binding);
                        }
                        if let Some(inserted) = def.inserted.clone() {
                            let binding = binding.clone();
                            cx.on_insert(move || inserted(elm, &binding));
                        }
                    }
                }
            }
        }

        let elm = old.and_then(VNode::elm);
        for binding in old_bindings {
            let kept = new_bindings.iter().any(|b| b.name == binding.name);
            if kept {
                continue;
            }
            if let Some(unbind) = resolve_directive(context, &binding.name, false).and_then(|d| d.unbind.clone()) {
                unbind(elm, binding);
            }
        }
    }
}

impl<O: NodeOps> HookModule<O> for DirectivesModule {
    fn name(&self) -> &'static str {
        "directives"
    }

    fn phase(&self) -> ModulePhase {
        ModulePhase::Directive
    }

    fn create(&self, cx: &mut HookCx<'_, O>, vnode: &VNode) {
        Self::apply(cx, None, Some(vnode));
    }

    fn update(&self, cx: &mut HookCx<'_, O>, old: &VNode, vnode: &VNode) {
        Self::apply(cx, Some(old), Some(vnode));
    }

    fn destroy(&self, cx: &mut HookCx<'_, O>, vnode: &VNode) {
        Self::apply(cx, Some(vnode), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryDom;

    struct Named(&'static str, ModulePhase);

    impl HookModule<MemoryDom> for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn phase(&self) -> ModulePhase {
            self.1
        }
    }

    #[test]
    fn test_directives_always_last() {
        let mut registry = ModuleRegistry::<MemoryDom>::with_defaults();
        registry.register(Named("attrs", ModulePhase::Platform));
        registry.register(Named("events", ModulePhase::Platform));
        assert_eq!(registry.names(), vec!["attrs", "events", "ref", "directives"]);
    }

    #[test]
    fn test_remove_callback_holds() {
        let mut arena = slotmap::SlotMap::<ElmId, ()>::with_key();
        let rm = RemoveCallback::new(arena.insert(()));
        rm.hold();
        rm.release();
        assert!(!rm.is_ready());
        rm.release();
        assert!(rm.is_ready());
    }
}
