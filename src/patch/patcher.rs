//! The reconciliation engine.
//!
//! # Architecture
//!
//! ```text
//! patch(old, new)
//!   ├─ not same ──► create new subtree ──► remove + destroy old subtree
//!   └─ same ──────► patch_vnode
//!                     ├─ module update hooks
//!                     ├─ component? ──► update instance inputs (re-render is queued)
//!                     └─ text or children
//!                          └─ update_children (keyed dual-pointer diff)
//! ```
//!
//! The old tree is consumed; backing handles and component instances move
//! into the new tree. Component placeholders carry no handle of their own:
//! [`VNode::elm`] follows the instance's rendered root.
//!
//! # Re-renders
//!
//! Instances re-render inside their render effect and queue themselves on
//! the [`Scheduler`]. Only [`Patcher::flush`] patches them, one at a time,
//! so no instance's retained tree is ever patched re-entrantly.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::component::{ComponentInstance, InstanceInit, InstanceState, LifecycleHook};
use crate::config;
use crate::diagnostics;
use crate::error::VdomError;
use crate::scheduler::Scheduler;
use crate::types::{ElmId, Key, Value};
use crate::vnode::VNode;

use super::modules::{HookCx, HookModule, InsertHook, ModuleRegistry, RemoveCallback};
use super::ops::NodeOps;

/// Patches of one instance within a single flush before it counts as a loop.
pub const MAX_UPDATE_COUNT: usize = 100;

/// What a new tree is patched against.
pub enum PatchTarget {
    /// Nothing: build a detached tree.
    None,
    /// An existing backing element, replaced by the new tree.
    Mount(ElmId),
    /// The previously rendered tree.
    Node(VNode),
}

// =============================================================================
// Sameness
// =============================================================================

/// Whether `a` can be patched into `b` in place.
pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    if a.key != b.key {
        return false;
    }
    if a.is_async_placeholder() || b.is_async_placeholder() {
        return match (&a.async_factory, &b.async_factory) {
            (Some(fa), Some(fb)) => {
                a.is_async_placeholder() && b.is_async_placeholder() && fa.ptr_eq(fb) && !fb.has_failed()
            }
            _ => false,
        };
    }
    let same_tag = match (&a.tag, &b.tag) {
        (Some(x), Some(y)) => x.same(y),
        (None, None) => true,
        _ => false,
    };
    same_tag
        && a.is_comment() == b.is_comment()
        && a.data.is_some() == b.data.is_some()
        && same_input_type(a, b)
}

fn same_input_type(a: &VNode, b: &VNode) -> bool {
    if a.element_tag() != Some("input") {
        return true;
    }
    let input_type = |v: &VNode| v.data.as_ref().and_then(|d| d.input_type()).map(Value::to_text);
    let (ta, tb) = (input_type(a), input_type(b));
    ta == tb || (is_text_input_type(ta.as_deref()) && is_text_input_type(tb.as_deref()))
}

fn is_text_input_type(input_type: Option<&str>) -> bool {
    matches!(
        input_type,
        Some("text" | "number" | "password" | "search" | "email" | "tel" | "url")
    )
}

// =============================================================================
// Patcher
// =============================================================================

pub struct Patcher<O: NodeOps> {
    ops: O,
    modules: ModuleRegistry<O>,
    scheduler: Rc<Scheduler>,
    insert_queue: Vec<InsertHook>,
    deferred_removals: Vec<RemoveCallback>,
    /// Depth of raw (`pre`) subtrees being created.
    in_pre: usize,
}

impl<O: NodeOps> Patcher<O> {
    /// Patcher with the ref and directive modules.
    pub fn new(ops: O) -> Self {
        Self::with_modules(ops, ModuleRegistry::with_defaults())
    }

    pub fn with_modules(ops: O, modules: ModuleRegistry<O>) -> Self {
        Self {
            ops,
            modules,
            scheduler: Scheduler::new(),
            insert_queue: Vec::new(),
            deferred_removals: Vec::new(),
            in_pre: 0,
        }
    }

    pub fn register_module(&mut self, module: impl HookModule<O> + 'static) {
        self.modules.register(module);
    }

    pub fn modules(&self) -> &ModuleRegistry<O> {
        &self.modules
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    pub fn ops_mut(&mut self) -> &mut O {
        &mut self.ops
    }

    pub fn into_ops(self) -> O {
        self.ops
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    // -------------------------------------------------------------------------
    // Entry Points
    // -------------------------------------------------------------------------

    /// Patch `vnode` against `old` and return it with backing handles set.
    pub fn patch(&mut self, old: PatchTarget, mut vnode: VNode) -> VNode {
        match old {
            PatchTarget::None => self.create_elm(&mut vnode, None, None),
            PatchTarget::Mount(elm) => {
                let parent = self.ops.parent_node(elm);
                let reference = self.ops.next_sibling(elm);
                self.create_elm(&mut vnode, parent, reference);
                if let Some(parent) = parent {
                    self.ops.remove_child(parent, elm);
                }
            }
            PatchTarget::Node(old) => {
                if same_vnode(&old, &vnode) {
                    tracing::trace!(target: "spark_vdom", "patching root in place");
                    self.patch_vnode(old, &mut vnode);
                } else {
                    tracing::trace!(target: "spark_vdom", "replacing root");
                    self.replace(old, &mut vnode);
                }
            }
        }
        self.invoke_insert_hooks();
        vnode
    }

    /// Run destroy hooks over a tree without detaching it.
    pub fn destroy(&mut self, old: VNode) {
        self.invoke_destroy_hook(old);
    }

    /// Patch every queued instance. Returns how many were patched.
    pub fn flush(&mut self) -> usize {
        let mut counts: HashMap<u64, usize> = HashMap::new();
        let mut patched = 0;
        while let Some(instance) = self.scheduler.pop() {
            let count = counts.entry(instance.uid()).or_default();
            *count += 1;
            if *count > MAX_UPDATE_COUNT {
                diagnostics::warn(
                    "You may have an infinite update loop in a component render function.",
                    Some(instance.as_ref()),
                );
                self.scheduler.clear();
                break;
            }
            if self.update_component(&instance) {
                patched += 1;
            }
        }
        self.sweep_removals();
        if patched > 0 {
            tracing::debug!(target: "spark_vdom", patched, "flushed updates");
        }
        patched
    }

    /// Detach nodes whose removal holds have all been released.
    pub fn sweep_removals(&mut self) {
        let ops = &mut self.ops;
        self.deferred_removals.retain(|rm| {
            if !rm.is_ready() {
                return true;
            }
            if let Some(parent) = ops.parent_node(rm.elm()) {
                ops.remove_child(parent, rm.elm());
            }
            false
        });
    }

    pub fn pending_removals(&self) -> usize {
        self.deferred_removals.len()
    }

    // -------------------------------------------------------------------------
    // Root Instances
    // -------------------------------------------------------------------------

    /// Render and mount a root instance onto `target` (or detached).
    pub(crate) fn mount_root(&mut self, instance: &Rc<ComponentInstance>, target: Option<ElmId>) {
        instance.call_hook(LifecycleHook::BeforeMount);
        instance.start_render();
        let root = instance.take_pending().unwrap_or_else(VNode::empty);
        let target = match target {
            Some(elm) => PatchTarget::Mount(elm),
            None => PatchTarget::None,
        };
        let root = self.patch(target, root);
        instance.set_retained(root);
        instance.set_state(InstanceState::Mounted);
        instance.call_hook(LifecycleHook::Mounted);
    }

    /// Destroy a root instance and detach its element.
    pub(crate) fn unmount_root(&mut self, instance: &Rc<ComponentInstance>) {
        let el = instance.el();
        self.destroy_instance(instance);
        if let Some(el) = el {
            self.remove_node(el);
        }
        self.sweep_removals();
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    fn create_elm(&mut self, vnode: &mut VNode, parent: Option<ElmId>, reference: Option<ElmId>) {
        if vnode.is_component() {
            self.create_component(vnode, parent, reference);
            return;
        }

        if let Some(tag) = vnode.element_tag().map(str::to_string) {
            let is_pre = vnode.data.as_ref().is_some_and(|d| d.pre);
            if is_pre {
                self.in_pre += 1;
            }
            if config::is_development() && self.in_pre == 0 && vnode.ns.is_none() && config::is_unknown_element(&tag) {
                let error = VdomError::UnknownElement { tag: tag.clone() };
                diagnostics::report(&error, vnode.context().as_deref());
            }

            let elm = match &vnode.ns {
                Some(ns) => self.ops.create_element_ns(ns, &tag),
                None => self.ops.create_element(&tag),
            };
            vnode.elm = Some(elm);
            self.set_scope(vnode, elm);
            self.create_children(vnode, elm);
            if vnode.data.is_some() {
                self.invoke_create_hooks(vnode);
            }
            self.insert(parent, elm, reference);

            if is_pre {
                self.in_pre -= 1;
            }
        } else if vnode.is_comment() {
            let elm = self.ops.create_comment(vnode.text.as_deref().unwrap_or_default());
            vnode.elm = Some(elm);
            self.insert(parent, elm, reference);
        } else {
            let elm = self.ops.create_text_node(vnode.text.as_deref().unwrap_or_default());
            vnode.elm = Some(elm);
            self.insert(parent, elm, reference);
        }
    }

    fn create_children(&mut self, vnode: &mut VNode, elm: ElmId) {
        if !vnode.children.is_empty() {
            if config::is_development() {
                check_duplicate_keys(&vnode.children);
            }
            for child in vnode.children.iter_mut() {
                self.create_elm(child, Some(elm), None);
            }
        } else if let Some(text) = &vnode.text {
            let text = self.ops.create_text_node(text);
            self.ops.append_child(elm, text);
        }
    }

    fn create_component(&mut self, vnode: &mut VNode, parent: Option<ElmId>, reference: Option<ElmId>) {
        let Some(definition) = vnode.definition().cloned() else {
            return;
        };
        let context = vnode.context();

        if let (Some(ctx), Some((cid, key))) = (&context, keep_alive_slot(vnode)) {
            if let Some(instance) = ctx.take_kept_alive(cid, &key) {
                tracing::debug!(target: "spark_vdom", uid = instance.uid(), "reactivating kept-alive instance");
                self.reactivate_component(vnode, instance, parent, reference);
                return;
            }
        }

        let options = vnode.component_options.take().unwrap_or_default();
        let init = InstanceInit {
            props_data: options.props_data,
            listeners: options.listeners,
            children: options.children,
            scoped_slots: vnode.data.as_ref().map(|d| d.scoped_slots.clone()).unwrap_or_default(),
            ns: vnode.ns.clone(),
        };
        let instance = ComponentInstance::new(definition, context.as_ref(), init, self.scheduler.clone());
        self.mount_instance(&instance);
        vnode.component_instance = Some(instance.clone());

        self.init_component(vnode);
        if let Some(el) = instance.el() {
            self.insert(parent, el, reference);
        }
        self.insert_queue
            .push(Box::new(move || instance.call_hook(LifecycleHook::Mounted)));
    }

    /// Render a child instance into a detached tree.
    fn mount_instance(&mut self, instance: &Rc<ComponentInstance>) {
        instance.call_hook(LifecycleHook::BeforeMount);
        instance.start_render();
        let mut root = instance.take_pending().unwrap_or_else(VNode::empty);
        self.create_elm(&mut root, None, None);
        instance.set_retained(root);
        instance.set_state(InstanceState::Mounted);
    }

    fn init_component(&mut self, vnode: &mut VNode) {
        if vnode.data.is_some() {
            self.invoke_create_hooks(vnode);
        }
    }

    fn reactivate_component(
        &mut self,
        vnode: &mut VNode,
        instance: Rc<ComponentInstance>,
        parent: Option<ElmId>,
        reference: Option<ElmId>,
    ) {
        vnode.component_instance = Some(instance.clone());
        update_child_component(&instance, vnode);
        self.init_component(vnode);
        {
            let Self {
                ops,
                modules,
                insert_queue,
                ..
            } = self;
            let mut cx = HookCx::new(ops, insert_queue);
            for module in modules.iter() {
                module.activate(&mut cx, vnode);
            }
        }
        if let Some(el) = instance.el() {
            self.insert(parent, el, reference);
        }
        self.insert_queue.push(Box::new(move || set_active(&instance, true)));
    }

    fn set_scope(&mut self, vnode: &VNode, elm: ElmId) {
        let scope_id = vnode.context().and_then(|c| c.options().scope_id.clone());
        if let Some(scope_id) = scope_id {
            self.ops.set_style_scope(elm, &scope_id);
        }
    }

    fn insert(&mut self, parent: Option<ElmId>, elm: ElmId, reference: Option<ElmId>) {
        let Some(parent) = parent else {
            return;
        };
        match reference {
            Some(reference) if self.ops.parent_node(reference) == Some(parent) => {
                self.ops.insert_before(parent, elm, Some(reference));
            }
            _ => self.ops.append_child(parent, elm),
        }
    }

    fn add_vnodes(&mut self, parent: ElmId, reference: Option<ElmId>, vnodes: &mut [VNode]) {
        for vnode in vnodes {
            self.create_elm(vnode, Some(parent), reference);
        }
    }

    fn replace(&mut self, old: VNode, vnode: &mut VNode) {
        let old_elm = old.elm();
        let parent = old_elm.and_then(|e| self.ops.parent_node(e));
        let reference = old_elm.and_then(|e| self.ops.next_sibling(e));
        self.create_elm(vnode, parent, reference);
        if parent.is_some() {
            self.remove_vnodes(vec![old]);
        } else {
            self.invoke_destroy_hook(old);
        }
    }

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    fn invoke_create_hooks(&mut self, vnode: &VNode) {
        let Self {
            ops,
            modules,
            insert_queue,
            ..
        } = self;
        let mut cx = HookCx::new(ops, insert_queue);
        for module in modules.iter() {
            module.create(&mut cx, vnode);
        }
        if let Some(data) = &vnode.data {
            let elm = vnode.elm();
            if let Some(create) = &data.hook.create {
                create(elm);
            }
            if let Some(insert) = data.hook.insert.clone() {
                cx.on_insert(move || insert(elm));
            }
        }
    }

    fn invoke_update_hooks(&mut self, old: &VNode, vnode: &VNode) {
        let Self {
            ops,
            modules,
            insert_queue,
            ..
        } = self;
        let mut cx = HookCx::new(ops, insert_queue);
        for module in modules.iter() {
            module.update(&mut cx, old, vnode);
        }
        if let Some(update) = vnode.data.as_ref().and_then(|d| d.hook.update.clone()) {
            update(vnode.elm());
        }
    }

    fn invoke_insert_hooks(&mut self) {
        for hook in std::mem::take(&mut self.insert_queue) {
            hook();
        }
    }

    // -------------------------------------------------------------------------
    // Patching
    // -------------------------------------------------------------------------

    fn patch_vnode(&mut self, old: VNode, vnode: &mut VNode) {
        vnode.elm = old.elm;

        // Two placeholders for the same pending component.
        if old.is_async_placeholder() {
            return;
        }

        if vnode.is_static() && old.is_static() && vnode.key == old.key && (vnode.is_cloned() || vnode.is_once()) {
            vnode.component_instance = old.component_instance;
            vnode.children = old.children;
            return;
        }

        if vnode.is_component() {
            if let Some(instance) = old.component_instance.clone() {
                vnode.component_instance = Some(instance.clone());
                update_child_component(&instance, vnode);
            }
            if vnode.data.is_some() {
                self.invoke_update_hooks(&old, vnode);
            }
            return;
        }

        if vnode.data.is_some() {
            self.invoke_update_hooks(&old, vnode);
        }
        let Some(elm) = vnode.elm else {
            return;
        };

        let VNode {
            children: old_children,
            text: old_text,
            ..
        } = old;

        match vnode.text.clone() {
            None => {
                if !vnode.children.is_empty() && !old_children.is_empty() {
                    self.update_children(elm, old_children, &mut vnode.children);
                } else if !vnode.children.is_empty() {
                    if config::is_development() {
                        check_duplicate_keys(&vnode.children);
                    }
                    if old_text.is_some() {
                        self.ops.set_text_content(elm, "");
                    }
                    self.add_vnodes(elm, None, &mut vnode.children);
                } else if !old_children.is_empty() {
                    self.remove_vnodes(old_children);
                } else if old_text.is_some() {
                    self.ops.set_text_content(elm, "");
                }
            }
            Some(text) => {
                if old_text.as_deref() != Some(text.as_str()) {
                    for child in old_children {
                        self.invoke_destroy_hook(child);
                    }
                    self.ops.set_text_content(elm, &text);
                }
            }
        }
    }

    /// Keyed dual-pointer diff. End indices are exclusive.
    fn update_children(&mut self, parent: ElmId, old_children: Vec<VNode>, new_children: &mut [VNode]) {
        if config::is_development() {
            check_duplicate_keys(new_children);
        }

        let mut old: Vec<Option<VNode>> = old_children.into_iter().map(Some).collect();
        let (mut old_start, mut old_end) = (0, old.len());
        let (mut new_start, mut new_end) = (0, new_children.len());
        let mut key_map: Option<HashMap<Key, usize>> = None;

        while old_start < old_end && new_start < new_end {
            let (Some(old_first), Some(old_last)) = (old[old_start].as_ref(), old[old_end - 1].as_ref()) else {
                // Consumed by a keyed match.
                if old[old_start].is_none() {
                    old_start += 1;
                } else {
                    old_end -= 1;
                }
                continue;
            };

            if same_vnode(old_first, &new_children[new_start]) {
                if let Some(prev) = old[old_start].take() {
                    self.patch_vnode(prev, &mut new_children[new_start]);
                }
                old_start += 1;
                new_start += 1;
            } else if same_vnode(old_last, &new_children[new_end - 1]) {
                if let Some(prev) = old[old_end - 1].take() {
                    self.patch_vnode(prev, &mut new_children[new_end - 1]);
                }
                old_end -= 1;
                new_end -= 1;
            } else if same_vnode(old_first, &new_children[new_end - 1]) {
                // Moved right.
                let reference = old_last.elm().and_then(|e| self.ops.next_sibling(e));
                if let Some(prev) = old[old_start].take() {
                    self.patch_vnode(prev, &mut new_children[new_end - 1]);
                }
                if let Some(elm) = new_children[new_end - 1].elm() {
                    self.ops.insert_before(parent, elm, reference);
                }
                old_start += 1;
                new_end -= 1;
            } else if same_vnode(old_last, &new_children[new_start]) {
                // Moved left.
                let reference = old_first.elm();
                if let Some(prev) = old[old_end - 1].take() {
                    self.patch_vnode(prev, &mut new_children[new_start]);
                }
                if let Some(elm) = new_children[new_start].elm() {
                    self.ops.insert_before(parent, elm, reference);
                }
                old_end -= 1;
                new_start += 1;
            } else {
                let reference = old_first.elm();
                let map = key_map.get_or_insert_with(|| build_key_map(&old, old_start, old_end));
                let found = new_children[new_start]
                    .key
                    .as_ref()
                    .and_then(|key| map.get(key).copied())
                    .filter(|&i| old[i].as_ref().is_some_and(|o| same_vnode(o, &new_children[new_start])));
                match found.and_then(|i| old[i].take()) {
                    Some(prev) => {
                        self.patch_vnode(prev, &mut new_children[new_start]);
                        if let Some(elm) = new_children[new_start].elm() {
                            self.ops.insert_before(parent, elm, reference);
                        }
                    }
                    None => self.create_elm(&mut new_children[new_start], Some(parent), reference),
                }
                new_start += 1;
            }
        }

        if old_start >= old_end {
            let reference = new_children.get(new_end).and_then(VNode::elm);
            self.add_vnodes(parent, reference, &mut new_children[new_start..new_end]);
        } else if new_start >= new_end {
            let rest: Vec<VNode> = old[old_start..old_end].iter_mut().filter_map(Option::take).collect();
            self.remove_vnodes(rest);
        }
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Patch one queued instance. Returns whether it was patched.
    fn update_component(&mut self, instance: &Rc<ComponentInstance>) -> bool {
        if instance.state() != InstanceState::Mounted {
            return false;
        }
        let Some(mut next) = instance.take_pending() else {
            return false;
        };

        tracing::trace!(target: "spark_vdom", uid = instance.uid(), "updating instance");
        instance.set_state(InstanceState::Updating);
        instance.call_hook(LifecycleHook::BeforeUpdate);

        match instance.take_retained() {
            Some(prev) if same_vnode(&prev, &next) => self.patch_vnode(prev, &mut next),
            Some(prev) => self.replace(prev, &mut next),
            None => self.create_elm(&mut next, None, None),
        }

        let previous_el = instance.el();
        instance.set_retained(next);
        if instance.el() != previous_el {
            propagate_el(instance);
        }
        instance.set_state(InstanceState::Mounted);
        self.invoke_insert_hooks();
        instance.call_hook(LifecycleHook::Updated);
        true
    }

    fn destroy_instance(&mut self, instance: &Rc<ComponentInstance>) {
        if instance.is_destroyed() {
            return;
        }
        tracing::trace!(target: "spark_vdom", uid = instance.uid(), "destroying instance");
        instance.call_hook(LifecycleHook::BeforeDestroy);
        instance.stop_render();
        if let Some(root) = instance.take_retained() {
            self.invoke_destroy_hook(root);
        }
        for kept in instance.drain_kept_alive() {
            self.destroy_instance(&kept);
        }
        instance.set_state(InstanceState::Destroyed);
        instance.call_hook(LifecycleHook::Destroyed);
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    fn remove_vnodes(&mut self, vnodes: Vec<VNode>) {
        for vnode in vnodes {
            if vnode.tag.is_some() {
                self.remove_and_invoke_remove_hook(&vnode);
                self.invoke_destroy_hook(vnode);
            } else if let Some(elm) = vnode.elm {
                self.remove_node(elm);
            }
        }
    }

    fn remove_and_invoke_remove_hook(&mut self, vnode: &VNode) {
        let Some(elm) = vnode.elm() else {
            return;
        };
        let rm = RemoveCallback::new(elm);
        self.invoke_remove_hooks(vnode, &rm);
        rm.release();
        if rm.is_ready() {
            self.remove_node(elm);
        } else {
            self.deferred_removals.push(rm);
        }
    }

    fn invoke_remove_hooks(&mut self, vnode: &VNode, rm: &RemoveCallback) {
        if let Some(instance) = vnode.component_instance.clone() {
            instance.with_retained(|root| {
                if let Some(root) = root.filter(|r| r.data.is_some()) {
                    self.invoke_remove_hooks(root, rm);
                }
            });
        }
        if vnode.data.is_some() {
            let Self {
                ops,
                modules,
                insert_queue,
                ..
            } = self;
            let mut cx = HookCx::new(ops, insert_queue);
            for module in modules.iter() {
                module.remove(&mut cx, vnode, rm);
            }
        }
    }

    fn invoke_destroy_hook(&mut self, vnode: VNode) {
        if let Some(data) = &vnode.data {
            if let Some(instance) = &vnode.component_instance {
                match keep_alive_slot(&vnode).zip(vnode.context()) {
                    Some(((cid, key), ctx)) if !ctx.is_destroyed() => {
                        set_active(instance, false);
                        ctx.keep_alive(cid, key, instance.clone());
                    }
                    _ => self.destroy_instance(instance),
                }
            }
            if let Some(destroy) = &data.hook.destroy {
                destroy(vnode.elm());
            }
            let Self {
                ops,
                modules,
                insert_queue,
                ..
            } = self;
            let mut cx = HookCx::new(ops, insert_queue);
            for module in modules.iter() {
                module.destroy(&mut cx, &vnode);
            }
        }
        for child in vnode.children {
            self.invoke_destroy_hook(child);
        }
    }

    fn remove_node(&mut self, elm: ElmId) {
        if let Some(parent) = self.ops.parent_node(elm) {
            self.ops.remove_child(parent, elm);
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Hand a re-rendered placeholder's inputs to its existing instance.
fn update_child_component(instance: &Rc<ComponentInstance>, vnode: &mut VNode) {
    let options = vnode.component_options.take().unwrap_or_default();
    let scoped_slots = vnode.data.as_ref().map(|d| d.scoped_slots.clone()).unwrap_or_default();
    instance.update_props(&options.props_data);
    instance.update_listeners(options.listeners);
    instance.update_slots(options.children, scoped_slots);
}

/// Cache slot of a kept-alive placeholder: definition id and key.
fn keep_alive_slot(vnode: &VNode) -> Option<(u32, Key)> {
    let data = vnode.data.as_ref()?;
    if !data.keep_alive {
        return None;
    }
    Some((vnode.definition()?.cid(), vnode.key.clone()?))
}

/// Instances rendered directly in `instance`'s tree (not nested deeper).
fn child_instances(instance: &ComponentInstance) -> Vec<Rc<ComponentInstance>> {
    fn collect(vnode: &VNode, out: &mut Vec<Rc<ComponentInstance>>) {
        match &vnode.component_instance {
            Some(child) => out.push(child.clone()),
            None => vnode.children.iter().for_each(|c| collect(c, out)),
        }
    }
    let mut out = Vec::new();
    instance.with_retained(|root| {
        if let Some(root) = root {
            collect(root, &mut out);
        }
    });
    out
}

/// Deactivate or reactivate a kept-alive subtree, children first.
fn set_active(instance: &Rc<ComponentInstance>, active: bool) {
    let (state, hook) = if active {
        (InstanceState::Mounted, LifecycleHook::Activated)
    } else {
        (InstanceState::Deactivated, LifecycleHook::Deactivated)
    };
    instance.set_state(state);
    for child in child_instances(instance) {
        set_active(&child, active);
    }
    instance.call_hook(hook);
    if active && instance.has_pending() {
        instance.scheduler().queue(instance);
    }
}

/// Point ancestors whose root is this instance at its new element.
fn propagate_el(instance: &Rc<ComponentInstance>) {
    let mut current = instance.clone();
    while let Some(parent) = current.parent() {
        let is_root = parent.with_retained(|root| {
            root.and_then(|r| r.component_instance.as_ref())
                .is_some_and(|c| Rc::ptr_eq(c, &current))
        });
        if !is_root {
            break;
        }
        parent.set_el(current.el());
        current = parent;
    }
}

fn build_key_map(old: &[Option<VNode>], start: usize, end: usize) -> HashMap<Key, usize> {
    (start..end)
        .filter_map(|i| {
            let key = old[i].as_ref()?.key.clone()?;
            Some((key, i))
        })
        .collect()
}

fn check_duplicate_keys(children: &[VNode]) {
    let mut seen = HashSet::new();
    for child in children {
        let Some(key) = &child.key else { continue };
        if !seen.insert(key) {
            let error = VdomError::DuplicateKey { key: key.clone() };
            diagnostics::report(&error, child.context().as_deref());
        }
    }
}
