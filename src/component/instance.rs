//! Component instances.
//!
//! An instance is one live use of a definition. It owns its reactive state
//! (props and data as per-key signals), the tree it rendered last
//! (`retained`) and the tree its render effect produced since (`pending`).
//!
//! # Lifecycle
//!
//! ```text
//! Unmounted ──mount──► Mounted ──update──► Updating ──► Mounted ──► … ──► Destroyed
//!                         │                                  ▲
//!                         └──deactivate──► Deactivated ──────┘ (keep-alive)
//! ```
//!
//! The render effect only renders and queues. Patching happens in the
//! patcher while the instance is `Updating`; renders requested meanwhile
//! stash a newer tree and are queued, never run concurrently.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{effect, signal, Signal};

use crate::diagnostics;
use crate::error::VdomError;
use crate::scheduler::Scheduler;
use crate::types::{ElmId, Key, Namespace, Value};
use crate::vnode::{Handler, ScopedSlotFn, VNode};

use super::definition::{resolve_options, Accessor, ComponentDefinition};
use super::options::{ComponentOptions, LifecycleHook};
use super::props::resolve_props;
use super::render::RenderContext;

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Unmounted,
    Mounted,
    Updating,
    Deactivated,
    Destroyed,
}

/// What a ref name points at.
#[derive(Clone)]
pub enum RefTarget {
    Element(ElmId),
    Instance(Rc<ComponentInstance>),
    List(Vec<RefTarget>),
}

impl RefTarget {
    pub fn as_element(&self) -> Option<ElmId> {
        match self {
            RefTarget::Element(elm) => Some(*elm),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Rc<ComponentInstance>> {
        match self {
            RefTarget::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

impl PartialEq for RefTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RefTarget::Element(a), RefTarget::Element(b)) => a == b,
            (RefTarget::Instance(a), RefTarget::Instance(b)) => Rc::ptr_eq(a, b),
            (RefTarget::List(a), RefTarget::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefTarget::Element(elm) => write!(f, "Element({elm:?})"),
            RefTarget::Instance(instance) => write!(f, "Instance({})", instance.uid()),
            RefTarget::List(items) => f.debug_list().entries(items).finish(),
        }
    }
}

/// What a placeholder hands to a new instance.
#[derive(Clone, Default)]
pub struct InstanceInit {
    pub props_data: BTreeMap<String, Value>,
    pub listeners: BTreeMap<String, Handler>,
    /// Slot children.
    pub children: Vec<VNode>,
    pub scoped_slots: BTreeMap<String, ScopedSlotFn>,
    /// Namespace of the placeholder node.
    pub ns: Option<Namespace>,
}

thread_local! {
    static NEXT_UID: Cell<u64> = const { Cell::new(0) };
}

fn allocate_uid() -> u64 {
    NEXT_UID.with(|next| {
        let uid = next.get();
        next.set(uid + 1);
        uid
    })
}

// =============================================================================
// Instance
// =============================================================================

pub struct ComponentInstance {
    uid: u64,
    definition: Rc<ComponentDefinition>,
    options: Rc<ComponentOptions>,
    parent: Option<Weak<ComponentInstance>>,
    self_ref: Weak<ComponentInstance>,
    scheduler: Rc<Scheduler>,

    props: BTreeMap<String, Signal<Value>>,
    data: RefCell<BTreeMap<String, Signal<Value>>>,
    /// Bumped by `force_update`; read by every render.
    version: Signal<u64>,
    listeners: RefCell<BTreeMap<String, Handler>>,
    slot_children: RefCell<Vec<VNode>>,
    scoped_slots: RefCell<BTreeMap<String, ScopedSlotFn>>,
    refs: RefCell<BTreeMap<String, RefTarget>>,
    ns: Option<Namespace>,

    state: Cell<InstanceState>,
    retained: RefCell<Option<VNode>>,
    pending: RefCell<Option<VNode>>,
    el: Cell<Option<ElmId>>,
    stop_render: RefCell<Option<Box<dyn FnOnce()>>>,
    kept_alive: RefCell<HashMap<(u32, Key), Rc<ComponentInstance>>>,
    static_trees: RefCell<Vec<Option<VNode>>>,
}

impl ComponentInstance {
    /// Create an instance. Runs `created` hooks; does not render.
    pub fn new(
        definition: Rc<ComponentDefinition>,
        parent: Option<&Rc<ComponentInstance>>,
        init: InstanceInit,
        scheduler: Rc<Scheduler>,
    ) -> Rc<Self> {
        let options = resolve_options(&definition);
        let parent_ref = parent.map(|p| &**p);
        let props = resolve_props(&options, &init.props_data, parent_ref)
            .into_iter()
            .map(|(key, value)| (key, signal(value)))
            .collect();
        let data = options
            .data
            .as_ref()
            .map(|factory| factory())
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, signal(value)))
            .collect();

        let instance = Rc::new_cyclic(|weak| Self {
            uid: allocate_uid(),
            definition,
            options,
            parent: parent.map(Rc::downgrade),
            self_ref: weak.clone(),
            scheduler,
            props,
            data: RefCell::new(data),
            version: signal(0),
            listeners: RefCell::new(init.listeners),
            slot_children: RefCell::new(init.children),
            scoped_slots: RefCell::new(init.scoped_slots),
            refs: RefCell::new(BTreeMap::new()),
            ns: init.ns,
            state: Cell::new(InstanceState::Unmounted),
            retained: RefCell::new(None),
            pending: RefCell::new(None),
            el: Cell::new(None),
            stop_render: RefCell::new(None),
            kept_alive: RefCell::new(HashMap::new()),
            static_trees: RefCell::new(Vec::new()),
        });
        tracing::trace!(target: "spark_vdom", uid = instance.uid, cid = instance.definition.cid(), "instance created");
        instance.call_hook(LifecycleHook::Created);
        instance
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn definition(&self) -> &Rc<ComponentDefinition> {
        &self.definition
    }

    pub fn options(&self) -> Rc<ComponentOptions> {
        self.options.clone()
    }

    pub fn name(&self) -> Option<String> {
        self.options.name.clone()
    }

    pub fn parent(&self) -> Option<Rc<ComponentInstance>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    /// Namespace inherited from the placeholder this instance renders into.
    pub fn placeholder_ns(&self) -> Option<Namespace> {
        self.ns.clone()
    }

    pub fn state(&self) -> InstanceState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: InstanceState) {
        tracing::trace!(target: "spark_vdom", uid = self.uid, ?state, "instance state");
        self.state.set(state);
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.get() == InstanceState::Destroyed
    }

    // -------------------------------------------------------------------------
    // State Access
    // -------------------------------------------------------------------------

    /// Read a prop, computed property or data entry.
    ///
    /// Inside a render this subscribes the render to the value.
    pub fn get(&self, key: &str) -> Value {
        match self.definition.accessor(key) {
            Some(Accessor::Prop) => {
                if let Some(prop) = self.props.get(key) {
                    return prop.get();
                }
            }
            Some(Accessor::Computed(getter)) => return getter(self),
            None => {}
        }
        self.data
            .borrow()
            .get(key)
            .map(Signal::get)
            .unwrap_or_default()
    }

    /// Write a data entry. Unknown keys are added and force a re-render.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let existing = self.data.borrow().get(key).cloned();
        match existing {
            Some(cell) => {
                cell.set(value);
            }
            None => match self.props.get(key) {
                Some(prop) => {
                    prop.set(value);
                }
                None => {
                    self.data.borrow_mut().insert(key.to_string(), signal(value));
                    self.force_update();
                }
            },
        }
    }

    pub fn prop(&self, key: &str) -> Option<Value> {
        self.props.get(key).map(Signal::get)
    }

    /// Call a method by name.
    pub fn call(&self, method: &str, args: &[Value]) -> Option<Value> {
        let method = self.options.methods.get(method)?.clone();
        Some(method(self, args))
    }

    /// Invoke the parent's listener for `event`.
    pub fn emit(&self, event: &str, payload: &Value) {
        let handler = self.listeners.borrow().get(event).cloned();
        if let Some(handler) = handler {
            handler(payload);
        }
    }

    /// Re-render even though no tracked state changed.
    pub fn force_update(&self) {
        self.version.set(self.version.get().wrapping_add(1));
    }

    // -------------------------------------------------------------------------
    // Placeholder Updates
    // -------------------------------------------------------------------------

    /// Apply new props from a re-rendered placeholder.
    pub(crate) fn update_props(&self, props_data: &BTreeMap<String, Value>) {
        let resolved = resolve_props(&self.options, props_data, self.parent().as_deref());
        for (key, value) in resolved {
            if let Some(cell) = self.props.get(&key) {
                if cell.get() != value {
                    cell.set(value);
                }
            }
        }
    }

    pub(crate) fn update_listeners(&self, listeners: BTreeMap<String, Handler>) {
        *self.listeners.borrow_mut() = listeners;
    }

    /// Replace slot content. Any slot content forces a re-render.
    pub(crate) fn update_slots(&self, children: Vec<VNode>, scoped_slots: BTreeMap<String, ScopedSlotFn>) {
        let had_slots = !self.slot_children.borrow().is_empty() || !self.scoped_slots.borrow().is_empty();
        let has_slots = !children.is_empty() || !scoped_slots.is_empty();
        *self.slot_children.borrow_mut() = children;
        *self.scoped_slots.borrow_mut() = scoped_slots;
        if had_slots || has_slots {
            self.force_update();
        }
    }

    // -------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------

    /// Slot children projected into `name` (`"default"` for unnamed).
    pub fn slot(&self, name: &str) -> Vec<VNode> {
        let children = self.slot_children.borrow();
        let selected: Vec<VNode> = children
            .iter()
            .filter(|child| {
                let slot = child.data.as_ref().and_then(|d| d.slot.as_deref());
                match slot {
                    Some(slot) => slot == name,
                    None => name == "default",
                }
            })
            .cloned()
            .collect();
        // A default slot of only whitespace is empty.
        if name == "default" && selected.iter().all(is_whitespace) {
            return Vec::new();
        }
        selected
    }

    /// Render a scoped slot, falling back to the plain slot.
    pub fn scoped_slot(&self, name: &str, props: &Value) -> Vec<VNode> {
        let provider = self.scoped_slots.borrow().get(name).cloned();
        match provider {
            Some(provider) => provider(props),
            None => self.slot(name),
        }
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.scoped_slots.borrow().contains_key(name) || !self.slot(name).is_empty()
    }

    // -------------------------------------------------------------------------
    // Refs
    // -------------------------------------------------------------------------

    pub fn get_ref(&self, name: &str) -> Option<RefTarget> {
        self.refs.borrow().get(name).cloned()
    }

    pub(crate) fn register_ref(&self, name: &str, target: RefTarget, in_for: bool) {
        let mut refs = self.refs.borrow_mut();
        if !in_for {
            refs.insert(name.to_string(), target);
            return;
        }
        match refs.get_mut(name) {
            Some(RefTarget::List(items)) => {
                if !items.contains(&target) {
                    items.push(target);
                }
            }
            _ => {
                refs.insert(name.to_string(), RefTarget::List(vec![target]));
            }
        }
    }

    pub(crate) fn unregister_ref(&self, name: &str, target: &RefTarget) {
        let mut refs = self.refs.borrow_mut();
        match refs.get_mut(name) {
            Some(RefTarget::List(items)) => items.retain(|item| item != target),
            Some(existing) if existing == target => {
                refs.remove(name);
            }
            _ => {}
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Call the render function once.
    pub fn render(self: &Rc<Self>) -> VNode {
        let _ = self.version.get();
        let Some(render) = self.options.render.clone() else {
            diagnostics::report(&VdomError::MissingRender, Some(self.as_ref()));
            return VNode::empty();
        };
        let cx = RenderContext::new(self);
        render(&cx)
    }

    /// Start the render effect. The first run fills `pending`; later runs
    /// also queue the instance.
    pub(crate) fn start_render(self: &Rc<Self>) {
        if self.stop_render.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let mut first_run = true;
        let stop = effect(move || {
            let Some(instance) = weak.upgrade() else {
                return;
            };
            if instance.is_destroyed() {
                return;
            }
            let vnode = instance.render();
            *instance.pending.borrow_mut() = Some(vnode);
            if first_run {
                first_run = false;
            } else {
                instance.scheduler.queue(&instance);
            }
        });
        *self.stop_render.borrow_mut() = Some(Box::new(stop));

        if self.pending.borrow().is_none() {
            let vnode = self.render();
            *self.pending.borrow_mut() = Some(vnode);
        }
    }

    pub(crate) fn stop_render(&self) {
        if let Some(stop) = self.stop_render.borrow_mut().take() {
            stop();
        }
    }

    pub(crate) fn take_pending(&self) -> Option<VNode> {
        self.pending.borrow_mut().take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub(crate) fn take_retained(&self) -> Option<VNode> {
        self.retained.borrow_mut().take()
    }

    pub(crate) fn set_retained(&self, vnode: VNode) {
        self.el.set(vnode.elm());
        *self.retained.borrow_mut() = Some(vnode);
    }

    /// Inspect the tree rendered last.
    pub fn with_retained<R>(&self, f: impl FnOnce(Option<&VNode>) -> R) -> R {
        f(self.retained.borrow().as_ref())
    }

    /// Root backing handle of the rendered output.
    pub fn el(&self) -> Option<ElmId> {
        self.el.get()
    }

    pub(crate) fn set_el(&self, el: Option<ElmId>) {
        self.el.set(el);
    }

    /// Cached static subtree, rendered on first use.
    pub(crate) fn static_tree(&self, index: usize, render: impl FnOnce() -> VNode) -> VNode {
        if let Some(Some(cached)) = self.static_trees.borrow().get(index) {
            return cached.clone_node();
        }
        let tree = render().mark_static(format!("__static__{index}"), false);
        let mut trees = self.static_trees.borrow_mut();
        if trees.len() <= index {
            trees.resize(index + 1, None);
        }
        trees[index] = Some(tree.clone());
        tree
    }

    // -------------------------------------------------------------------------
    // Hooks and Keep-alive
    // -------------------------------------------------------------------------

    pub fn call_hook(&self, hook: LifecycleHook) {
        for f in self.options.hooks_for(hook).to_vec() {
            f(self);
        }
    }

    pub(crate) fn keep_alive(&self, cid: u32, key: Key, instance: Rc<ComponentInstance>) {
        self.kept_alive.borrow_mut().insert((cid, key), instance);
    }

    pub(crate) fn take_kept_alive(&self, cid: u32, key: &Key) -> Option<Rc<ComponentInstance>> {
        self.kept_alive.borrow_mut().remove(&(cid, key.clone()))
    }

    pub(crate) fn drain_kept_alive(&self) -> Vec<Rc<ComponentInstance>> {
        self.kept_alive.borrow_mut().drain().map(|(_, instance)| instance).collect()
    }

    pub fn kept_alive_count(&self) -> usize {
        self.kept_alive.borrow().len()
    }

    /// Strong handle to this instance.
    pub fn handle(&self) -> Option<Rc<ComponentInstance>> {
        self.self_ref.upgrade()
    }
}

fn is_whitespace(node: &VNode) -> bool {
    (node.is_comment() && !node.is_async_placeholder())
        || (node.is_text() && node.text.as_deref().is_some_and(|t| t.trim().is_empty()))
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("uid", &self.uid)
            .field("cid", &self.definition.cid())
            .field("name", &self.options.name)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{base, reset_base, ExtendSpec, PropSpec};
    use crate::vnode::NodeData;

    fn definition(options: ComponentOptions) -> Rc<ComponentDefinition> {
        base().extend(&ExtendSpec::new(options))
    }

    #[test]
    fn test_state_access() {
        reset_base();
        let def = definition(
            ComponentOptions::new()
                .prop("count", PropSpec::with_default(1))
                .data(|| BTreeMap::from([("label".to_string(), Value::from("x"))]))
                .computed("double", |i| Value::from(i.get("count").to_text().repeat(2))),
        );
        let instance = ComponentInstance::new(def, None, InstanceInit::default(), Scheduler::new());

        assert_eq!(instance.get("count"), Value::from(1));
        assert_eq!(instance.get("label"), Value::from("x"));
        assert_eq!(instance.get("double"), Value::from("11"));
        assert_eq!(instance.get("missing"), Value::Null);

        instance.set("label", "y");
        assert_eq!(instance.get("label"), Value::from("y"));
    }

    #[test]
    fn test_created_hook_runs() {
        reset_base();
        let created = Rc::new(Cell::new(false));
        let flag = created.clone();
        let def = definition(ComponentOptions::new().hook(LifecycleHook::Created, move |_| flag.set(true)));
        let _instance = ComponentInstance::new(def, None, InstanceInit::default(), Scheduler::new());
        assert!(created.get());
    }

    #[test]
    fn test_render_effect_queues_on_change() {
        reset_base();
        let def = definition(
            ComponentOptions::new()
                .data(|| BTreeMap::from([("n".to_string(), Value::from(0))]))
                .render(|cx| cx.text(cx.get("n").to_text())),
        );
        let scheduler = Scheduler::new();
        let instance = ComponentInstance::new(def, None, InstanceInit::default(), scheduler.clone());

        instance.start_render();
        let first = instance.take_pending().expect("first render");
        assert_eq!(first.text_content(), "0");
        assert!(scheduler.is_empty(), "first render is not queued");

        instance.set("n", 5);
        assert!(scheduler.is_queued(instance.uid()));
        let second = instance.take_pending().expect("re-render");
        assert_eq!(second.text_content(), "5");

        instance.stop_render();
    }

    #[test]
    fn test_slots_by_name() {
        reset_base();
        let def = definition(ComponentOptions::new());
        let init = InstanceInit {
            children: vec![
                VNode::element("h1", Some(NodeData::new().slot("header")), vec![]),
                VNode::text("body"),
                VNode::text("  "),
            ],
            ..Default::default()
        };
        let instance = ComponentInstance::new(def, None, init, Scheduler::new());
        assert_eq!(instance.slot("header").len(), 1);
        assert_eq!(instance.slot("default").len(), 2);
        assert!(instance.slot("footer").is_empty());
        assert!(instance.scoped_slot("header", &Value::Null).len() == 1);
    }

    #[test]
    fn test_refs_in_for() {
        reset_base();
        let def = definition(ComponentOptions::new());
        let instance = ComponentInstance::new(def, None, InstanceInit::default(), Scheduler::new());
        let mut arena = slotmap::SlotMap::<ElmId, ()>::with_key();
        let (a, b) = (arena.insert(()), arena.insert(()));

        instance.register_ref("items", RefTarget::Element(a), true);
        instance.register_ref("items", RefTarget::Element(b), true);
        instance.register_ref("items", RefTarget::Element(a), true);
        assert_eq!(
            instance.get_ref("items"),
            Some(RefTarget::List(vec![RefTarget::Element(a), RefTarget::Element(b)]))
        );

        instance.unregister_ref("items", &RefTarget::Element(a));
        assert_eq!(instance.get_ref("items"), Some(RefTarget::List(vec![RefTarget::Element(b)])));
    }

    #[test]
    fn test_missing_render_reported() {
        reset_base();
        crate::config::reset_config();
        crate::config::update_config(|c| c.production = false);
        let sink = diagnostics::collect();
        let instance = ComponentInstance::new(definition(ComponentOptions::new()), None, InstanceInit::default(), Scheduler::new());
        let vnode = instance.render();
        assert!(vnode.is_empty());
        assert!(sink.contains("render function not defined"));
        diagnostics::reset_sink();
    }
}
