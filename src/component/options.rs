//! Component configuration.
//!
//! `ComponentOptions` is the declarative description a definition is derived
//! from: props, data, computed properties, methods, the render function,
//! lifecycle hooks and local asset registries. Merged options are shared
//! behind `Rc` and never mutated; changes produce a new `Rc`.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::types::{ElmId, Value};
use crate::vnode::{DirectiveBinding, VNode};

use super::async_component::AsyncComponent;
use super::definition::ComponentDefinition;
use super::extend::ExtendSpec;
use super::instance::ComponentInstance;
use super::render::RenderContext;

// =============================================================================
// Callback Types
// =============================================================================

/// Render function: instance state in, tree out.
pub type RenderFn = Rc<dyn Fn(&RenderContext) -> VNode>;

/// Initial data factory. Called once per instance.
pub type DataFn = Rc<dyn Fn() -> BTreeMap<String, Value>>;

/// Computed property getter.
pub type ComputedFn = Rc<dyn Fn(&ComponentInstance) -> Value>;

/// Method callable through [`ComponentInstance::call`].
pub type MethodFn = Rc<dyn Fn(&ComponentInstance, &[Value]) -> Value>;

/// Lifecycle hook.
pub type HookFn = Rc<dyn Fn(&ComponentInstance)>;

/// Directive hook: backing handle and binding.
pub type DirectiveHook = Rc<dyn Fn(Option<ElmId>, &DirectiveBinding)>;

// =============================================================================
// Lifecycle
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleHook {
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    Activated,
    Deactivated,
    BeforeDestroy,
    Destroyed,
}

// =============================================================================
// Props and Directives
// =============================================================================

/// Declared prop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropSpec {
    pub default: Option<Value>,
    pub required: bool,
}

impl PropSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(default: impl Into<Value>) -> Self {
        Self {
            default: Some(default.into()),
            required: false,
        }
    }

    pub fn required() -> Self {
        Self {
            default: None,
            required: true,
        }
    }
}

/// Directive definition, registered as an asset.
#[derive(Clone, Default)]
pub struct DirectiveDef {
    /// First bound to an element.
    pub bind: Option<DirectiveHook>,
    /// Element inserted into the tree.
    pub inserted: Option<DirectiveHook>,
    /// Containing node patched.
    pub update: Option<DirectiveHook>,
    /// Removed from the element.
    pub unbind: Option<DirectiveHook>,
}

// =============================================================================
// Component Reference
// =============================================================================

/// A registered component asset.
#[derive(Clone)]
pub enum ComponentRef {
    Definition(Rc<ComponentDefinition>),
    /// Derived from the base on first use.
    Spec(Rc<ExtendSpec>),
    /// A definition registered under its own name.
    SelfRef(Weak<ComponentDefinition>),
    Async(AsyncComponent),
}

impl From<Rc<ComponentDefinition>> for ComponentRef {
    fn from(def: Rc<ComponentDefinition>) -> Self {
        ComponentRef::Definition(def)
    }
}

impl From<&Rc<ComponentDefinition>> for ComponentRef {
    fn from(def: &Rc<ComponentDefinition>) -> Self {
        ComponentRef::Definition(def.clone())
    }
}

impl From<Rc<ExtendSpec>> for ComponentRef {
    fn from(spec: Rc<ExtendSpec>) -> Self {
        ComponentRef::Spec(spec)
    }
}

impl From<AsyncComponent> for ComponentRef {
    fn from(factory: AsyncComponent) -> Self {
        ComponentRef::Async(factory)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentRef::Definition(def) => write!(f, "Definition({})", def.cid()),
            ComponentRef::Spec(_) => write!(f, "Spec(..)"),
            ComponentRef::SelfRef(_) => write!(f, "SelfRef(..)"),
            ComponentRef::Async(_) => write!(f, "Async(..)"),
        }
    }
}

// =============================================================================
// Options
// =============================================================================

#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub name: Option<String>,
    pub props: BTreeMap<String, PropSpec>,
    pub data: Option<DataFn>,
    pub computed: BTreeMap<String, ComputedFn>,
    pub methods: BTreeMap<String, MethodFn>,
    pub render: Option<RenderFn>,
    pub hooks: BTreeMap<LifecycleHook, Vec<HookFn>>,
    pub components: BTreeMap<String, ComponentRef>,
    pub directives: BTreeMap<String, Rc<DirectiveDef>>,
    /// Folded into the parent side before these options when merging.
    pub extends: Option<Box<ComponentOptions>>,
    pub mixins: Vec<ComponentOptions>,
    /// Scoped style id applied to every element this component renders.
    pub scope_id: Option<String>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, spec: PropSpec) -> Self {
        self.props.insert(name.into(), spec);
        self
    }

    pub fn data(mut self, data: impl Fn() -> BTreeMap<String, Value> + 'static) -> Self {
        self.data = Some(Rc::new(data));
        self
    }

    pub fn computed(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&ComponentInstance) -> Value + 'static,
    ) -> Self {
        self.computed.insert(name.into(), Rc::new(getter));
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&ComponentInstance, &[Value]) -> Value + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    pub fn render(mut self, render: impl Fn(&RenderContext) -> VNode + 'static) -> Self {
        self.render = Some(Rc::new(render));
        self
    }

    pub fn hook(mut self, hook: LifecycleHook, f: impl Fn(&ComponentInstance) + 'static) -> Self {
        self.hooks.entry(hook).or_default().push(Rc::new(f));
        self
    }

    pub fn component(mut self, name: impl Into<String>, component: impl Into<ComponentRef>) -> Self {
        self.components.insert(name.into(), component.into());
        self
    }

    pub fn directive(mut self, name: impl Into<String>, def: DirectiveDef) -> Self {
        self.directives.insert(name.into(), Rc::new(def));
        self
    }

    pub fn extends(mut self, base: ComponentOptions) -> Self {
        self.extends = Some(Box::new(base));
        self
    }

    pub fn mixin(mut self, mixin: ComponentOptions) -> Self {
        self.mixins.push(mixin);
        self
    }

    pub fn scope_id(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = Some(scope_id.into());
        self
    }

    /// Hooks registered for a lifecycle point, in run order.
    pub fn hooks_for(&self, hook: LifecycleHook) -> &[HookFn] {
        self.hooks.get(&hook).map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Debug for ComponentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("has_render", &self.render.is_some())
            .field("components", &self.components)
            .field("directives", &self.directives.keys().collect::<Vec<_>>())
            .field("scope_id", &self.scope_id)
            .finish_non_exhaustive()
    }
}
