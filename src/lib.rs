//! # spark-vdom
//!
//! Virtual node tree, component factory and keyed reconciler for reactive UI
//! runtimes.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity: a component's render runs inside an effect, so any
//! signal it reads schedules a re-render.
//!
//! ## Architecture
//!
//! ```text
//! render fn → create_element → VNode tree ─┐
//!                                          ▼
//!   old VNode tree ──────────────► Patcher::patch ──► NodeOps (backing tree)
//!                                          │
//!                                  hook modules (attrs → ref → directives)
//! ```
//!
//! Re-renders never patch inline. The render effect stashes the new tree and
//! queues the instance on the [`Scheduler`]; [`Patcher::flush`] drains the
//! queue parents first.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Value, Key, Namespace, NodeFlags, ElmId)
//! - [`vnode`] - Virtual nodes, node data and the tree builder
//! - [`component`] - Definitions, derivation, instances and assets
//! - [`patch`] - The reconciler and the hook module registry
//! - [`host`] - An in-memory backing tree and the attribute module
//! - [`pipeline`] - Mounting root instances

pub mod component;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod patch;
pub mod pipeline;
pub mod platform;
pub mod reactivity;
pub mod scheduler;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use types::*;

pub use error::{ErrorKind, VdomError};

pub use config::{config, reset_config, set_config, update_config, Config};

pub use vnode::{
    create_element, normalize_children, simple_normalize_children, Child, DataArg,
    DirectiveBinding, NodeData, Tag, TagRef, VNode,
};

pub use component::{
    base, derive, reset_base, reset_cid_counter, AsyncComponent, ComponentDefinition,
    ComponentInstance, ComponentOptions, ComponentRef, DirectiveDef, ExtendSpec, InstanceState,
    PropSpec, RefTarget, RenderContext,
};

pub use patch::{
    same_vnode, HookCx, HookModule, ModulePhase, ModuleRegistry, NodeOps, PatchTarget, Patcher,
    RemoveCallback,
};

pub use host::{AttrsModule, DomOp, MemoryDom};

pub use pipeline::{mount, MountHandle};

pub use scheduler::Scheduler;
