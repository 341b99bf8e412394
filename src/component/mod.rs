//! Component definitions and instances.
//!
//! # Architecture
//!
//! ```text
//! ComponentOptions ──derive──► ComponentDefinition ──new──► ComponentInstance
//!   (declarative)              (cid, merged options)        (signals, render effect)
//! ```
//!
//! - [`extend`] - derivation with a per-spec cache and the identity counter
//! - [`merge`] - configuration merge strategies
//! - [`definition`] - definitions and stale-option re-resolution
//! - [`instance`] - live instances and their render effect
//! - [`assets`] - component and directive lookup
//! - [`props`] - prop extraction and defaults
//! - [`async_component`] - components that resolve later

pub mod assets;
pub mod async_component;
pub mod definition;
pub mod extend;
pub mod instance;
pub mod merge;
pub mod name;
pub mod options;
pub mod props;
pub mod render;

pub use assets::{lookup, resolve_component, resolve_directive, AssetCategory};
pub use async_component::{AsyncComponent, AsyncState};
pub use definition::{resolve_options, Accessor, ComponentDefinition};
pub use extend::{base, derive, next_cid, reset_base, reset_cid_counter, ExtendSpec};
pub use instance::{ComponentInstance, InstanceInit, InstanceState, RefTarget};
pub use merge::{merge_data_maps, merge_options};
pub use name::{camelize, capitalize, hyphenate, validate_component_name};
pub use options::{
    ComponentOptions, ComponentRef, ComputedFn, DataFn, DirectiveDef, DirectiveHook, HookFn,
    LifecycleHook, MethodFn, PropSpec, RenderFn,
};
pub use props::{extract_props, resolve_props};
pub use render::RenderContext;
