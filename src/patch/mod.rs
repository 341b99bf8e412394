//! Reconciliation engine.
//!
//! - [`ops`] - the backing-tree operations the engine drives
//! - [`modules`] - the hook module registry and the built-in modules
//! - [`patcher`] - patching, the children diff and component lifecycles

pub mod modules;
pub mod ops;
pub mod patcher;

pub use modules::{
    DirectivesModule, HookCx, HookModule, InsertHook, ModulePhase, ModuleRegistry, RefModule,
    RemoveCallback,
};
pub use ops::NodeOps;
pub use patcher::{same_vnode, PatchTarget, Patcher, MAX_UPDATE_COUNT};
