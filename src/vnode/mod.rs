//! Virtual nodes and the tree builder.
//!
//! - [`node`] - the node type
//! - [`data`] - render-time node attributes
//! - [`normalize`] - flattening children into a node sequence
//! - [`create`] - `create_element`, the builder entry point

pub mod create;
pub mod data;
pub mod node;
pub mod normalize;

pub use create::{apply_ns, create_element, register_deep_bindings, DataArg, TagRef};
pub use data::{DirectiveBinding, ElmHook, Handler, NodeData, NodeHooks, ScopedSlotFn};
pub use node::{ComponentNodeOptions, Tag, VNode};
pub use normalize::{normalize, normalize_children, simple_normalize_children, Child};
