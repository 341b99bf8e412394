//! Backing-tree hosts.
//!
//! - [`memory`] - an in-memory tree with an op log
//! - [`attrs`] - the attribute/class/style hook module

pub mod attrs;
pub mod memory;

pub use attrs::{render_class, render_style, AttrsModule};
pub use memory::{DomOp, MemNode, MemNodeKind, MemoryDom};
