//! Mounting pipeline.
//!
//! ```text
//! ComponentDefinition → root instance → render effect → Patcher → backing tree
//!                                            │                ▲
//!                                            └─ Scheduler ────┘ (flush)
//! ```

pub mod mount;

pub use mount::{mount, MountHandle};
