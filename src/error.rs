//! Error taxonomy.
//!
//! Nothing in the build/derive/patch path is fatal. Misuse is reported
//! through [`diagnostics::report`](crate::diagnostics::report) and the
//! operation continues with degraded behavior (an empty node, a dropped key,
//! a derivation that keeps the invalid name). Only [`mount`](crate::pipeline::mount)
//! returns a `Result`.

use crate::types::Key;

/// How a [`VdomError`] is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input that is reported and tolerated.
    Validation,
    /// An invariant violation that short-circuits to an empty node.
    StructuralMisuse,
    /// A condition found while patching or mounting.
    Runtime,
}

/// Every condition the runtime reports.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VdomError {
    #[error(
        "Invalid component name: \"{name}\". Component names should conform to valid custom element name in html5 specification."
    )]
    InvalidComponentName { name: String },

    #[error("Do not use built-in or reserved HTML elements as component id: {name}")]
    ReservedComponentName { name: String },

    #[error("Avoid using non-primitive value as key, use string/number value instead.")]
    NonPrimitiveKey,

    #[error(
        "Avoid using observed data object as vnode data: {summary}\nAlways create fresh vnode data objects in each render!"
    )]
    ObservedData { summary: String },

    #[error("Native listeners are only valid on components but were used on <{tag}>.")]
    NativeModifierOnElement { tag: String },

    #[error("Duplicate keys detected: '{key}'. This may cause an update error.")]
    DuplicateKey { key: Key },

    #[error("Unknown custom element: <{tag}> - did you register the component correctly?")]
    UnknownElement { tag: String },

    #[error("Failed to mount component: template or render function not defined.")]
    MissingRender,

    #[error("Missing required prop: \"{name}\"")]
    MissingRequiredProp { name: String },

    #[error("Failed to resolve {category}: {id}")]
    UnresolvedAsset { category: &'static str, id: String },

    #[error("Failed to resolve async component: {reason}")]
    AsyncComponentFailed { reason: String },

    #[error("Do not mount to <{tag}> - mount to normal elements instead.")]
    InvalidMountTarget { tag: String },
}

impl VdomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VdomError::InvalidComponentName { .. }
            | VdomError::ReservedComponentName { .. }
            | VdomError::NonPrimitiveKey
            | VdomError::NativeModifierOnElement { .. }
            | VdomError::DuplicateKey { .. }
            | VdomError::MissingRequiredProp { .. } => ErrorKind::Validation,
            VdomError::ObservedData { .. } => ErrorKind::StructuralMisuse,
            VdomError::UnknownElement { .. }
            | VdomError::MissingRender
            | VdomError::UnresolvedAsset { .. }
            | VdomError::AsyncComponentFailed { .. }
            | VdomError::InvalidMountTarget { .. } => ErrorKind::Runtime,
        }
    }
}
