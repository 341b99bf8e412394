//! Mount API - Root instance lifecycle.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::host::{AttrsModule, MemoryDom};
//! use spark_vdom::patch::Patcher;
//! use spark_vdom::pipeline::mount;
//!
//! let mut dom = MemoryDom::new();
//! let (body, app) = dom.scaffold();
//! let mut patcher = Patcher::new(dom);
//! patcher.register_module(AttrsModule);
//!
//! let mut handle = mount(patcher, &definition, Default::default(), Some(app))?;
//!
//! // State changes re-render inside effects; flush applies them.
//! handle.flush();
//!
//! handle.unmount();
//! handle.with_ops(|dom| println!("{}", dom.serialize(body)));
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::component::{ComponentDefinition, ComponentInstance, InstanceInit};
use crate::error::VdomError;
use crate::patch::{NodeOps, Patcher};
use crate::types::{ElmId, Value};

// =============================================================================
// Mount Handle
// =============================================================================

/// A mounted root instance and the patcher that owns its backing tree.
pub struct MountHandle<O: NodeOps> {
    patcher: Patcher<O>,
    root: Rc<ComponentInstance>,
    mounted: bool,
}

impl<O: NodeOps> MountHandle<O> {
    /// Patch every instance whose render changed. Returns how many were
    /// patched.
    pub fn flush(&mut self) -> usize {
        if !self.mounted {
            return 0;
        }
        self.patcher.flush()
    }

    pub fn root(&self) -> &Rc<ComponentInstance> {
        &self.root
    }

    /// Root backing element.
    pub fn el(&self) -> Option<ElmId> {
        self.root.el()
    }

    pub fn with_ops<R>(&self, f: impl FnOnce(&O) -> R) -> R {
        f(self.patcher.ops())
    }

    pub fn with_ops_mut<R>(&mut self, f: impl FnOnce(&mut O) -> R) -> R {
        f(self.patcher.ops_mut())
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Destroy the root instance and detach its element. The backing tree
    /// stays reachable through [`with_ops`](Self::with_ops).
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.patcher.unmount_root(&self.root);
        tracing::debug!(target: "spark_vdom", uid = self.root.uid(), "unmounted");
    }
}

impl<O: NodeOps> Drop for MountHandle<O> {
    fn drop(&mut self) {
        // Stop render effects even when unmount was never called.
        if self.mounted {
            self.root.stop_render();
        }
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Create a root instance of `definition`, render it, and patch it onto
/// `target` (replacing that element), or keep it detached when `target` is
/// `None`.
///
/// Mounting onto `<html>` or `<body>` is refused.
pub fn mount<O: NodeOps>(
    mut patcher: Patcher<O>,
    definition: &Rc<ComponentDefinition>,
    props: BTreeMap<String, Value>,
    target: Option<ElmId>,
) -> Result<MountHandle<O>, VdomError> {
    if let Some(target) = target {
        if let Some(tag) = patcher.ops().tag_name(target) {
            let tag = tag.to_ascii_lowercase();
            if tag == "html" || tag == "body" {
                return Err(VdomError::InvalidMountTarget { tag });
            }
        }
    }

    let init = InstanceInit {
        props_data: props,
        ..Default::default()
    };
    let root = ComponentInstance::new(definition.clone(), None, init, patcher.scheduler().clone());
    patcher.mount_root(&root, target);
    tracing::debug!(target: "spark_vdom", uid = root.uid(), cid = definition.cid(), "mounted");

    Ok(MountHandle {
        patcher,
        root,
        mounted: true,
    })
}
