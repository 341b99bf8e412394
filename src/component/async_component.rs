//! Async components.
//!
//! An `AsyncComponent` is a handle that resolves to a definition later.
//! Until then, building it produces an async placeholder (an empty node
//! tagged with the handle) and records the building instance as an owner.
//! Resolving force-updates every owner so the next render builds the real
//! component.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::diagnostics;
use crate::error::VdomError;

use super::definition::ComponentDefinition;
use super::extend::{base, derive};
use super::instance::ComponentInstance;
use super::options::ComponentRef;

#[derive(Clone)]
pub enum AsyncState {
    Pending,
    Resolved(Rc<ComponentDefinition>),
    Failed(String),
}

struct AsyncInner {
    state: RefCell<AsyncState>,
    owners: RefCell<Vec<Weak<ComponentInstance>>>,
}

/// Shared handle to a component that is not loaded yet.
#[derive(Clone)]
pub struct AsyncComponent {
    inner: Rc<AsyncInner>,
}

impl Default for AsyncComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncComponent {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(AsyncInner {
                state: RefCell::new(AsyncState::Pending),
                owners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> AsyncState {
        self.inner.state.borrow().clone()
    }

    pub fn resolved(&self) -> Option<Rc<ComponentDefinition>> {
        match &*self.inner.state.borrow() {
            AsyncState::Resolved(def) => Some(def.clone()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.state.borrow(), AsyncState::Pending)
    }

    pub fn has_failed(&self) -> bool {
        matches!(*self.inner.state.borrow(), AsyncState::Failed(_))
    }

    /// Same underlying handle.
    pub fn ptr_eq(&self, other: &AsyncComponent) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Record an instance that rendered the placeholder.
    pub fn add_owner(&self, owner: &Rc<ComponentInstance>) {
        let mut owners = self.inner.owners.borrow_mut();
        let known = owners
            .iter()
            .any(|existing| existing.upgrade().is_some_and(|o| Rc::ptr_eq(&o, owner)));
        if !known {
            owners.push(Rc::downgrade(owner));
        }
    }

    pub fn owner_count(&self) -> usize {
        self.inner.owners.borrow().iter().filter(|o| o.strong_count() > 0).count()
    }

    /// Resolve to a component and re-render every owner.
    pub fn resolve(&self, component: impl Into<ComponentRef>) {
        let def = match component.into() {
            ComponentRef::Definition(def) => Some(def),
            ComponentRef::Spec(spec) => Some(derive(&base(), &spec)),
            ComponentRef::SelfRef(weak) => weak.upgrade(),
            ComponentRef::Async(_) => None,
        };
        let Some(def) = def else {
            self.fail("resolved to another async component");
            return;
        };
        tracing::debug!(target: "spark_vdom", cid = def.cid(), "async component resolved");
        *self.inner.state.borrow_mut() = AsyncState::Resolved(def);
        self.notify_owners();
    }

    /// Mark as failed and report.
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        diagnostics::report(&VdomError::AsyncComponentFailed { reason: reason.clone() }, None);
        *self.inner.state.borrow_mut() = AsyncState::Failed(reason);
        self.notify_owners();
    }

    fn notify_owners(&self) {
        let owners: Vec<_> = self.inner.owners.borrow_mut().drain(..).collect();
        for owner in owners.iter().filter_map(Weak::upgrade) {
            owner.force_update();
        }
    }
}

impl fmt::Debug for AsyncComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.borrow() {
            AsyncState::Pending => "pending".to_string(),
            AsyncState::Resolved(def) => format!("resolved({})", def.cid()),
            AsyncState::Failed(reason) => format!("failed({reason})"),
        };
        write!(f, "AsyncComponent({state})")
    }
}
