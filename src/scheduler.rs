//! Update scheduler.
//!
//! Render effects never patch directly. A re-run stashes the new tree on the
//! instance and queues the instance here; the patcher drains the queue.
//!
//! # Ordering
//!
//! The queue is keyed by instance uid. Parents are created before their
//! children, so draining in ascending uid order patches ancestors first.
//! Queuing an instance that is already queued is a no-op, which collapses
//! repeated re-renders into one patch.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::component::{ComponentInstance, InstanceState};

#[derive(Default)]
pub struct Scheduler {
    queue: RefCell<BTreeMap<u64, Weak<ComponentInstance>>>,
}

impl Scheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Queue an instance for patching. Duplicates collapse.
    pub fn queue(&self, instance: &Rc<ComponentInstance>) {
        let uid = instance.uid();
        let inserted = self
            .queue
            .borrow_mut()
            .insert(uid, Rc::downgrade(instance))
            .is_none();
        if inserted {
            tracing::trace!(target: "spark_vdom", uid, "queued update");
        }
    }

    /// Lowest-uid live instance, skipping destroyed ones.
    pub fn pop(&self) -> Option<Rc<ComponentInstance>> {
        loop {
            let (_, weak) = self.queue.borrow_mut().pop_first()?;
            match weak.upgrade() {
                Some(instance) if instance.state() != InstanceState::Destroyed => return Some(instance),
                _ => continue,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn is_queued(&self, uid: u64) -> bool {
        self.queue.borrow().contains_key(&uid)
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}
