//! Reactivity bridge.
//!
//! The builder asks two questions of the reactivity system:
//!
//! - `is_tracked(value)`: is this value a live reactive cell? Such values are
//!   refused as node data.
//! - `register_dependency(value)`: read every reactive cell reachable from
//!   `value` so the currently running render effect subscribes to all of
//!   them. Used for style/class containers shared by reference through slots.
//!
//! The default implementation is backed by `spark-signals`: a
//! [`Value::Signal`] is tracked, and reading it with `get()` inside an
//! `effect` creates the dependency.

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::Value;

/// Traversal stops here. A signal may hold a value containing itself.
const MAX_DEPTH: usize = 64;

/// Hooks into the host's reactivity system.
pub trait Reactivity {
    fn is_tracked(&self, value: &Value) -> bool;
    fn register_dependency(&self, value: &Value);
}

/// `spark-signals` backed reactivity.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalReactivity;

impl Reactivity for SignalReactivity {
    fn is_tracked(&self, value: &Value) -> bool {
        matches!(value, Value::Signal(_))
    }

    fn register_dependency(&self, value: &Value) {
        traverse(value, 0);
    }
}

fn traverse(value: &Value, depth: usize) {
    if depth >= MAX_DEPTH {
        return;
    }
    match value {
        Value::Signal(signal) => traverse(&signal.get(), depth + 1),
        Value::List(items) => items.iter().for_each(|v| traverse(v, depth + 1)),
        Value::Map(map) => map.values().for_each(|v| traverse(v, depth + 1)),
        _ => {}
    }
}

thread_local! {
    static REACTIVITY: RefCell<Rc<dyn Reactivity>> = RefCell::new(Rc::new(SignalReactivity));
}

/// Install a reactivity implementation for this thread.
pub fn set_reactivity(reactivity: Rc<dyn Reactivity>) {
    REACTIVITY.with(|r| *r.borrow_mut() = reactivity);
}

/// Restore the signal-backed default (for testing).
pub fn reset_reactivity() {
    set_reactivity(Rc::new(SignalReactivity));
}

fn current() -> Rc<dyn Reactivity> {
    REACTIVITY.with(|r| r.borrow().clone())
}

pub fn is_tracked(value: &Value) -> bool {
    current().is_tracked(value)
}

pub fn register_dependency(value: &Value) {
    current().register_dependency(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value_map;
    use spark_signals::{effect, signal};
    use std::cell::Cell;

    #[test]
    fn test_signal_is_tracked() {
        reset_reactivity();
        let cell = signal(Value::from(1));
        assert!(is_tracked(&Value::Signal(cell)));
        assert!(!is_tracked(&value_map([("a", 1)])));
    }

    #[test]
    fn test_deep_registration_subscribes_effect() {
        reset_reactivity();
        let color = signal(Value::from("red"));
        let style = value_map([("color", Value::Signal(color.clone()))]);

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let _stop = effect(move || {
            register_dependency(&style);
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        color.set(Value::from("blue"));
        assert_eq!(runs.get(), 2, "nested signal change should re-run the effect");
    }
}
