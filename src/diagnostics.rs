//! Diagnostics - Fire-and-continue development warnings.
//!
//! Every non-fatal condition (bad component names, non-primitive keys,
//! observed data, duplicate keys) is routed through [`warn`]. The message is
//! handed to the installed [`DiagnosticSink`] together with a component trace
//! built from the owning instance.
//!
//! # Sinks
//!
//! - [`TracingSink`] (default): emits a `tracing` warning event
//! - [`CollectingSink`]: keeps messages in memory (tests, devtools)
//!
//! Nothing is emitted when `Config::production` or `Config::silent` is set.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::ComponentInstance;
use crate::config;
use crate::error::VdomError;

// =============================================================================
// Sink Trait
// =============================================================================

/// Receiver for development warnings.
pub trait DiagnosticSink {
    /// `trace` is empty when the warning has no component context.
    fn warn(&self, message: &str, trace: &str);
}

/// Default sink: forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str, trace: &str) {
        if trace.is_empty() {
            tracing::warn!(target: "spark_vdom", "{message}");
        } else {
            tracing::warn!(target: "spark_vdom", "{message}{trace}");
        }
    }
}

/// Sink that records every message.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: RefCell<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far (without traces).
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|m| m.contains(needle))
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn warn(&self, message: &str, _trace: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

// =============================================================================
// Installed Sink
// =============================================================================

thread_local! {
    static SINK: RefCell<Rc<dyn DiagnosticSink>> = RefCell::new(Rc::new(TracingSink));
}

/// Install a sink for this thread.
pub fn set_sink(sink: Rc<dyn DiagnosticSink>) {
    SINK.with(|s| *s.borrow_mut() = sink);
}

/// Install a fresh [`CollectingSink`] and return it.
pub fn collect() -> Rc<CollectingSink> {
    let sink = Rc::new(CollectingSink::new());
    set_sink(sink.clone());
    sink
}

/// Restore the default tracing sink (for testing).
pub fn reset_sink() {
    set_sink(Rc::new(TracingSink));
}

// =============================================================================
// Reporting
// =============================================================================

/// Emit a development warning.
pub fn warn(message: impl AsRef<str>, context: Option<&ComponentInstance>) {
    let suppressed = config::with_config(|c| c.production || c.silent);
    if suppressed {
        return;
    }
    let trace = context.map(component_trace).unwrap_or_default();
    let sink = SINK.with(|s| s.borrow().clone());
    sink.warn(message.as_ref(), &trace);
}

/// Emit a warning for a runtime error value.
pub fn report(error: &VdomError, context: Option<&ComponentInstance>) {
    warn(error.to_string(), context);
}

/// `<Name>` for an instance: root, named, or anonymous.
pub fn format_component_name(instance: &ComponentInstance) -> String {
    if instance.parent().is_none() {
        return "<Root>".to_string();
    }
    match instance.name() {
        Some(name) => format!("<{}>", classify(&name)),
        None => "<Anonymous>".to_string(),
    }
}

fn classify(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Multi-line trace from `instance` up to the root.
pub fn component_trace(instance: &ComponentInstance) -> String {
    let mut lines = vec![format!("---> {}", format_component_name(instance))];
    let mut current = instance.parent();
    let mut depth = 1;
    while let Some(parent) = current {
        lines.push(format!(
            "{}{}",
            " ".repeat(5 + depth * 2),
            format_component_name(&parent)
        ));
        current = parent.parent();
        depth += 1;
    }
    format!("\n\nfound in\n\n{}\n", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        config::reset_config();
        config::update_config(|c| c.production = false);
        let sink = collect();

        warn("first", None);
        report(&VdomError::NonPrimitiveKey, None);

        assert_eq!(sink.len(), 2);
        assert!(sink.contains("non-primitive value as key"));
        reset_sink();
    }

    #[test]
    fn test_silent_suppresses() {
        config::reset_config();
        config::update_config(|c| {
            c.production = false;
            c.silent = true;
        });
        let sink = collect();
        warn("hidden", None);
        assert!(sink.is_empty());
        config::reset_config();
        reset_sink();
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("todo-item"), "TodoItem");
        assert_eq!(classify("card"), "Card");
    }
}
