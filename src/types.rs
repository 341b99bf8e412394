//! Core types for spark-vdom.
//!
//! These types define the foundation that everything builds on.
//! They flow from render functions through the builder into the patcher,
//! and define what the backing tree understands.

use std::collections::BTreeMap;
use std::fmt;

use spark_signals::Signal;

// =============================================================================
// Backing Tree Handle
// =============================================================================

slotmap::new_key_type! {
    /// Handle to a node in the backing tree.
    ///
    /// Hosts allocate these from their own arena. The patcher only stores and
    /// passes them back; it never interprets them.
    pub struct ElmId;
}

// =============================================================================
// Value - Render-time attribute values
// =============================================================================

/// A render-time value: attribute values, props, keys, style/class descriptors.
///
/// `Signal` wraps a reactive cell. Reading it through
/// [`register_dependency`](crate::reactivity::register_dependency) inside a
/// render effect subscribes the render to its changes.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Signal(Signal<Value>),
}

impl Value {
    /// Strings, numbers and booleans.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Number(_) | Value::Str(_))
    }

    /// Lists, maps and signals (anything a deep traversal walks into).
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_) | Value::Signal(_))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Current value, looking through a signal.
    ///
    /// Reading a signal here creates a reactive dependency when called from
    /// an effect.
    pub fn resolve(&self) -> Value {
        match self {
            Value::Signal(s) => s.get().resolve(),
            other => other.clone(),
        }
    }

    /// Truthiness used by class maps and boolean attributes.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) => true,
            Value::Signal(s) => s.get().is_truthy(),
        }
    }

    /// Render a primitive as text. Containers render as empty strings.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Signal(s) => s.get().to_text(),
            Value::List(_) | Value::Map(_) => String::new(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Signals compare by their current contents.
            (Value::Signal(a), Value::Signal(b)) => a.get() == b.get(),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Signal(_) => write!(f, "Signal(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<Signal<Value>> for Value {
    fn from(value: Signal<Value>) -> Self {
        Value::Signal(value)
    }
}

/// Build a `Value::Map` from key/value pairs.
pub fn value_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Value
where
    K: Into<String>,
    V: Into<Value>,
{
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

// =============================================================================
// Key - Sibling identity hint
// =============================================================================

/// Bounds of the integers an `f64` key can name without saturating.
const I64_MIN: f64 = i64::MIN as f64;
const I64_MAX: f64 = i64::MAX as f64;

/// Primitive identity hint used to match siblings across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Key {
    /// Convert a render-time value into a key.
    ///
    /// Returns `None` for non-primitive values. A map carrying an
    /// `"@binding"` entry is an embedded binding expression and keys by that
    /// expression.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Str(s) => Some(Key::Str(s.clone())),
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Number(n) if n.fract() == 0.0 && (I64_MIN..I64_MAX).contains(n) => {
                Some(Key::Int(*n as i64))
            }
            Value::Number(n) => Some(Key::Str(n.to_string())),
            Value::Map(map) => map.get("@binding").map(|b| Key::Str(b.to_text())),
            _ => None,
        }
    }

    /// Whether the value is acceptable as a key without a diagnostic.
    pub fn is_valid_key_value(value: &Value) -> bool {
        match value {
            Value::Map(map) => map.contains_key("@binding"),
            other => other.is_primitive(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s}"),
            Key::Int(i) => write!(f, "{i}"),
            Key::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value as i64)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

// =============================================================================
// Namespace
// =============================================================================

/// Element namespace for namespace-aware element creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Svg,
    MathMl,
    Other(String),
}

impl Namespace {
    /// Namespace URI passed to the backing tree.
    pub fn uri(&self) -> &str {
        match self {
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Other(uri) => uri,
        }
    }
}

// =============================================================================
// Node Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Identity flags on a virtual node.
    ///
    /// Combine with bitwise OR: `NodeFlags::STATIC | NodeFlags::CLONED`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const NONE = 0;
        /// Text node: `text` is set, no tag.
        const TEXT = 1 << 0;
        /// Comment node (the canonical empty node is a comment).
        const COMMENT = 1 << 1;
        /// Produced by cloning another node.
        const CLONED = 1 << 2;
        /// Content never changes; reusable without diffing.
        const STATIC = 1 << 3;
        /// Rendered once; treated like static after the first render.
        const ONCE = 1 << 4;
        /// Placeholder for an unresolved async component.
        const ASYNC_PLACEHOLDER = 1 << 5;
    }
}

// =============================================================================
// Normalization Level
// =============================================================================

/// How much flattening the builder applies to a children list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Children are already a flat list of nodes.
    #[default]
    None,
    /// One level of flattening (compiler-generated, known shallow).
    Simple,
    /// Full recursive flattening with text merging (hand-written trees).
    Always,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_value() {
        assert_eq!(Key::from_value(&Value::from("a")), Some(Key::Str("a".into())));
        assert_eq!(Key::from_value(&Value::from(3)), Some(Key::Int(3)));
        assert_eq!(Key::from_value(&Value::from(1.5)), Some(Key::Str("1.5".into())));
        assert_eq!(Key::from_value(&Value::List(vec![])), None);
    }

    #[test]
    fn test_large_number_keys_stay_distinct() {
        let a = Key::from_value(&Value::from(1e19));
        let b = Key::from_value(&Value::from(2e19));
        assert_ne!(a, b);
        assert_eq!(a, Some(Key::Str("10000000000000000000".into())));
        assert_eq!(Key::from_value(&Value::from(-9e18)), Some(Key::Int(-9_000_000_000_000_000_000)));
    }

    #[test]
    fn test_binding_key_is_whitelisted() {
        let binding = value_map([("@binding", "item.id")]);
        assert!(Key::is_valid_key_value(&binding));
        assert_eq!(Key::from_value(&binding), Some(Key::Str("item.id".into())));

        let plain_map = value_map([("id", 1)]);
        assert!(!Key::is_valid_key_value(&plain_map));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Value::from(42).to_text(), "42");
        assert_eq!(Value::from(0.5).to_text(), "0.5");
        assert_eq!(Value::Null.to_text(), "");
        assert!(Value::from("x").is_truthy());
        assert!(!Value::from("").is_truthy());
    }

    #[test]
    fn test_node_flags() {
        let flags = NodeFlags::STATIC | NodeFlags::CLONED;
        assert!(flags.contains(NodeFlags::STATIC));
        assert!(!flags.contains(NodeFlags::TEXT));
    }
}
