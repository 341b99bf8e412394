//! Prop extraction and resolution.

use std::collections::BTreeMap;

use crate::config;
use crate::diagnostics;
use crate::error::VdomError;
use crate::types::Value;
use crate::vnode::NodeData;

use super::instance::ComponentInstance;
use super::name::hyphenate;
use super::options::ComponentOptions;

/// Pull declared props out of a placeholder's data.
///
/// `data.props` is read first and left in place; a match in `data.attrs`
/// is consumed so it is not rendered as an attribute. Hyphenated names
/// match camelized props.
pub fn extract_props(data: &mut NodeData, options: &ComponentOptions) -> BTreeMap<String, Value> {
    let mut extracted = BTreeMap::new();
    for key in options.props.keys() {
        let alt = hyphenate(key);
        if !take_prop(&mut extracted, &mut data.props, key, &alt, true) {
            take_prop(&mut extracted, &mut data.attrs, key, &alt, false);
        }
    }
    extracted
}

fn take_prop(
    extracted: &mut BTreeMap<String, Value>,
    source: &mut BTreeMap<String, Value>,
    key: &str,
    alt: &str,
    preserve: bool,
) -> bool {
    for name in [key, alt] {
        let found = if preserve {
            source.get(name).cloned()
        } else {
            source.remove(name)
        };
        if let Some(value) = found {
            extracted.insert(key.to_string(), value);
            return true;
        }
    }
    false
}

/// Final prop values: passed, else default, else null.
///
/// Missing required props are reported against `context`.
pub fn resolve_props(
    options: &ComponentOptions,
    props_data: &BTreeMap<String, Value>,
    context: Option<&ComponentInstance>,
) -> BTreeMap<String, Value> {
    options
        .props
        .iter()
        .map(|(key, spec)| {
            let value = match props_data.get(key) {
                Some(value) => value.clone(),
                None => {
                    if spec.required && config::is_development() {
                        let error = VdomError::MissingRequiredProp { name: key.clone() };
                        diagnostics::report(&error, context);
                    }
                    spec.default.clone().unwrap_or_default()
                }
            };
            (key.clone(), value)
        })
        .collect()
}
