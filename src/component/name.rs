//! Component name rules and case conversions.

use crate::config;
use crate::error::VdomError;
use crate::platform;

/// Check a component name against the custom element name grammar.
///
/// The first character must be an ASCII letter. The rest may be letters,
/// digits, `-`, `.`, `_`, or characters from the PCENChar ranges.
/// Built-in (`slot`, `component`) and reserved platform tags are refused.
pub fn validate_component_name(name: &str) -> Result<(), VdomError> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !valid_start || !chars.all(is_name_char) {
        return Err(VdomError::InvalidComponentName { name: name.to_string() });
    }
    if platform::is_built_in_tag(name) || config::is_reserved_tag(name) {
        return Err(VdomError::ReservedComponentName { name: name.to_string() });
    }
    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '.' | '_')
        || matches!(c,
            '\u{B7}'
            | '\u{C0}'..='\u{D6}'
            | '\u{D8}'..='\u{F6}'
            | '\u{F8}'..='\u{37D}'
            | '\u{37F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{203F}'..='\u{2040}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}')
}

/// `my-component` → `myComponent`
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    if upper_next {
        out.push('-');
    }
    out
}

/// `myComponent` → `my-component`
pub fn hyphenate(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            out.push('-');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// `myComponent` → `MyComponent`
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
