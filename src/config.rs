//! Runtime configuration.
//!
//! Held per thread, like the rest of the runtime state. Tests call
//! [`reset_config`] before touching it.

use std::cell::RefCell;

use crate::platform;
use crate::types::Namespace;

/// Runtime switches and the platform tag table.
#[derive(Clone)]
pub struct Config {
    /// Suppress development diagnostics and checks.
    pub production: bool,

    /// Suppress diagnostics even in development.
    pub silent: bool,

    /// Give unkeyed element nodes inside nested generated lists a synthetic
    /// positional key. Off by default: explicit keys are preferred.
    pub synthetic_list_keys: bool,

    /// Tags never reported as unknown elements.
    pub ignored_elements: Vec<String>,

    /// Platform built-in element check.
    pub is_reserved_tag: fn(&str) -> bool,

    /// Namespace a tag creates when no ancestor supplies one.
    pub get_tag_namespace: fn(&str) -> Option<Namespace>,

    /// Element name the platform does not know.
    pub is_unknown_element: fn(&str) -> bool,

    /// Tag name handed to the backing tree.
    pub parse_platform_tag_name: fn(&str) -> String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            production: !cfg!(debug_assertions),
            silent: false,
            synthetic_list_keys: false,
            ignored_elements: Vec::new(),
            is_reserved_tag: platform::is_reserved_tag,
            get_tag_namespace: platform::get_tag_namespace,
            is_unknown_element: platform::is_unknown_element,
            parse_platform_tag_name: platform::parse_platform_tag_name,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("production", &self.production)
            .field("silent", &self.silent)
            .field("synthetic_list_keys", &self.synthetic_list_keys)
            .field("ignored_elements", &self.ignored_elements)
            .finish_non_exhaustive()
    }
}

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

/// Read the configuration without cloning it.
pub fn with_config<R>(f: impl FnOnce(&Config) -> R) -> R {
    CONFIG.with(|config| f(&config.borrow()))
}

/// Snapshot of the current configuration.
pub fn config() -> Config {
    with_config(Config::clone)
}

/// Replace the configuration.
pub fn set_config(config: Config) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Modify the configuration in place.
pub fn update_config(f: impl FnOnce(&mut Config)) {
    CONFIG.with(|config| f(&mut config.borrow_mut()));
}

/// Restore defaults (for testing).
pub fn reset_config() {
    set_config(Config::default());
}

/// Development checks are active.
pub fn is_development() -> bool {
    with_config(|c| !c.production)
}

pub fn is_reserved_tag(tag: &str) -> bool {
    let check = with_config(|c| c.is_reserved_tag);
    check(tag)
}

pub fn get_tag_namespace(tag: &str) -> Option<Namespace> {
    let lookup = with_config(|c| c.get_tag_namespace);
    lookup(tag)
}

pub fn is_unknown_element(tag: &str) -> bool {
    let check = with_config(|c| c.is_unknown_element);
    check(tag)
}

pub fn parse_platform_tag_name(tag: &str) -> String {
    let parse = with_config(|c| c.parse_platform_tag_name);
    parse(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_reset() {
        reset_config();
        update_config(|c| {
            c.silent = true;
            c.ignored_elements.push("blorp".into());
        });
        assert!(with_config(|c| c.silent));
        assert!(platform::is_ignored_element("blorp"));

        reset_config();
        assert!(!with_config(|c| c.silent));
        assert!(!platform::is_ignored_element("blorp"));
    }

    #[test]
    fn test_swappable_tag_table() {
        reset_config();
        update_config(|c| c.is_reserved_tag = |tag| tag == "panel");
        assert!(is_reserved_tag("panel"));
        assert!(!is_reserved_tag("div"));
        reset_config();
        assert!(is_reserved_tag("div"));
    }
}
