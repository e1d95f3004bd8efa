//! Standard color space roles.
//!
//! Roles reference color spaces by purpose rather than by name, which is
//! what makes a profile portable: the conversion stage always converts
//! between the `scene_linear` and `compositing_log` roles, whatever
//! concrete spaces a show's profile binds them to.

use std::collections::HashMap;

/// Standard role names.
pub mod names {
    /// Scene-referred linear reference space.
    pub const REFERENCE: &str = "reference";
    /// Default input color space.
    pub const DEFAULT: &str = "default";
    /// Scene-referred linear working space.
    pub const SCENE_LINEAR: &str = "scene_linear";
    /// Compositing log space.
    pub const COMPOSITING_LOG: &str = "compositing_log";
}

/// Role to color space mapping.
#[derive(Debug, Clone, Default)]
pub struct Roles {
    /// Role name -> color space name mapping.
    mapping: HashMap<String, String>,
}

impl Roles {
    /// Creates an empty roles mapping.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a role mapping.
    #[inline]
    pub fn define(&mut self, role: impl Into<String>, colorspace: impl Into<String>) {
        self.mapping.insert(role.into(), colorspace.into());
    }

    /// Gets the color space name for a role.
    #[inline]
    pub fn get(&self, role: &str) -> Option<&str> {
        self.mapping.get(role).map(String::as_str)
    }

    /// Checks if a role is defined.
    #[inline]
    pub fn contains(&self, role: &str) -> bool {
        self.mapping.contains_key(role)
    }

    /// Returns all defined roles.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of defined roles.
    #[inline]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Checks if no roles are defined.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Gets the scene_linear color space name.
    #[inline]
    pub fn scene_linear(&self) -> Option<&str> {
        self.get(names::SCENE_LINEAR)
    }

    /// Gets the compositing_log color space name.
    #[inline]
    pub fn compositing_log(&self) -> Option<&str> {
        self.get(names::COMPOSITING_LOG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let mut roles = Roles::new();
        roles.define("scene_linear", "linear");
        roles.define("compositing_log", "cineon");

        assert_eq!(roles.scene_linear(), Some("linear"));
        assert_eq!(roles.compositing_log(), Some("cineon"));
        assert_eq!(roles.get("unknown"), None);
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn iterate_roles() {
        let mut roles = Roles::new();
        roles.define("a", "A");
        roles.define("b", "B");

        let pairs: Vec<_> = roles.iter().collect();
        assert_eq!(pairs.len(), 2);
    }
}
