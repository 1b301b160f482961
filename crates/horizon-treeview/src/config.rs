//! Tree view configuration.
//!
//! # Loading from TOML
//!
//! ```
//! use horizon_treeview::TreeViewConfig;
//!
//! let config = TreeViewConfig::from_toml_str(r#"
//! show_root = false
//! viewport_rows = 40
//! "#).unwrap();
//!
//! assert!(!config.show_root);
//! assert_eq!(config.viewport_rows, 40);
//! assert!(config.show_root_expander); // unspecified keys keep their defaults
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`TreeView`](crate::TreeView).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeViewConfig {
    /// Whether the root node is shown as the first row.
    pub show_root: bool,
    /// Whether the root row gets an expander. When either this or
    /// `show_root` is off, the root is kept expanded.
    pub show_root_expander: bool,
    /// Whether check toggles issued through the view are applied.
    pub checkboxes: bool,
    /// Number of rows the viewport displays.
    pub viewport_rows: usize,
    /// Deferred continuations run per idle tick.
    pub idle_batch_size: usize,
}

impl Default for TreeViewConfig {
    fn default() -> Self {
        Self {
            show_root: true,
            show_root_expander: true,
            checkboxes: false,
            viewport_rows: 20,
            idle_batch_size: 16,
        }
    }
}

impl TreeViewConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize the configuration to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Set whether the root is shown.
    pub fn with_show_root(mut self, show_root: bool) -> Self {
        self.show_root = show_root;
        self
    }

    /// Set whether the root row has an expander.
    pub fn with_show_root_expander(mut self, show: bool) -> Self {
        self.show_root_expander = show;
        self
    }

    /// Enable or disable checkbox handling.
    pub fn with_checkboxes(mut self, checkboxes: bool) -> Self {
        self.checkboxes = checkboxes;
        self
    }

    /// Set the viewport height in rows.
    pub fn with_viewport_rows(mut self, rows: usize) -> Self {
        self.viewport_rows = rows;
        self
    }

    /// Set how many continuations run per idle tick.
    pub fn with_idle_batch_size(mut self, size: usize) -> Self {
        self.idle_batch_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TreeViewConfig::default();
        assert!(config.show_root);
        assert!(config.show_root_expander);
        assert!(!config.checkboxes);
        assert_eq!(config.viewport_rows, 20);
        assert_eq!(config.idle_batch_size, 16);
    }

    #[test]
    fn test_builder() {
        let config = TreeViewConfig::new()
            .with_show_root(false)
            .with_checkboxes(true)
            .with_viewport_rows(5);

        assert!(!config.show_root);
        assert!(config.checkboxes);
        assert_eq!(config.viewport_rows, 5);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = TreeViewConfig::new().with_idle_batch_size(3);
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("idle_batch_size = 3"));
        assert_eq!(TreeViewConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        let err = TreeViewConfig::from_toml_str("viewport_rows = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
