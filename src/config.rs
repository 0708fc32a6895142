//! Root configuration and the builder that applies it.

use ripple_core::{HookContext, HookStore, HostRenderer};
use serde::{Deserialize, Serialize};

use crate::root::Root;

/// Settings for a render root.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// let config: ripple::RootConfig = serde_json::from_str(r#"{ "path_label": "app" }"#).unwrap();
/// assert_eq!(config.path_label, "app");
/// assert!(config.clear_container);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Label of the root structural path. Roots sharing a hook store need distinct labels.
    pub path_label: String,
    /// Whether `setup` empties the container before mounting.
    pub clear_container: bool,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            path_label: "root".into(),
            clear_container: true,
        }
    }
}

/// Builder for [`Root`].
#[derive(Debug, Default)]
pub struct RootBuilder<S = HookContext> {
    config: RootConfig,
    hooks: S,
}

impl RootBuilder {
    /// Creates a builder with the default configuration and a fresh [`HookContext`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: HookStore> RootBuilder<S> {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: RootConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the label of the root structural path.
    #[must_use]
    pub fn path_label(mut self, label: impl Into<String>) -> Self {
        self.config.path_label = label.into();
        self
    }

    /// Controls whether `setup` empties the container before mounting.
    #[must_use]
    pub const fn clear_container(mut self, clear: bool) -> Self {
        self.config.clear_container = clear;
        self
    }

    /// Uses another hook store.
    #[must_use]
    pub fn hooks<T: HookStore>(self, hooks: T) -> RootBuilder<T> {
        RootBuilder {
            config: self.config,
            hooks,
        }
    }

    /// Finalises the builder around a host renderer.
    pub fn build<H: HostRenderer>(self, host: H) -> Root<H, S> {
        Root::from_parts(host, self.hooks, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_memory::MemoryHost;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: RootConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RootConfig::default());

        let config: RootConfig = serde_json::from_str(r#"{ "clear_container": false }"#).unwrap();
        assert_eq!(config.path_label, "root");
        assert!(!config.clear_container);
    }

    #[test]
    fn builder_overrides_config() {
        let root = RootBuilder::new()
            .with_config(RootConfig {
                path_label: "ignored".into(),
                clear_container: true,
            })
            .path_label("app")
            .clear_container(false)
            .build(MemoryHost::new());

        assert_eq!(root.config().path_label, "app");
        assert!(!root.config().clear_container);
    }
}
