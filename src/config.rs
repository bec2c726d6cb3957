//! Container configuration.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::internal::circular::MAX_DEPTH;

/// Container configuration
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Container, ContainerConfig};
///
/// let config = ContainerConfig::new()
///     .with_max_depth(64)
///     .with_validate_on_install(true);
///
/// let container = Container::with_config(config);
/// assert_eq!(container.config().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Deepest chain of nested resolutions before `DepthExceeded` is raised
    pub max_depth: usize,
    /// Run `validate` before `install` seals the container
    pub validate_on_install: bool,
}

impl ContainerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resolution depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets whether `install` validates first.
    pub fn with_validate_on_install(mut self, validate: bool) -> Self {
        self.validate_on_install = validate;
        self
    }

    /// Parses a configuration from JSON. Missing fields keep their defaults.
    ///
    /// ```rust
    /// use ferrous_inject::ContainerConfig;
    ///
    /// let config = ContainerConfig::from_json_str(r#"{ "validate_on_install": true }"#).unwrap();
    /// assert!(config.validate_on_install);
    /// assert_eq!(config.max_depth, 1024);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the configuration to JSON.
    #[cfg(feature = "config")]
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            validate_on_install: false,
        }
    }
}
