//! Container configuration.

use serde::{Deserialize, Serialize};

/// Settings applied when a container is built.
///
/// ```
/// use wirebox_container::settings::ContainerSettings;
///
/// let settings = ContainerSettings::default();
/// assert!(!settings.allow_override);
/// assert!(settings.name.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Label used in logs.
    pub name: Option<String>,
    /// When set, strict binds replace existing bindings instead of failing.
    pub allow_override: bool,
}
