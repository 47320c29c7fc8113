//! Container settings.
//!
//! Settings ride along with a [`crate::collection::ServiceCollection`]
//! and are captured by every provider built from it. They deserialize
//! from any serde format, with every field optional.

use serde::{Deserialize, Serialize};

/// Tunables for resolution.
///
/// ```
/// use wasita_container::settings::ContainerSettings;
///
/// let settings = ContainerSettings::default();
/// assert!(settings.detect_cycles);
/// assert_eq!(settings.max_depth, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Fail with `CircularDependency` when a token is re-entered on the
    /// same provider while it is still being built.
    pub detect_cycles: bool,

    /// Maximum nesting of in-flight resolutions from this collection
    /// before giving up. Unlimited when `None`.
    pub max_depth: Option<usize>,

    /// How many "did you mean" names a `DescriptorNotFound` error lists.
    pub suggestions: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_depth: None,
            suggestions: 3,
        }
    }
}

impl ContainerSettings {
    /// Turns re-entry detection on or off.
    pub fn detect_cycles(mut self, detect: bool) -> Self {
        self.detect_cycles = detect;
        self
    }

    /// Caps the nesting of in-flight resolutions.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets how many suggestions missing-descriptor errors carry.
    pub fn suggestions(mut self, count: usize) -> Self {
        self.suggestions = count;
        self
    }
}
