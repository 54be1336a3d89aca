//! Global platform registry for looking up platform definitions.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Global platform registry.
static REGISTRY: LazyLock<PlatformRegistry> = LazyLock::new(|| {
    let mut registry = PlatformRegistry::new();
    registry.register_builtin_platforms();
    registry
});

/// Registry for platform definitions, keyed by device type.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Look up a platform in the global registry by device type.
    pub fn lookup(name: &str) -> Result<PlatformDefinition> {
        REGISTRY.get(name).cloned().ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Register built-in platforms.
    fn register_builtin_platforms(&mut self) {
        for name in vendors::cisco_ios::DEVICE_TYPES {
            let platform = vendors::cisco_ios::platform().renamed(*name);
            self.platforms.insert(platform.name.clone(), platform);
        }
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }
}
