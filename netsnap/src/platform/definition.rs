//! Platform definition for vendor-specific configurations.

use indexmap::IndexMap;

use super::privilege_level::PrivilegeLevel;

/// Platform definition containing all vendor-specific configuration.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "cisco_ios", "cisco_xe").
    pub name: String,

    /// Privilege levels for this platform.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Privilege level used for exec commands (the "enable" target).
    pub default_privilege: String,

    /// Privilege level used for configuration commands.
    pub config_privilege: String,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            config_privilege: String::new(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    /// Set the configuration privilege level.
    pub fn with_config_privilege(mut self, name: impl Into<String>) -> Self {
        self.config_privilege = name.into();
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Return a copy of this definition registered under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
