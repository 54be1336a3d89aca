//! Cisco IOS / IOS-XE platform definition.
//!
//! Supports Cisco devices with the following privilege levels:
//! - `exec` - User EXEC mode with `>` prompt
//! - `privilege_exec` - Privileged EXEC mode with `#` prompt
//! - `configuration` - Configuration mode with `(config*)#` prompt
//!
//! Prompt patterns are adapted from [scrapli](https://github.com/carlmontanari/scrapli).
//!
//! # Prompt Examples
//!
//! ```text
//! SW1>                               # exec mode
//! SW1#                               # privilege_exec mode
//! SW1(config)#                       # configuration mode
//! SW1(config-if)#                    # config sub-mode (interface)
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Device types that resolve to this platform.
pub const DEVICE_TYPES: &[&str] = &["cisco_ios", "cisco_xe", "cisco_ios_ssh"];

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    // Exec mode - ">" prompt
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@/:]{1,63}>\s?$").unwrap();

    // Privileged EXEC mode - "#" prompt, "enable" may ask for the secret
    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@/:]{1,63}#\s?$")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"(?mi)^(?:enable\s)?password:\s?$")
        .unwrap()
        .with_not_contains("(conf");

    // Configuration mode - "(config*)" prompt
    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,63}\)#\s?$",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    PlatformDefinition::new("cisco_ios")
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_config_privilege("configuration")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24)
}
