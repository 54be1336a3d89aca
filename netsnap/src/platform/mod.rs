//! Platform definitions for multi-vendor support.
//!
//! This module defines vendor-specific configurations including
//! prompt patterns, privilege levels, and failure patterns. The
//! `device_type` column of the device list selects a platform by name.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;
