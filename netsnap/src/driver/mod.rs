//! High-level driver for device interaction.
//!
//! The driver layer provides the command API over an SSH shell:
//! prompt-terminated command execution, privilege level navigation
//! and configuration mode round-trips.

mod builder;
mod generic;
mod privilege;
mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use privilege::PrivilegeManager;
pub use response::Response;
