//! Builder for creating device drivers.

use std::path::PathBuf;
use std::time::Duration;

use super::generic::GenericDriver;
use crate::error::{DriverError, Result};
use crate::platform::PlatformRegistry;
use crate::transport::{HostKeyVerification, SshConfig};

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use netsnap::driver::DriverBuilder;
///
/// # async fn example() -> Result<(), netsnap::Error> {
/// let mut driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .platform("cisco_ios")
///     .build()?;
/// driver.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: String,
    platform_name: Option<String>,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: String::new(),
            platform_name: None,
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the platform name (e.g., "cisco_ios").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    /// Set the connection and prompt-wait timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file instead of the user's default.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the driver.
    ///
    /// This creates the driver but does not connect. Call `open()` on the
    /// returned driver to establish the connection.
    pub fn build(self) -> Result<GenericDriver> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        let name = self.platform_name.ok_or_else(|| DriverError::InvalidConfig {
            message: "Platform must be specified".to_string(),
        })?;
        let platform = PlatformRegistry::lookup(&name)?;

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            password: self.password,
            timeout: self.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        GenericDriver::new(ssh_config, platform)
    }
}
