//! Batch configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::transport::HostKeyVerification;

/// Settings for one batch run, built once at process start.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// CSV device list.
    pub device_file: PathBuf,

    /// Root directory for backup artifacts.
    pub backup_root: PathBuf,

    /// Pause after each terminal-priming command.
    pub prime_delay: Duration,

    /// SSH connect and prompt-wait timeout.
    pub timeout: Duration,

    /// SSH port used for every device.
    pub port: u16,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// known_hosts file to use instead of the user's default.
    pub known_hosts: Option<PathBuf>,

    /// Send `clock timezone GMT 0 0` to every device.
    pub set_timezone: bool,
}

impl BatchConfig {
    pub fn new(device_file: impl Into<PathBuf>, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            device_file: device_file.into(),
            backup_root: backup_root.into(),
            ..Self::default()
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            device_file: PathBuf::from("devices.csv"),
            backup_root: PathBuf::from("backup"),
            prime_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            port: 22,
            host_key_verification: HostKeyVerification::default(),
            known_hosts: None,
            set_timezone: false,
        }
    }
}
