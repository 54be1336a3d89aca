//! Error types for netsnap.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for netsnap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Device session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Backup or fact collection errors
    #[error("Collect error: {0}")]
    Collect(#[from] CollectError),

    /// Device list errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(std::time::Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Driver layer errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Failed to acquire target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Unknown privilege level detected
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    /// No path found between privilege levels
    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No platform registered under the requested device type
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// Failures of the device session capability.
///
/// These carry rendered messages rather than the underlying error so a
/// session implementation does not have to be SSH-backed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session could not be established
    #[error("Connection to '{host}' failed: {message}")]
    Connection { host: String, message: String },

    /// Privileged mode could not be entered
    #[error("Failed to enter privileged mode: {message}")]
    Privilege { message: String },

    /// A command send/receive failed or the device rejected it
    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// A configuration set was rejected
    #[error("Configuration failed: {message}")]
    Config { message: String },
}

/// Failures while capturing a backup or extracting a fact.
#[derive(Error, Debug)]
pub enum CollectError {
    /// The session failed underneath the collector
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Command output lacked the expected marker text
    #[error("Marker '{marker}' not found in command output")]
    Parse { marker: &'static str },

    /// The hostname cannot be used as a single path component
    #[error("Hostname '{hostname}' is not usable as a backup directory name")]
    InvalidHostname { hostname: String },

    /// The backup artifact could not be persisted
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Device list loading errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The device file could not be opened
    #[error("Failed to open device list '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A row could not be read or was missing a field
    #[error("Malformed device list: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias using netsnap's Error.
pub type Result<T> = std::result::Result<T, Error>;
