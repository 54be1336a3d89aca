//! Device session capability and its lifecycle.
//!
//! The collectors only ever talk to a [`Session`]: send a command, get text
//! back. [`Connector`] produces sessions from device records, and
//! [`DeviceSession`] walks one session through
//! `Connected → Privileged → TerminalPrimed → Closed`.
//!
//! The production implementation is [`SshConnector`], built on the driver
//! layer. Tests use a scripted in-memory session.

mod ssh;

#[cfg(test)]
pub(crate) mod mock;

pub use ssh::{SshConnector, SshSession};

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::devices::DeviceRecord;
use crate::error::SessionError;

/// Commands that make full command output arrive unpaginated and unwrapped.
pub const PRIME_COMMANDS: [&str; 2] = ["terminal length 0", "terminal width 511"];

/// An interactive command session with one device.
pub trait Session: Send {
    /// Enter privileged mode, answering a password prompt with `secret`.
    fn enter_privileged(
        &mut self,
        secret: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Send an exec command and return its output.
    fn send_command(
        &mut self,
        command: &str,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Apply configuration lines in configuration mode.
    fn send_config(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Disconnect. Calling this on a closed session does nothing.
    fn disconnect(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Opens sessions to devices.
pub trait Connector: Send + Sync {
    type Session: Session;

    /// Establish an authenticated session with `device`.
    fn connect(
        &self,
        device: &DeviceRecord,
    ) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}

/// Where a [`DeviceSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Privileged,
    TerminalPrimed,
    Closed,
}

/// Exclusive owner of one device's session for the duration of processing.
pub struct DeviceSession<S: Session> {
    session: S,
    hostname: String,
    state: SessionState,
}

impl<S: Session> DeviceSession<S> {
    /// Connect to `device`.
    pub async fn open<C>(connector: &C, device: &DeviceRecord) -> Result<Self, SessionError>
    where
        C: Connector<Session = S>,
    {
        debug!("{}: connecting to {}", device.hostname, device.ip);
        let session = connector.connect(device).await?;

        Ok(Self {
            session,
            hostname: device.hostname.clone(),
            state: SessionState::Connected,
        })
    }

    /// Enter privileged mode.
    pub async fn elevate(&mut self, secret: &SecretString) -> Result<(), SessionError> {
        self.session.enter_privileged(secret.expose_secret()).await?;
        self.state = SessionState::Privileged;
        debug!("{}: privileged", self.hostname);
        Ok(())
    }

    /// Disable paging and widen the terminal, pausing after each command.
    ///
    /// The device gives no acknowledgment that a terminal setting took
    /// effect, so the pause is the only synchronization available.
    pub async fn prime(&mut self, delay: Duration) -> Result<(), SessionError> {
        for command in PRIME_COMMANDS {
            self.session.send_command(command).await?;
            tokio::time::sleep(delay).await;
        }
        self.state = SessionState::TerminalPrimed;
        Ok(())
    }

    /// Disconnect. Safe to call repeatedly and after partial failures;
    /// only the first call reaches the device.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        if let Err(e) = self.session.disconnect().await {
            warn!("{}: disconnect failed: {}", self.hostname, e);
        } else {
            debug!("{}: disconnected", self.hostname);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The underlying session, for collectors.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: Session> Drop for DeviceSession<S> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            warn!("{}: session dropped without close()", self.hostname);
        }
    }
}
