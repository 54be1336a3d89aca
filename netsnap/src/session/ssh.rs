//! SSH-backed sessions over the generic driver.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use secrecy::ExposeSecret;

use super::{Connector, Session};
use crate::config::BatchConfig;
use crate::devices::DeviceRecord;
use crate::driver::{DriverBuilder, GenericDriver};
use crate::error::{Error, SessionError};
use crate::transport::HostKeyVerification;

/// Opens SSH sessions using the platform selected by each device's type.
#[derive(Debug, Clone)]
pub struct SshConnector {
    port: u16,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SshConnector {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            port: config.port,
            timeout: config.timeout,
            host_key_verification: config.host_key_verification,
            known_hosts_path: config.known_hosts.clone(),
        }
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, device: &DeviceRecord) -> Result<SshSession, SessionError> {
        let failure = |e: Error| SessionError::Connection {
            host: device.hostname.clone(),
            message: e.to_string(),
        };

        let mut builder = DriverBuilder::new(&device.ip)
            .port(self.port)
            .username(&device.username)
            .password(device.password.expose_secret())
            .platform(&device.device_type)
            .timeout(self.timeout)
            .host_key_verification(self.host_key_verification);
        if let Some(ref path) = self.known_hosts_path {
            builder = builder.known_hosts_path(path);
        }

        let mut driver = builder.build().map_err(failure)?;

        if let Err(e) = driver.open().await {
            // The transport may be up even though the shell never showed a prompt
            if let Err(close_err) = driver.close().await {
                debug!("{}: close after failed open: {}", device.hostname, close_err);
            }
            return Err(failure(e));
        }

        Ok(SshSession {
            driver,
            hostname: device.hostname.clone(),
        })
    }
}

/// A live SSH shell on one device.
pub struct SshSession {
    driver: GenericDriver,
    hostname: String,
}

impl Session for SshSession {
    async fn enter_privileged(&mut self, secret: &str) -> Result<(), SessionError> {
        self.driver.set_enable_secret(secret);
        let target = self.driver.platform().default_privilege.clone();

        self.driver
            .acquire_privilege(&target)
            .await
            .map_err(|e| SessionError::Privilege {
                message: e.to_string(),
            })
    }

    async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        let response = self
            .driver
            .send_command(command)
            .await
            .map_err(|e| SessionError::Command {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        match response.failure_message {
            Some(message) => Err(SessionError::Command {
                command: command.to_string(),
                message,
            }),
            None => Ok(response.result),
        }
    }

    async fn send_config(&mut self, commands: &[&str]) -> Result<(), SessionError> {
        let responses = self
            .driver
            .send_config(commands)
            .await
            .map_err(|e| SessionError::Config {
                message: e.to_string(),
            })?;

        match responses.iter().find(|r| !r.is_success()) {
            Some(rejected) => Err(SessionError::Config {
                message: format!(
                    "'{}': {}",
                    rejected.command,
                    rejected.failure_message.as_deref().unwrap_or_default()
                ),
            }),
            None => Ok(()),
        }
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        self.driver
            .close()
            .await
            .map_err(|e| SessionError::Connection {
                host: self.hostname.clone(),
                message: e.to_string(),
            })
    }
}
