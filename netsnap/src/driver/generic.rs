//! Generic driver implementation that works with any platform.

use std::time::{Duration, Instant};

use log::{debug, trace};
use regex::bytes::Regex;

use super::privilege::PrivilegeManager;
use super::response::{Response, normalize_output};
use crate::channel::PtyChannel;
use crate::error::{DriverError, PlatformError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// How many trailing bytes are searched for a prompt.
const SEARCH_DEPTH: usize = 1000;

/// An open SSH connection plus its interactive shell.
struct Connection {
    transport: SshTransport,
    channel: PtyChannel,
}

/// Generic driver that works with any platform definition.
///
/// This is the main driver implementation that handles:
/// - SSH transport management
/// - Command execution with prompt detection
/// - Privilege level navigation
/// - Configuration mode round-trips
pub struct GenericDriver {
    /// SSH configuration.
    ssh_config: SshConfig,

    /// Platform definition.
    platform: PlatformDefinition,

    /// Live connection (None when disconnected).
    connection: Option<Connection>,

    /// Privilege level manager.
    privilege_manager: PrivilegeManager,

    /// Default timeout for prompt waits.
    timeout: Duration,

    /// Combined prompt pattern for all privilege levels.
    prompt_pattern: Regex,

    /// Password answered at an escalation prompt (falls back to the login password).
    enable_secret: Option<String>,
}

impl GenericDriver {
    /// Create a new generic driver.
    pub fn new(ssh_config: SshConfig, platform: PlatformDefinition) -> Result<Self> {
        let timeout = ssh_config.timeout;
        let privilege_manager = PrivilegeManager::new(platform.privilege_levels.clone());
        let prompt_pattern = Self::build_combined_pattern(&platform)?;

        Ok(Self {
            ssh_config,
            platform,
            connection: None,
            privilege_manager,
            timeout,
            prompt_pattern,
            enable_secret: None,
        })
    }

    /// Build a combined regex pattern that matches any privilege level's prompt.
    fn build_combined_pattern(platform: &PlatformDefinition) -> Result<Regex> {
        let combined = platform
            .privilege_levels
            .values()
            .map(|level| format!("(?:{})", level.pattern.as_str()))
            .collect::<Vec<_>>()
            .join("|");

        Regex::new(&combined).map_err(|e| {
            PlatformError::InvalidDefinition {
                message: format!("prompt patterns of '{}': {}", platform.name, e),
            }
            .into()
        })
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Get the current privilege level name.
    pub fn current_privilege(&self) -> Option<&str> {
        self.privilege_manager.current().map(|l| l.name.as_str())
    }

    /// Set the password used when escalation asks for one.
    pub fn set_enable_secret(&mut self, secret: impl Into<String>) {
        self.enable_secret = Some(secret.into());
    }

    /// Open the connection, wait for the first prompt and run on_open commands.
    pub async fn open(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(self.ssh_config.clone()).await?;
        let channel = transport.open_channel(SEARCH_DEPTH).await?;
        self.connection = Some(Connection { transport, channel });

        let connection = self.connection.as_mut().ok_or(DriverError::NotConnected)?;
        let data = connection
            .channel
            .read_until_pattern(&self.prompt_pattern, self.timeout)
            .await?;
        let prompt = extract_prompt(&self.prompt_pattern, &data);
        debug!("{}: initial prompt {:?}", self.ssh_config.host, prompt);
        self.update_privilege(&prompt);

        for cmd in self.platform.on_open_commands.clone() {
            self.send_command(&cmd).await?;
        }

        Ok(())
    }

    /// Close the connection. Does nothing if already closed.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.channel.close().await {
                debug!("{}: channel eof failed: {}", self.ssh_config.host, e);
            }
            connection.transport.close().await?;
        }
        Ok(())
    }

    /// Send a command and wait for the prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let connection = self.connection.as_mut().ok_or(DriverError::NotConnected)?;

        let start = Instant::now();
        debug!("{}: send {:?}", self.ssh_config.host, command);

        connection.channel.send(command).await?;
        let data = connection
            .channel
            .read_until_pattern(&self.prompt_pattern, self.timeout)
            .await?;

        let elapsed = start.elapsed();
        let raw_result = String::from_utf8_lossy(&data).into_owned();
        let prompt = extract_prompt(&self.prompt_pattern, &data);
        trace!("{}: {} bytes in {:?}", self.ssh_config.host, data.len(), elapsed);

        self.update_privilege(&prompt);

        let result = normalize_output(&raw_result, command);
        let response = Response::new(command, result, raw_result, prompt, elapsed);

        let failure = self
            .platform
            .failed_when_contains
            .iter()
            .find(|pattern| response.result.contains(pattern.as_str()))
            .cloned();

        Ok(match failure {
            Some(pattern) => response.with_failure(pattern),
            None => response,
        })
    }

    /// Send commands in configuration mode.
    ///
    /// Acquires the platform's configuration privilege, sends every command,
    /// then returns to the privilege level held before the call. The return
    /// trip is attempted even when a command errors.
    pub async fn send_config(&mut self, commands: &[&str]) -> Result<Vec<Response>> {
        let original = self
            .current_privilege()
            .map(str::to_string)
            .unwrap_or_else(|| self.platform.default_privilege.clone());
        let config = self.platform.config_privilege.clone();

        self.acquire_privilege(&config).await?;

        let mut outcome = Ok(Vec::with_capacity(commands.len()));
        for cmd in commands {
            match self.send_command(cmd).await {
                Ok(response) => {
                    if let Ok(responses) = outcome.as_mut() {
                        responses.push(response);
                    }
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        let restored = self.acquire_privilege(&original).await;
        let responses = outcome?;
        restored?;
        Ok(responses)
    }

    /// Acquire a specific privilege level.
    pub async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let current = self
            .current_privilege()
            .map(str::to_string)
            .unwrap_or_default();

        if current == target {
            return Ok(());
        }

        let path = self.privilege_manager.find_path(&current, target)?;

        for step in path.windows(2) {
            let (from, to) = (&step[0], &step[1]);

            let transition = self
                .privilege_manager
                .get_transition(from, to)
                .ok_or_else(|| DriverError::NoPrivilegePath {
                    from: from.clone(),
                    to: to.clone(),
                })?;

            debug!(
                "{}: privilege {} -> {} ({:?})",
                self.ssh_config.host, from, to, transition.command
            );

            let connection = self.connection.as_mut().ok_or(DriverError::NotConnected)?;
            connection.channel.send(&transition.command).await?;

            let mut data = match transition.auth_prompt {
                Some(ref auth) => {
                    let either = Regex::new(&format!(
                        "(?:{})|(?:{})",
                        auth.as_str(),
                        self.prompt_pattern.as_str()
                    ))
                    .map_err(|e| PlatformError::InvalidDefinition {
                        message: e.to_string(),
                    })?;
                    connection.channel.read_until_pattern(&either, self.timeout).await?
                }
                None => {
                    connection
                        .channel
                        .read_until_pattern(&self.prompt_pattern, self.timeout)
                        .await?
                }
            };

            // Escalation asked for a password instead of showing a prompt
            if let Some(ref auth) = transition.auth_prompt {
                if !self.prompt_pattern.is_match(&data) && auth.is_match(&data) {
                    let secret = self
                        .enable_secret
                        .as_deref()
                        .unwrap_or(&self.ssh_config.password);
                    connection.channel.send(secret).await?;
                    data = connection
                        .channel
                        .read_until_pattern(&self.prompt_pattern, self.timeout)
                        .await?;
                }
            }

            let prompt = extract_prompt(&self.prompt_pattern, &data);
            let reached = self
                .privilege_manager
                .determine_from_prompt(&prompt)
                .map(|level| level.name.clone());

            match reached {
                Ok(name) if name == *to => {
                    self.privilege_manager.set_current(&name)?;
                }
                Ok(name) => {
                    self.privilege_manager.set_current(&name)?;
                    return Err(DriverError::PrivilegeAcquisitionFailed { target: to.clone() }.into());
                }
                Err(_) => {
                    return Err(DriverError::PrivilegeAcquisitionFailed { target: to.clone() }.into());
                }
            }
        }

        Ok(())
    }

    /// Track the privilege level shown by a prompt, if recognizable.
    fn update_privilege(&mut self, prompt: &str) {
        if let Ok(level) = self.privilege_manager.determine_from_prompt(prompt) {
            let name = level.name.clone();
            let _ = self.privilege_manager.set_current(&name);
        }
    }
}

/// Extract the last prompt match from output.
fn extract_prompt(pattern: &Regex, data: &[u8]) -> String {
    pattern
        .find_iter(data)
        .last()
        .map(|m| String::from_utf8_lossy(&data[m.start()..]).trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::cisco_ios;
    use crate::transport::HostKeyVerification;

    fn driver() -> GenericDriver {
        let config = SshConfig {
            host: "192.0.2.10".to_string(),
            port: 22,
            username: "admin".to_string(),
            password: "cisco".to_string(),
            timeout: Duration::from_secs(5),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::Disabled,
            known_hosts_path: None,
        };
        GenericDriver::new(config, cisco_ios::platform()).unwrap()
    }

    #[test]
    fn test_combined_pattern_matches_every_level() {
        let driver = driver();
        let pattern = &driver.prompt_pattern;
        assert!(pattern.is_match(b"SW1>"));
        assert!(pattern.is_match(b"SW1#"));
        assert!(pattern.is_match(b"SW1(config)#"));
        assert!(!pattern.is_match(b"Password: "));
    }

    #[test]
    fn test_extract_prompt_takes_last_match() {
        let driver = driver();
        let data = b"enable\r\nSW1>\r\nPassword: \r\nSW1#";
        assert_eq!(extract_prompt(&driver.prompt_pattern, data), "SW1#");
        assert_eq!(extract_prompt(&driver.prompt_pattern, b"no prompt here"), "");
    }

    #[test]
    fn test_new_driver_is_closed() {
        let driver = driver();
        assert!(driver.connection.is_none());
        assert_eq!(driver.current_privilege(), Some("exec"));
        assert_eq!(driver.platform().name, "cisco_ios");
    }

    #[tokio::test]
    async fn test_send_command_requires_open() {
        let mut driver = driver();
        let err = driver.send_command("show clock").await.unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn test_close_when_not_open_is_noop() {
        let mut driver = driver();
        assert!(driver.close().await.is_ok());
        assert!(driver.close().await.is_ok());
    }
}
