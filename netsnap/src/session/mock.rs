//! Scripted in-memory session for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use secrecy::SecretString;

use super::{Connector, Session};
use crate::devices::DeviceRecord;
use crate::error::SessionError;

/// One request made of a scripted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Enable,
    Command(String),
    Config(Vec<String>),
    Disconnect,
}

impl Call {
    pub fn command(command: &str) -> Self {
        Call::Command(command.to_string())
    }

    pub fn config(lines: &[&str]) -> Self {
        Call::Config(lines.iter().map(|l| l.to_string()).collect())
    }
}

/// Everything a scripted session was asked to do.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    /// Every request in the order it was made.
    pub calls: Vec<Call>,
    pub connects: usize,
    pub enable_secrets: Vec<String>,
    pub commands: Vec<String>,
    pub configs: Vec<Vec<String>>,
    pub disconnects: usize,
}

/// Session answering commands from a script. Unscripted commands return
/// empty output.
#[derive(Clone, Default)]
pub(crate) struct ScriptedSession {
    responses: HashMap<String, Result<String, SessionError>>,
    fail_enable: bool,
    fail_config: bool,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses
            .insert(command.to_string(), Ok(output.to_string()));
        self
    }

    pub fn fail(mut self, command: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            Err(SessionError::Command {
                command: command.to_string(),
                message: "% Invalid input detected".to_string(),
            }),
        );
        self
    }

    pub fn fail_enable(mut self) -> Self {
        self.fail_enable = true;
        self
    }

    pub fn fail_config(mut self) -> Self {
        self.fail_config = true;
        self
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        self.journal.clone()
    }
}

impl Session for ScriptedSession {
    async fn enter_privileged(&mut self, secret: &str) -> Result<(), SessionError> {
        {
            let mut journal = self.journal.lock().unwrap();
            journal.calls.push(Call::Enable);
            journal.enable_secrets.push(secret.to_string());
        }
        if self.fail_enable {
            return Err(SessionError::Privilege {
                message: "% Access denied".to_string(),
            });
        }
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        {
            let mut journal = self.journal.lock().unwrap();
            journal.calls.push(Call::command(command));
            journal.commands.push(command.to_string());
        }
        self.responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn send_config(&mut self, commands: &[&str]) -> Result<(), SessionError> {
        {
            let mut journal = self.journal.lock().unwrap();
            journal.calls.push(Call::config(commands));
            journal
                .configs
                .push(commands.iter().map(|c| c.to_string()).collect());
        }
        if self.fail_config {
            return Err(SessionError::Config {
                message: "% Invalid input detected".to_string(),
            });
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        let mut journal = self.journal.lock().unwrap();
        journal.calls.push(Call::Disconnect);
        journal.disconnects += 1;
        Ok(())
    }
}

/// Connector handing out clones of one scripted session.
pub(crate) struct ScriptedConnector {
    session: Option<ScriptedSession>,
}

impl ScriptedConnector {
    pub fn new(session: ScriptedSession) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// A connector whose every connection attempt fails.
    pub fn refusing() -> Self {
        Self { session: None }
    }
}

impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    async fn connect(&self, device: &DeviceRecord) -> Result<ScriptedSession, SessionError> {
        let session = self.session.clone().ok_or_else(|| SessionError::Connection {
            host: device.hostname.clone(),
            message: "Operation timed out after 30s".to_string(),
        })?;
        session.journal.lock().unwrap().connects += 1;
        Ok(session)
    }
}

/// A cisco_ios device record for tests.
pub(crate) fn device(hostname: &str) -> DeviceRecord {
    DeviceRecord {
        hostname: hostname.to_string(),
        ip: "192.0.2.1".to_string(),
        username: "admin".to_string(),
        password: SecretString::from("cisco"),
        secret: SecretString::from("class"),
        device_type: "cisco_ios".to_string(),
        ntp: "192.0.2.123".to_string(),
    }
}
