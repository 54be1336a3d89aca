//! Per-device processing.
//!
//! A device goes through
//! `Start → SessionOpen → Privileged → TerminalPrimed → BackedUp →
//! FactsCollected → Reported → Closed` in order. Backup and fact failures
//! degrade to sentinels and never skip a later step; only a session that
//! cannot be opened or elevated aborts the device.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::backup::{ArtifactStore, BackupWriter, timestamp_now};
use crate::config::BatchConfig;
use crate::devices::DeviceRecord;
use crate::error::SessionError;
use crate::facts::{Facts, cdp, inventory, ntp, version};
use crate::session::{Connector, DeviceSession};

pub const CONNECTION_FAILED: &str = "DEVICE CONNECTION FAILED";
pub const ENABLE_FAILED: &str = "DEVICE ENABLE FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessorState {
    Start,
    SessionOpen,
    Privileged,
    TerminalPrimed,
    BackedUp,
    FactsCollected,
    Reported,
    Closed,
}

/// How processing of one device ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOutcome {
    Collected(Facts),
    /// The session could not be opened or elevated.
    Aborted {
        sentinel: &'static str,
        reason: SessionError,
    },
}

/// The result of processing one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub hostname: String,
    pub timestamp: String,
    pub outcome: DeviceOutcome,
    /// Backup artifact written during this run, if any.
    pub backup: Option<PathBuf>,
    /// Last state reached before the session was closed.
    pub reached: ProcessorState,
}

impl ReportLine {
    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, DeviceOutcome::Aborted { .. })
    }

    pub fn facts(&self) -> Option<&Facts> {
        match &self.outcome {
            DeviceOutcome::Collected(facts) => Some(facts),
            DeviceOutcome::Aborted { .. } => None,
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            DeviceOutcome::Collected(facts) => write!(f, "{} | {}", self.hostname, facts),
            DeviceOutcome::Aborted { sentinel, .. } => write!(f, "{} | {}", self.hostname, sentinel),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessorOptions {
    /// Pause after each terminal-priming command.
    pub prime_delay: Duration,
    /// Set the device clock to GMT+0 before the NTP fact.
    pub set_timezone: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            prime_delay: Duration::from_secs(1),
            set_timezone: false,
        }
    }
}

impl From<&BatchConfig> for ProcessorOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            prime_delay: config.prime_delay,
            set_timezone: config.set_timezone,
        }
    }
}

/// State tracking for one device, logged at every transition.
struct Progress<'a> {
    hostname: &'a str,
    state: ProcessorState,
}

impl<'a> Progress<'a> {
    fn new(hostname: &'a str) -> Self {
        Self {
            hostname,
            state: ProcessorState::Start,
        }
    }

    fn advance(&mut self, next: ProcessorState) {
        debug!("{}: {:?} -> {:?}", self.hostname, self.state, next);
        self.state = next;
    }
}

/// Runs the full collection sequence on one device at a time.
pub struct DeviceProcessor<C, A> {
    connector: C,
    backups: BackupWriter<A>,
    options: ProcessorOptions,
}

impl<C: Connector, A: ArtifactStore> DeviceProcessor<C, A> {
    pub fn new(connector: C, backups: BackupWriter<A>, options: ProcessorOptions) -> Self {
        Self {
            connector,
            backups,
            options,
        }
    }

    /// Process `device`, stamping its artifact with the current local time.
    pub async fn process(&self, device: &DeviceRecord) -> ReportLine {
        self.process_at(device, timestamp_now()).await
    }

    /// Process `device` with an explicit timestamp.
    pub async fn process_at(&self, device: &DeviceRecord, timestamp: String) -> ReportLine {
        let hostname = device.hostname.as_str();
        let mut progress = Progress::new(hostname);
        info!("{}: processing {}", hostname, device.ip);

        let mut session = match DeviceSession::open(&self.connector, device).await {
            Ok(session) => session,
            Err(e) => {
                error!("Unable to connect to device '{}': {}", hostname, e);
                return aborted(device, timestamp, CONNECTION_FAILED, e, progress.state);
            }
        };
        progress.advance(ProcessorState::SessionOpen);

        if let Err(e) = session.elevate(&device.secret).await {
            error!("Unable to enter privileged mode on '{}': {}", hostname, e);
            let reached = progress.state;
            session.close().await;
            progress.advance(ProcessorState::Closed);
            return aborted(device, timestamp, ENABLE_FAILED, e, reached);
        }
        progress.advance(ProcessorState::Privileged);

        if let Err(e) = session.prime(self.options.prime_delay).await {
            warn!("{}: terminal priming failed: {}", hostname, e);
        }
        progress.advance(ProcessorState::TerminalPrimed);

        let backup = match self
            .backups
            .backup(session.session_mut(), hostname, &timestamp)
            .await
        {
            Ok(artifact) => {
                info!("{}: backup saved to {}", hostname, artifact.path.display());
                Some(artifact.path)
            }
            Err(e) => {
                error!("Unable to backup device '{}': {}", hostname, e);
                None
            }
        };
        progress.advance(ProcessorState::BackedUp);

        let facts = self.collect_facts(&mut session, device).await;
        progress.advance(ProcessorState::FactsCollected);

        if facts.failures() > 0 {
            warn!("{}: {} of 4 facts failed", hostname, facts.failures());
        }
        let report = ReportLine {
            hostname: device.hostname.clone(),
            timestamp,
            outcome: DeviceOutcome::Collected(facts),
            backup,
            reached: ProcessorState::Reported,
        };
        progress.advance(ProcessorState::Reported);

        session.close().await;
        progress.advance(ProcessorState::Closed);
        report
    }

    async fn collect_facts(
        &self,
        session: &mut DeviceSession<C::Session>,
        device: &DeviceRecord,
    ) -> Facts {
        let inventory = inventory::collect(session).await;
        let version = version::collect(session).await;
        let cdp = cdp::collect(session).await;

        if self.options.set_timezone {
            ntp::set_timezone_gmt(session).await;
        }
        let ntp = ntp::collect(session, &device.ntp).await;

        Facts {
            inventory,
            version,
            cdp,
            ntp,
        }
    }
}

fn aborted(
    device: &DeviceRecord,
    timestamp: String,
    sentinel: &'static str,
    reason: SessionError,
    reached: ProcessorState,
) -> ReportLine {
    ReportLine {
        hostname: device.hostname.clone(),
        timestamp,
        outcome: DeviceOutcome::Aborted { sentinel, reason },
        backup: None,
        reached,
    }
}
