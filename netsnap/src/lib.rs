//! # netsnap
//!
//! Batch backup and facts collection for Cisco IOS devices over SSH.
//!
//! For each device in a CSV list, netsnap opens an SSH session, enters
//! privileged mode, saves the running configuration to
//! `<backup>/<hostname>/<hostname>-<timestamp>.txt` and prints one report
//! line:
//!
//! ```text
//! R1 | CISCO2901/K9 | c2900-universalk9-mz.SPA.157-3.M3 | PE  | CDP is ON, 2 peers | Clock is Sync
//! ```
//!
//! Devices are processed one at a time. A device that cannot be reached
//! or elevated is reported and skipped; a fact that cannot be read is
//! replaced by a sentinel such as `DEVICE VERSION FAILED`.
//!
//! ## Layers
//!
//! - [`transport`], [`channel`], [`driver`], [`platform`]: async SSH shell
//!   automation (russh, prompt patterns, privilege levels).
//! - [`session`]: the narrow command-session capability the collectors use.
//! - [`backup`], [`facts`], [`processor`], [`batch`]: the collection run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netsnap::BatchConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netsnap::Error> {
//!     let config = BatchConfig::new("devices.csv", "backup");
//!     let summary = netsnap::run(&config, |report| println!("{}", report)).await?;
//!     println!("{} aborted", summary.aborted());
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod batch;
pub mod channel;
pub mod config;
pub mod devices;
pub mod driver;
pub mod error;
pub mod facts;
pub mod platform;
pub mod processor;
pub mod session;
pub mod transport;

use log::{info, warn};

// Re-export main types for convenience
pub use backup::{ArtifactStore, BackupWriter, FsStore};
pub use batch::{BatchRunner, BatchSummary};
pub use config::BatchConfig;
pub use devices::{DeviceRecord, DeviceRegistry};
pub use error::{Error, Result};
pub use facts::{Fact, Facts};
pub use processor::{DeviceProcessor, ProcessorOptions, ReportLine};
pub use session::{Connector, DeviceSession, Session, SshConnector};

/// Run one batch over SSH as described by `config`.
///
/// Only a missing or malformed device list fails the run; per-device
/// failures show up in the report lines.
pub async fn run<F>(config: &BatchConfig, on_report: F) -> Result<BatchSummary>
where
    F: FnMut(&ReportLine),
{
    let records = devices::read_devices(&config.device_file)?;
    let registry = DeviceRegistry::load(records);
    info!(
        "Loaded {} devices from {}",
        registry.len(),
        config.device_file.display()
    );
    if !registry.duplicates().is_empty() {
        warn!("{} duplicate records skipped", registry.duplicates().len());
    }

    let processor = DeviceProcessor::new(
        SshConnector::new(config),
        BackupWriter::new(&config.backup_root, FsStore),
        ProcessorOptions::from(config),
    );
    let summary = BatchRunner::new(processor)
        .run(registry.devices(), on_report)
        .await;

    Ok(summary)
}
