//! Device records and the deduplicating device registry.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use log::{info, warn};
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::RegistryError;

/// Connection parameters and facts-collection settings for one device.
///
/// `password` and `secret` are redacted from `Debug` output.
#[derive(Debug)]
pub struct DeviceRecord {
    /// Unique key within one batch run.
    pub hostname: String,
    pub ip: String,
    pub username: String,
    pub password: SecretString,
    /// Privileged-mode (`enable`) password.
    pub secret: SecretString,
    /// Selects the platform definition, e.g. `cisco_ios`.
    pub device_type: String,
    /// NTP server configured on and verified against the device.
    pub ntp: String,
}

/// One row of the device list as it appears in the CSV file.
#[derive(Deserialize)]
struct DeviceRow {
    hostname: String,
    ip: String,
    username: String,
    password: String,
    secret: String,
    device_type: String,
    ntp: String,
}

impl From<DeviceRow> for DeviceRecord {
    fn from(row: DeviceRow) -> Self {
        Self {
            hostname: row.hostname,
            ip: row.ip,
            username: row.username,
            password: SecretString::from(row.password),
            secret: SecretString::from(row.secret),
            device_type: row.device_type,
            ntp: row.ntp,
        }
    }
}

/// A record skipped because its hostname was already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    pub hostname: String,
    /// 1-based position of the skipped record in the source.
    pub position: usize,
}

/// Ordered, hostname-unique device list.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<DeviceRecord>,
    duplicates: Vec<DuplicateRecord>,
}

impl DeviceRegistry {
    /// Accept records in source order, keeping the first record per hostname.
    pub fn load(records: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut registry = Self::default();

        for (index, record) in records.into_iter().enumerate() {
            if seen.contains(&record.hostname) {
                warn!("Duplicated device '{}' - skipped", record.hostname);
                registry.duplicates.push(DuplicateRecord {
                    hostname: record.hostname,
                    position: index + 1,
                });
                continue;
            }

            info!("Add unique device '{}' to device list", record.hostname);
            seen.insert(record.hostname.clone());
            registry.devices.push(record);
        }

        registry
    }

    /// Accepted devices in first-seen order.
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// Records that were skipped as duplicates.
    pub fn duplicates(&self) -> &[DuplicateRecord] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Read device records from a CSV file with a header row.
pub fn read_devices(path: &Path) -> Result<Vec<DeviceRecord>, RegistryError> {
    let file = File::open(path).map_err(|source| RegistryError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_devices_from(file)
}

/// Read device records from any CSV source with a header row.
///
/// Columns may come in any order and extra columns are ignored; a row
/// missing one of the seven fields is an error.
pub fn read_devices_from<R: io::Read>(reader: R) -> Result<Vec<DeviceRecord>, RegistryError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .deserialize::<DeviceRow>()
        .map(|row| row.map(DeviceRecord::from).map_err(RegistryError::from))
        .collect()
}
