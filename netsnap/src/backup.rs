//! Running-configuration backups.
//!
//! Each run writes one artifact per device at
//! `<root>/<hostname>/<hostname>-<timestamp>.txt`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info};

use crate::error::CollectError;
use crate::session::Session;

pub const COMMAND: &str = "show running-config";

/// Local wall-clock timestamp format used in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d-%H_%M_%S";

/// Current local time formatted for artifact names.
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Artifact location for `hostname` captured at `timestamp`.
pub fn backup_path(root: &Path, hostname: &str, timestamp: &str) -> PathBuf {
    root.join(hostname)
        .join(format!("{}-{}.txt", hostname, timestamp))
}

/// Check that `hostname` names exactly one directory below the backup root.
pub fn check_hostname(hostname: &str) -> Result<(), CollectError> {
    let usable = !hostname.is_empty()
        && hostname != "."
        && hostname != ".."
        && !hostname.contains(['/', '\\', '\0'])
        && !Path::new(hostname).is_absolute();

    if usable {
        Ok(())
    } else {
        Err(CollectError::InvalidHostname {
            hostname: hostname.to_string(),
        })
    }
}

/// Where backup artifacts are persisted.
pub trait ArtifactStore: Send + Sync {
    /// Create `path` and its parents if missing. Returns `true` when the
    /// directory was created by this call.
    fn ensure_directory(&self, path: &Path) -> io::Result<bool>;

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Local filesystem store.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl ArtifactStore for FsStore {
    fn ensure_directory(&self, path: &Path) -> io::Result<bool> {
        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(path)?;
        Ok(true)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }
}

/// A persisted running-configuration capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub hostname: String,
    pub timestamp: String,
    pub path: PathBuf,
    pub content: String,
}

/// Captures `show running-config` into an [`ArtifactStore`].
#[derive(Debug)]
pub struct BackupWriter<A> {
    root: PathBuf,
    store: A,
}

impl<A: ArtifactStore> BackupWriter<A> {
    pub fn new(root: impl Into<PathBuf>, store: A) -> Self {
        Self {
            root: root.into(),
            store,
        }
    }

    /// Capture the running configuration and write it verbatim.
    pub async fn backup<S: Session>(
        &self,
        session: &mut S,
        hostname: &str,
        timestamp: &str,
    ) -> Result<BackupArtifact, CollectError> {
        check_hostname(hostname)?;

        let directory = self.root.join(hostname);
        let created = self
            .store
            .ensure_directory(&directory)
            .map_err(|source| CollectError::Write {
                path: directory.clone(),
                source,
            })?;
        if created {
            info!("{}: created backup directory {}", hostname, directory.display());
        }

        let content = session.send_command(COMMAND).await?;

        let path = backup_path(&self.root, hostname, timestamp);
        self.store
            .write_file(&path, content.as_bytes())
            .map_err(|source| CollectError::Write {
                path: path.clone(),
                source,
            })?;
        debug!("{}: wrote {} bytes to {}", hostname, content.len(), path.display());

        Ok(BackupArtifact {
            hostname: hostname.to_string(),
            timestamp: timestamp.to_string(),
            path,
            content,
        })
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use super::ArtifactStore;

    #[derive(Debug, Default)]
    struct Contents {
        directories: HashSet<PathBuf>,
        files: HashMap<PathBuf, Vec<u8>>,
    }

    /// In-memory store whose clones share contents.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct MemoryStore {
        contents: Arc<Mutex<Contents>>,
        read_only: bool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// A store that refuses every write.
        pub fn read_only() -> Self {
            Self {
                read_only: true,
                ..Self::default()
            }
        }

        pub fn file(&self, path: &Path) -> Option<String> {
            let contents = self.contents.lock().unwrap();
            contents
                .files
                .get(path)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        }

        pub fn file_count(&self) -> usize {
            self.contents.lock().unwrap().files.len()
        }
    }

    impl ArtifactStore for MemoryStore {
        fn ensure_directory(&self, path: &Path) -> io::Result<bool> {
            Ok(self
                .contents
                .lock()
                .unwrap()
                .directories
                .insert(path.to_path_buf()))
        }

        fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            if self.read_only {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "read-only store",
                ));
            }
            self.contents
                .lock()
                .unwrap()
                .files
                .insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }
    }
}
