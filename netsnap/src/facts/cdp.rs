//! CDP state and neighbor count.

use std::fmt;

use super::{Fact, degrade};
use crate::error::CollectError;
use crate::session::{DeviceSession, Session};

pub const STATUS_COMMAND: &str = "show cdp";
pub const NEIGHBORS_COMMAND: &str = "show cdp neighbors";

/// `show cdp` itself failed.
pub const RUN_FAILED: &str = "DEVICE CDP RUN FAILED";
/// CDP is on but the neighbor table could not be read.
pub const NEIGHBORS_FAILED: &str = "DEVICE CDP NEIGHBOURS FAILED";

const DISABLED_MARKER: &str = "CDP is not enabled";
const HEADER_MARKER: &str = "Device ID";
const TRAILER: &str = "Total cdp entries displayed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdpStatus {
    Off,
    On { peers: usize },
}

impl fmt::Display for CdpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdpStatus::Off => f.write_str("CDP is OFF"),
            CdpStatus::On { peers } => write!(f, "CDP is ON, {} peers", peers),
        }
    }
}

pub fn is_enabled(status_output: &str) -> bool {
    !status_output.contains(DISABLED_MARKER)
}

/// Count neighbor entries in `show cdp neighbors` output.
///
/// Each entry starts on a non-indented line; long device IDs push the rest
/// of the entry onto an indented continuation line. Blank lines and the
/// `Total cdp entries displayed` trailer are skipped rather than counted, so
/// the result is the number of neighbors and not the number of lines.
pub fn count_neighbors(output: &str) -> Result<usize, CollectError> {
    let start = output
        .find(HEADER_MARKER)
        .ok_or(CollectError::Parse {
            marker: HEADER_MARKER,
        })?;

    let entries = output[start..]
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter(|line| !line.starts_with(TRAILER))
        .count();

    // The header line itself is non-indented.
    Ok(entries.saturating_sub(1))
}

pub async fn query_neighbors<S: Session>(session: &mut S) -> Result<usize, CollectError> {
    let output = session.send_command(NEIGHBORS_COMMAND).await?;
    count_neighbors(&output)
}

/// Report CDP state, querying neighbors only when CDP runs.
pub async fn collect<S: Session>(device: &mut DeviceSession<S>) -> Fact {
    let enabled = match device.session_mut().send_command(STATUS_COMMAND).await {
        Ok(output) => is_enabled(&output),
        Err(e) => return degrade(device.hostname(), "CDP info", e.into(), RUN_FAILED),
    };

    if !enabled {
        return Fact::Collected(CdpStatus::Off.to_string());
    }

    match query_neighbors(device.session_mut()).await {
        Ok(peers) => Fact::Collected(CdpStatus::On { peers }.to_string()),
        Err(e) => degrade(device.hostname(), "CDP neighbors", e, NEIGHBORS_FAILED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{ScriptedConnector, ScriptedSession, device};

    const SHOW_CDP: &str = "\
Global CDP information:
        Sending CDP packets every 60 seconds
        Sending a holdtime value of 180 seconds
        Sending CDPv2 advertisements is  enabled";

    const NEIGHBORS: &str = "\
Capability Codes: R - Router, T - Trans Bridge, B - Source Route Bridge
                  S - Switch, H - Host, I - IGMP, r - Repeater, P - Phone

Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID
SW1              Gig 0/0           157             S I    WS-C3850- Gig 1/0/1
core-router-01.example.net
                 Gig 0/1           141             R B    ISR4451-X Gig 0/0/0
R3               Gig 0/2           170             R      CISCO2901 Gig 0/1

Total cdp entries displayed : 3";

    #[test]
    fn test_count_neighbors_with_wrapped_entry() {
        assert_eq!(count_neighbors(NEIGHBORS).unwrap(), 3);
    }

    #[test]
    fn test_count_neighbors_two_wrapped_entries() {
        let output = "\
Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID
dist-switch-01.example.net
                 Gig 0/0           150             S I    WS-C3850- Gig 1/0/1
R2               Gig 0/1           133             R B    ISR4451-X Gig 0/0/0
access-switch-17.example.net
                 Gig 0/2           162             S I    WS-C2960X Gig 1/0/48";
        assert_eq!(count_neighbors(output).unwrap(), 3);
    }

    #[test]
    fn test_count_neighbors_empty_table() {
        let output = "Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID\n\n\
                      Total cdp entries displayed : 0";
        assert_eq!(count_neighbors(output).unwrap(), 0);
    }

    #[test]
    fn test_count_neighbors_missing_header() {
        assert!(count_neighbors("% CDP is not enabled").is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(CdpStatus::Off.to_string(), "CDP is OFF");
        assert_eq!(CdpStatus::On { peers: 2 }.to_string(), "CDP is ON, 2 peers");
    }

    #[tokio::test]
    async fn test_collect_disabled_skips_neighbors() {
        let session = ScriptedSession::new().respond(STATUS_COMMAND, "% CDP is not enabled");
        let journal = session.journal();
        let connector = ScriptedConnector::new(session);
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert_eq!(collect(&mut managed).await.as_str(), "CDP is OFF");
        assert_eq!(journal.lock().unwrap().commands, vec![STATUS_COMMAND]);
        managed.close().await;
    }

    #[tokio::test]
    async fn test_collect_enabled() {
        let session = ScriptedSession::new()
            .respond(STATUS_COMMAND, SHOW_CDP)
            .respond(NEIGHBORS_COMMAND, NEIGHBORS);
        let connector = ScriptedConnector::new(session);
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert_eq!(collect(&mut managed).await.as_str(), "CDP is ON, 3 peers");
        managed.close().await;
    }

    #[tokio::test]
    async fn test_collect_status_failure() {
        let connector = ScriptedConnector::new(ScriptedSession::new().fail(STATUS_COMMAND));
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert_eq!(collect(&mut managed).await, Fact::Failed(RUN_FAILED));
        managed.close().await;
    }

    #[tokio::test]
    async fn test_collect_neighbors_failure() {
        let session = ScriptedSession::new()
            .respond(STATUS_COMMAND, SHOW_CDP)
            .fail(NEIGHBORS_COMMAND);
        let connector = ScriptedConnector::new(session);
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert_eq!(collect(&mut managed).await, Fact::Failed(NEIGHBORS_FAILED));
        managed.close().await;
    }
}
