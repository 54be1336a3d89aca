//! NTP reachability, configuration and clock synchronization.

use log::{info, warn};

use super::{Fact, degrade};
use crate::error::CollectError;
use crate::session::{DeviceSession, Session};

pub const FAILED: &str = "DEVICE NTP FAILED";
pub const STATUS_COMMAND: &str = "show ntp status | include Clock is";
pub const TIMEZONE_CONFIG: &str = "clock timezone GMT 0 0";

const UNREACHABLE_MARKER: &str = "Success rate is 0";
const UNSYNCHRONIZED_MARKER: &str = "Clock is unsynchronized";
const UNREACHABLE_PREFIX: &str = "NTP server not reachable, ";

pub fn probe_command(server: &str) -> String {
    format!("ping {}", server)
}

pub fn server_config(server: &str) -> String {
    format!("ntp server {}", server)
}

/// A ping that got zero replies.
pub fn is_unreachable(ping_output: &str) -> bool {
    ping_output.contains(UNREACHABLE_MARKER)
}

pub fn is_synchronized(status_output: &str) -> bool {
    !status_output.contains(UNSYNCHRONIZED_MARKER)
}

/// Probe `server`, point the device at it when it answers, then report
/// clock synchronization.
pub async fn query<S: Session>(session: &mut S, server: &str) -> Result<String, CollectError> {
    let mut status = String::new();

    let probe = session.send_command(&probe_command(server)).await?;
    if is_unreachable(&probe) {
        status.push_str(UNREACHABLE_PREFIX);
    } else {
        session.send_config(&[&server_config(server)]).await?;
    }

    let clock = session.send_command(STATUS_COMMAND).await?;
    status.push_str(if is_synchronized(&clock) {
        "Clock is Sync"
    } else {
        "Clock is not sync"
    });

    Ok(status)
}

pub async fn collect<S: Session>(device: &mut DeviceSession<S>, server: &str) -> Fact {
    match query(device.session_mut(), server).await {
        Ok(status) => Fact::Collected(status),
        Err(e) => degrade(device.hostname(), "NTP info", e, FAILED),
    }
}

/// Set the device clock to GMT+0. Failure is logged and otherwise ignored.
pub async fn set_timezone_gmt<S: Session>(device: &mut DeviceSession<S>) -> bool {
    match device.session_mut().send_config(&[TIMEZONE_CONFIG]).await {
        Ok(()) => {
            info!("{}: timezone set to GMT+0", device.hostname());
            true
        }
        Err(e) => {
            warn!("Unable to set timezone GMT+0 on '{}': {}", device.hostname(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{Call, ScriptedConnector, ScriptedSession, device};

    const SERVER: &str = "192.0.2.123";

    const PING_OK: &str = "\
Type escape sequence to abort.
Sending 5, 100-byte ICMP Echos to 192.0.2.123, timeout is 2 seconds:
!!!!!
Success rate is 100 percent (5/5), round-trip min/avg/max = 1/1/4 ms";

    const PING_LOST: &str = "\
Type escape sequence to abort.
Sending 5, 100-byte ICMP Echos to 192.0.2.123, timeout is 2 seconds:
.....
Success rate is 0 percent (0/5)";

    #[tokio::test]
    async fn test_reachable_and_synced() {
        let session = ScriptedSession::new()
            .respond("ping 192.0.2.123", PING_OK)
            .respond(
                STATUS_COMMAND,
                "Clock is synchronized, stratum 3, reference is 192.0.2.123",
            );
        let journal = session.journal();
        let connector = ScriptedConnector::new(session);
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert_eq!(collect(&mut managed, SERVER).await.as_str(), "Clock is Sync");
        // Configured exactly once, between the probe and the status query
        assert_eq!(
            journal.lock().unwrap().calls,
            vec![
                Call::command("ping 192.0.2.123"),
                Call::config(&["ntp server 192.0.2.123"]),
                Call::command(STATUS_COMMAND),
            ]
        );
        managed.close().await;
    }

    #[tokio::test]
    async fn test_unreachable_skips_config() {
        let session = ScriptedSession::new()
            .respond("ping 192.0.2.123", PING_LOST)
            .respond(
                STATUS_COMMAND,
                "Clock is unsynchronized, stratum 16, no reference clock",
            );
        let journal = session.journal();
        let connector = ScriptedConnector::new(session);
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert_eq!(
            collect(&mut managed, SERVER).await.as_str(),
            "NTP server not reachable, Clock is not sync"
        );
        assert_eq!(
            journal.lock().unwrap().calls,
            vec![
                Call::command("ping 192.0.2.123"),
                Call::command(STATUS_COMMAND),
            ]
        );
        managed.close().await;
    }

    #[tokio::test]
    async fn test_config_rejected() {
        let session = ScriptedSession::new()
            .respond("ping 192.0.2.123", PING_OK)
            .fail_config();
        let journal = session.journal();
        let connector = ScriptedConnector::new(session);
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert_eq!(collect(&mut managed, SERVER).await, Fact::Failed(FAILED));
        // Status is never queried once configuration failed
        assert_eq!(journal.lock().unwrap().commands, vec!["ping 192.0.2.123"]);
        managed.close().await;
    }

    #[tokio::test]
    async fn test_set_timezone() {
        let session = ScriptedSession::new();
        let journal = session.journal();
        let connector = ScriptedConnector::new(session);
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert!(set_timezone_gmt(&mut managed).await);
        assert_eq!(
            journal.lock().unwrap().configs,
            vec![vec![TIMEZONE_CONFIG.to_string()]]
        );
        managed.close().await;
    }

    #[tokio::test]
    async fn test_set_timezone_failure_is_contained() {
        let connector = ScriptedConnector::new(ScriptedSession::new().fail_config());
        let mut managed = DeviceSession::open(&connector, &device("R1")).await.unwrap();

        assert!(!set_timezone_gmt(&mut managed).await);
        managed.close().await;
    }
}
