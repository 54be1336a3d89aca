//! Chassis model from `show inventory`.

use super::{Fact, degrade};
use crate::error::CollectError;
use crate::session::{DeviceSession, Session};

pub const COMMAND: &str = "show inventory";
pub const FAILED: &str = "DEVICE INVENTORY FAILED";

const MARKER: &str = "PID:";

/// Extract the first PID, which is taken to be the chassis.
///
/// The value runs to the next comma on the same line, or to the end of
/// the line when there is none.
pub fn parse(output: &str) -> Result<String, CollectError> {
    let start = output
        .find(MARKER)
        .ok_or(CollectError::Parse { marker: MARKER })?
        + MARKER.len();

    let rest = &output[start..];
    let end = rest.find([',', '\n']).unwrap_or(rest.len());
    Ok(rest[..end].trim().to_string())
}

pub async fn query<S: Session>(session: &mut S) -> Result<String, CollectError> {
    let output = session.send_command(COMMAND).await?;
    parse(&output)
}

pub async fn collect<S: Session>(device: &mut DeviceSession<S>) -> Fact {
    match query(device.session_mut()).await {
        Ok(pid) => Fact::Collected(pid),
        Err(e) => degrade(device.hostname(), "inventory info", e, FAILED),
    }
}
