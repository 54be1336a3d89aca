//! Fact extractors.
//!
//! Each extractor issues its commands on a live session and turns the
//! free-text output into a short fact string. Extractors never fail: a
//! command or parse error is logged and replaced by the extractor's
//! sentinel, so one broken fact never blocks the others.

pub mod cdp;
pub mod inventory;
pub mod ntp;
pub mod version;

use std::fmt;

use log::warn;

use crate::error::CollectError;

/// Outcome of one fact extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    Collected(String),
    /// Extraction failed; holds the extractor's sentinel string.
    Failed(&'static str),
}

impl Fact {
    pub fn as_str(&self) -> &str {
        match self {
            Fact::Collected(value) => value,
            Fact::Failed(sentinel) => sentinel,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fact::Failed(_))
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four facts collected per device, in report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facts {
    pub inventory: Fact,
    pub version: Fact,
    pub cdp: Fact,
    pub ntp: Fact,
}

impl Facts {
    /// Number of facts that degraded to a sentinel.
    pub fn failures(&self) -> usize {
        [&self.inventory, &self.version, &self.cdp, &self.ntp]
            .into_iter()
            .filter(|fact| fact.is_failed())
            .count()
    }
}

impl fmt::Display for Facts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.inventory, self.version, self.cdp, self.ntp
        )
    }
}

/// Log a collector failure and degrade to `sentinel`.
fn degrade(hostname: &str, what: &str, error: CollectError, sentinel: &'static str) -> Fact {
    warn!("Unable to get {} from '{}': {}", what, hostname, error);
    Fact::Failed(sentinel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facts_display_order() {
        let facts = Facts {
            inventory: Fact::Collected("WS-C3850-24T".to_string()),
            version: Fact::Failed(version::FAILED),
            cdp: Fact::Collected("CDP is OFF".to_string()),
            ntp: Fact::Collected("Clock is Sync".to_string()),
        };
        assert_eq!(
            facts.to_string(),
            "WS-C3850-24T | DEVICE VERSION FAILED | CDP is OFF | Clock is Sync"
        );
        assert_eq!(facts.failures(), 1);
    }
}
