//! Sequential batch runner.

use log::info;

use crate::backup::ArtifactStore;
use crate::devices::DeviceRecord;
use crate::processor::{DeviceProcessor, ReportLine};
use crate::session::Connector;

/// Report lines of one batch run, in device order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub reports: Vec<ReportLine>,
}

impl BatchSummary {
    /// Devices whose facts were collected, including degraded ones.
    pub fn collected(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_aborted()).count()
    }

    /// Devices whose session could not be opened or elevated.
    pub fn aborted(&self) -> usize {
        self.reports.iter().filter(|r| r.is_aborted()).count()
    }
}

/// Processes devices one after another.
pub struct BatchRunner<C, A> {
    processor: DeviceProcessor<C, A>,
}

impl<C: Connector, A: ArtifactStore> BatchRunner<C, A> {
    pub fn new(processor: DeviceProcessor<C, A>) -> Self {
        Self { processor }
    }

    /// Process every device in order, handing each report line to `sink`
    /// as soon as its device finishes.
    pub async fn run<F>(&self, devices: &[DeviceRecord], mut sink: F) -> BatchSummary
    where
        F: FnMut(&ReportLine),
    {
        let mut summary = BatchSummary::default();

        for device in devices {
            let report = self.processor.process(device).await;
            sink(&report);
            summary.reports.push(report);
        }

        info!(
            "Processed {} devices: {} collected, {} aborted",
            summary.reports.len(),
            summary.collected(),
            summary.aborted()
        );
        summary
    }
}
