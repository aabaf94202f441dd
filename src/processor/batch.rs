use log::info;
use rayon::prelude::*;

use super::EpochProcessor;
use crate::prelude::Epoch;

/// Outcome of a batch of epochs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Epochs proposed by the observation source
    pub epochs: usize,
    /// Committed epochs
    pub processed: usize,
    /// Failed epochs (state restored, batch carried on)
    pub failed: usize,
}

impl BatchReport {
    /// True when at least one epoch was committed
    pub fn success(&self) -> bool {
        self.processed > 0
    }

    /// True when every epoch was committed
    pub fn is_complete(&self) -> bool {
        self.epochs > 0 && self.failed == 0
    }
}

impl EpochProcessor {
    /// Processes all epochs the observation source proposes for this site,
    /// within `[begin, end]`, in chronological order. Failed epochs
    /// are skipped.
    pub fn process_batch(&mut self, begin: Epoch, end: Epoch) -> BatchReport {
        let epochs = self.sources.observations.epochs(&self.site, begin, end);

        let mut report = BatchReport {
            epochs: epochs.len(),
            ..Default::default()
        };

        for t in epochs {
            match self.process_epoch(t) {
                Ok(_) => report.processed += 1,
                Err(_) => report.failed += 1,
            }
        }

        info!(
            "{} - {} to {}: {}/{} epochs committed",
            self.site, begin, end, report.processed, report.epochs
        );

        report
    }
}

/// Processes several sites in parallel. Each site is processed sequentially,
/// only the shared product container is accessed concurrently.
pub fn process_sites(
    processors: &mut [EpochProcessor],
    begin: Epoch,
    end: Epoch,
) -> Vec<BatchReport> {
    processors
        .par_iter_mut()
        .map(|processor| processor.process_batch(begin, end))
        .collect()
}
