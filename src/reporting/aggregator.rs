//! Single-writer aggregation of cleanup results.
//!
//! Workers send `(position, result)` pairs over an mpsc channel; one task owns
//! the slots and the running totals, so no partial sum is shared between tasks.

use super::cleanup_report::{CleanupReport, CleanupResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// A result tagged with the index of its resource id in the request
#[derive(Debug, Clone)]
pub struct PositionedResult {
    pub position: usize,
    pub result: CleanupResult,
}

impl PositionedResult {
    pub fn new(position: usize, result: CleanupResult) -> Self {
        Self { position, result }
    }
}

/// Collects positioned results and emits them in request order
#[derive(Debug)]
pub struct CleanupAggregator {
    slots: Vec<Option<CleanupResult>>,
}

impl CleanupAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            slots: vec![None; expected],
        }
    }

    pub fn record(&mut self, positioned: PositionedResult) {
        match self.slots.get_mut(positioned.position) {
            Some(slot) if slot.is_none() => *slot = Some(positioned.result),
            Some(_) => warn!(
                position = positioned.position,
                "Duplicate cleanup result for request position; keeping the first"
            ),
            None => warn!(
                position = positioned.position,
                "Cleanup result outside request bounds; dropping"
            ),
        }
    }

    pub fn finish(self) -> CleanupReport {
        CleanupReport::from_results(self.slots.into_iter().flatten().collect())
    }

    /// Drain `receiver` until every sender is dropped
    pub async fn run(mut self, mut receiver: mpsc::Receiver<PositionedResult>) -> CleanupReport {
        while let Some(positioned) = receiver.recv().await {
            self.record(positioned);
        }
        self.finish()
    }
}

/// Spawn the aggregator task. The report is returned once all senders are gone.
pub fn spawn_aggregator(
    expected: usize,
) -> (mpsc::Sender<PositionedResult>, JoinHandle<CleanupReport>) {
    let (sender, receiver) = mpsc::channel(expected.max(1));
    let handle = tokio::spawn(CleanupAggregator::new(expected).run(receiver));
    (sender, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_results_reordered_to_request_order() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let (sender, handle) = spawn_aggregator(ids.len());

        for position in [3usize, 0, 2, 1] {
            let result = CleanupResult::succeeded(ids[position], "stop", 1.0, 0.5);
            sender
                .send(PositionedResult::new(position, result))
                .await
                .unwrap();
        }
        drop(sender);

        let report = handle.await.unwrap();
        let order: Vec<Uuid> = report.results.iter().map(|r| r.resource_id).collect();
        assert_eq!(order, ids);
        assert_eq!(report.success_count, 4);
        assert_eq!(report.total_cost_saved, 4.0);
    }

    #[test]
    fn test_duplicate_position_counted_once() {
        let mut aggregator = CleanupAggregator::new(1);
        aggregator.record(PositionedResult::new(
            0,
            CleanupResult::succeeded(Uuid::nil(), "delete", 5.0, 0.0),
        ));
        aggregator.record(PositionedResult::new(
            0,
            CleanupResult::succeeded(Uuid::nil(), "delete", 5.0, 0.0),
        ));
        aggregator.record(PositionedResult::new(
            7,
            CleanupResult::failed(Uuid::nil(), "delete", "x"),
        ));

        let report = aggregator.finish();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.total_cost_saved, 5.0);
        assert_eq!(report.failure_count, 0);
    }
}
