use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::domain::SegmentRange;
use crate::error::{Error, Result};
use crate::ingest::{BatchWriter, RangeSummary};
use crate::progress::{self, ErrorEvent, ProgressEvent};
use crate::rpc::RpcClient;
use crate::sink::SegmentSink;

/// Splits `start..=end` into contiguous chunks of `chunk_size` blocks; the
/// last chunk may be shorter.
pub fn chunk_bounds(start: u64, end: u64, chunk_size: u64) -> Vec<SegmentRange> {
    let mut chunks = Vec::new();
    if start > end || chunk_size == 0 {
        return chunks;
    }
    let mut lo = start;
    loop {
        let hi = lo.saturating_add(chunk_size - 1).min(end);
        chunks.push(SegmentRange::new(lo, hi));
        if hi == end {
            break;
        }
        lo = hi + 1;
    }
    chunks
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    pub range: SegmentRange,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<SegmentRange>,
    pub failures: Vec<ChunkFailure>,
    /// Chunks stopped or never started because of cancellation.
    pub cancelled: Vec<SegmentRange>,
    pub blocks: u64,
    pub txs: u64,
    pub unrecognized_msgs: u64,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty()
    }

    fn absorb(&mut self, range: SegmentRange, done: RangeSummary) {
        self.blocks += done.blocks;
        self.txs += done.txs;
        self.unrecognized_msgs += done.unrecognized_msgs;
        self.completed.push(range);
    }

    /// Records every range still in `unreported` as failed and returns them.
    fn fail_unreported(
        &mut self,
        unreported: BTreeSet<SegmentRange>,
        message: &str,
    ) -> Vec<SegmentRange> {
        let lost: Vec<SegmentRange> = unreported.into_iter().collect();
        self.failures.extend(lost.iter().map(|&range| ChunkFailure {
            range,
            message: message.to_string(),
        }));
        lost
    }

    fn sort(&mut self) {
        self.completed.sort();
        self.failures.sort_by_key(|f| f.range);
        self.cancelled.sort();
    }
}

/// Runs chunks of a range on a bounded pool of workers. A failed chunk is
/// reported and recorded without stopping its siblings.
pub struct RangeCoordinator<R, S> {
    writer: Arc<BatchWriter<R, S>>,
    concurrency: usize,
}

impl<R, S> RangeCoordinator<R, S>
where
    R: RpcClient + 'static,
    S: SegmentSink + 'static,
{
    pub fn new(writer: BatchWriter<R, S>, concurrency: usize) -> Self {
        Self {
            writer: Arc::new(writer),
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Dispatches the chunks of `start..=end` in order and waits for all of
    /// them.
    pub async fn run(&self, start: u64, end: u64) -> Result<RunSummary> {
        let chunks = chunk_bounds(start, end, self.writer.batch_size());
        tracing::info!(
            start,
            end,
            chunks = chunks.len(),
            workers = self.concurrency,
            "dispatching chunks"
        );

        let cancel = self.writer.cancellation().clone();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();
        let mut unreported = BTreeSet::new();

        let mut pending = chunks.into_iter();
        for range in pending.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    summary.cancelled.push(range);
                    break;
                }
                permit = Arc::clone(&permits).acquire_owned() => permit
                    .map_err(|e| Error::Internal(format!("worker pool closed: {e}")))?,
            };
            let writer = Arc::clone(&self.writer);
            unreported.insert(range);
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = AssertUnwindSafe(writer.ingest_range(range.start, range.end))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(Error::Internal(format!("chunk {range} worker panicked")))
                    });
                (range, outcome)
            });
        }
        summary.cancelled.extend(pending);

        while let Some(joined) = tasks.join_next().await {
            // A lost task has no range attached; whatever is still unreported
            // once the set drains is recorded below.
            let (range, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(error = %e, "chunk worker lost");
                    continue;
                }
            };
            unreported.remove(&range);
            match outcome {
                Ok(done) => summary.absorb(range, done),
                Err(Error::Cancelled) => summary.cancelled.push(range),
                Err(e) => {
                    tracing::error!(start = range.start, end = range.end, error = %e, "chunk failed");
                    self.report_chunk_error(range).await;
                    summary.failures.push(ChunkFailure {
                        range,
                        message: e.to_string(),
                    });
                }
            }
        }
        for range in summary.fail_unreported(unreported, "chunk worker lost before reporting") {
            self.report_chunk_error(range).await;
        }

        summary.sort();
        tracing::info!(
            completed = summary.completed.len(),
            failed = summary.failures.len(),
            cancelled = summary.cancelled.len(),
            blocks = summary.blocks,
            txs = summary.txs,
            unrecognized_msgs = summary.unrecognized_msgs,
            "range finished"
        );
        Ok(summary)
    }

    async fn report_chunk_error(&self, range: SegmentRange) {
        progress::report(
            self.writer.progress(),
            ProgressEvent::Error(ErrorEvent::Chunk {
                start: range.start,
                end: range.end,
            }),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_the_range_without_gaps() {
        let chunks = chunk_bounds(1, 1000, 300);
        assert_eq!(
            chunks,
            vec![
                SegmentRange::new(1, 300),
                SegmentRange::new(301, 600),
                SegmentRange::new(601, 900),
                SegmentRange::new(901, 1000),
            ]
        );
    }

    #[test]
    fn inverted_or_zero_sized_requests_yield_nothing() {
        assert!(chunk_bounds(10, 9, 5).is_empty());
        assert!(chunk_bounds(1, 9, 0).is_empty());
        assert_eq!(chunk_bounds(5, 5, 250), vec![SegmentRange::new(5, 5)]);
    }

    #[test]
    fn unreported_chunks_become_failures_next_to_reported_ones() {
        let mut summary = RunSummary::default();
        summary.absorb(SegmentRange::new(1, 10), RangeSummary::default());
        let unreported = BTreeSet::from([SegmentRange::new(21, 30), SegmentRange::new(11, 20)]);

        let lost = summary.fail_unreported(unreported, "lost");
        assert_eq!(lost, vec![SegmentRange::new(11, 20), SegmentRange::new(21, 30)]);
        assert_eq!(summary.completed, vec![SegmentRange::new(1, 10)]);
        assert_eq!(summary.failures.len(), 2);
        assert!(summary.failures.iter().all(|f| f.message == "lost"));
        assert!(!summary.is_success());

        assert!(summary.fail_unreported(BTreeSet::new(), "lost").is_empty());
        assert_eq!(summary.failures.len(), 2);
    }

    #[test]
    fn near_u64_max_does_not_overflow() {
        let chunks = chunk_bounds(u64::MAX - 2, u64::MAX, 2);
        assert_eq!(
            chunks,
            vec![
                SegmentRange::new(u64::MAX - 2, u64::MAX - 1),
                SegmentRange::new(u64::MAX, u64::MAX),
            ]
        );
    }
}
