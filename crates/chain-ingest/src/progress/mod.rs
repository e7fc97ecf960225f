mod queue;
mod reporter;

use std::fmt;

pub use queue::{QueueDepth, QueueReceiver, QueueSender, Recv, bounded};
pub use reporter::{Drain, ProgressReporter};

use crate::error::Result;

pub type ProgressSender = QueueSender<ProgressEvent>;
pub type ProgressReceiver = QueueReceiver<ProgressEvent>;

pub fn progress_channel(
    capacity: usize,
) -> Result<(ProgressSender, ProgressReceiver, QueueDepth)> {
    bounded(capacity)
}

/// Events workers report to the single progress consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Blocks written by one flush.
    Blocks(u64),
    /// Transactions written by one flush.
    Txs(u64),
    Error(ErrorEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorEvent {
    /// A header fetch attempt failed at the transport level.
    Block { height: u64 },
    /// A transactions page fetch attempt failed at the transport level.
    Txs { height: u64, page: u32 },
    /// A whole chunk was abandoned.
    Chunk { start: u64, end: u64 },
}

/// Running tally rendered by the reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTotals {
    pub blocks: u64,
    pub txs: u64,
    pub errors: u64,
}

impl ProgressTotals {
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Blocks(n) => self.blocks += n,
            ProgressEvent::Txs(n) => self.txs += n,
            ProgressEvent::Error(_) => self.errors += 1,
        }
    }
}

impl fmt::Display for ProgressTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Blocks: {} Transactions: {} Errors: {}",
            self.blocks, self.txs, self.errors
        )
    }
}

/// Sends on an optional progress channel; a closed channel only loses the
/// report, never the ingestion.
pub(crate) async fn report(progress: Option<&ProgressSender>, event: ProgressEvent) {
    let Some(tx) = progress else {
        return;
    };
    if tx.send(event).await.is_err() {
        tracing::debug!(?event, "progress channel closed; dropping event");
    }
}
