use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::SegmentRange;
use crate::error::{Error, Result};
use crate::fetch::RetryingFetcher;
use crate::ingest::batch::{Batch, FlushSummary};
use crate::ingest::block::BlockIngester;
use crate::progress::{self, ProgressEvent, ProgressSender};
use crate::rpc::RpcClient;
use crate::sink::SegmentSink;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSummary {
    pub flushes: Vec<FlushSummary>,
    pub blocks: u64,
    pub txs: u64,
    pub unrecognized_msgs: u64,
}

impl RangeSummary {
    fn record(&mut self, flush: FlushSummary) {
        self.blocks += flush.headers as u64;
        self.txs += flush.txs as u64;
        self.unrecognized_msgs += flush.unrecognized as u64;
        self.flushes.push(flush);
    }
}

/// Walks a block range in height order and writes it out in segments of at
/// most `batch_size` blocks.
pub struct BatchWriter<R, S> {
    ingester: BlockIngester<R>,
    sink: Arc<S>,
    batch_size: u64,
    progress: Option<ProgressSender>,
    cancel: CancellationToken,
}

impl<R, S> BatchWriter<R, S>
where
    R: RpcClient,
    S: SegmentSink + 'static,
{
    pub fn new(fetcher: RetryingFetcher<R>, sink: Arc<S>, batch_size: u64) -> Result<Self> {
        if batch_size < 1 {
            return Err(Error::Config("batch_size must be >= 1".to_string()));
        }
        let progress = fetcher.progress().cloned();
        Ok(Self {
            ingester: BlockIngester::new(fetcher),
            sink,
            batch_size,
            progress,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn progress(&self) -> Option<&ProgressSender> {
        self.progress.as_ref()
    }

    /// Ingests `start..=end`.
    ///
    /// A flush happens before the block at offset `i` whenever `i` is a
    /// positive multiple of `batch_size`, and once more for the tail. On
    /// cancellation the blocks gathered so far are flushed and the call
    /// returns `Error::Cancelled`.
    pub async fn ingest_range(&self, start: u64, end: u64) -> Result<RangeSummary> {
        let mut summary = RangeSummary::default();
        if start > end {
            return Ok(summary);
        }

        let mut batch = Batch::default();
        let mut group_start = start;
        for height in start..=end {
            let offset = height - start;
            if offset > 0 && offset % self.batch_size == 0 {
                let full = std::mem::take(&mut batch);
                summary.record(self.flush(full, SegmentRange::new(group_start, height - 1)).await?);
                group_start = height;
            }

            if self.cancel.is_cancelled() {
                if !batch.is_empty() {
                    let partial = std::mem::take(&mut batch);
                    self.flush(partial, SegmentRange::new(group_start, height - 1))
                        .await?;
                }
                tracing::info!(start, end, stopped_at = height, "range ingestion cancelled");
                return Err(Error::Cancelled);
            }

            let block = self.ingester.ingest_block(height).await?;
            batch.push(block);
        }

        if !batch.is_empty() {
            summary.record(self.flush(batch, SegmentRange::new(group_start, end)).await?);
        }
        Ok(summary)
    }

    async fn flush(&self, batch: Batch, range: SegmentRange) -> Result<FlushSummary> {
        let sink = Arc::clone(&self.sink);
        let flushed = tokio::task::spawn_blocking(move || batch.write_to(sink.as_ref(), range))
            .await
            .map_err(|e| Error::Internal(format!("flush task for {range}: {e}")))??;

        tracing::info!(
            range = %range,
            blocks = flushed.headers,
            txs = flushed.txs,
            message_tables = flushed.messages.len(),
            "flushed batch"
        );
        progress::report(
            self.progress.as_ref(),
            ProgressEvent::Blocks(flushed.headers as u64),
        )
        .await;
        progress::report(self.progress.as_ref(), ProgressEvent::Txs(flushed.txs as u64)).await;
        Ok(flushed)
    }
}
