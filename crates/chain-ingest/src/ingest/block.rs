use crate::error::{Error, Result};
use crate::fetch::RetryingFetcher;
use crate::flatten::{
    HeaderRecord, MessageGroups, TxRecord, flatten_header, flatten_tx, flatten_tx_message,
};
use crate::rpc::{RpcClient, TxMsg};

/// Everything one block contributes to a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedBlock {
    pub header: HeaderRecord,
    pub txs: Vec<TxRecord>,
    pub messages: MessageGroups,
    /// Messages whose tag or value could not be projected.
    pub unrecognized: usize,
}

pub struct BlockIngester<R> {
    fetcher: RetryingFetcher<R>,
}

impl<R: RpcClient> BlockIngester<R> {
    pub fn new(fetcher: RetryingFetcher<R>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &RetryingFetcher<R> {
        &self.fetcher
    }

    /// Fetches and flattens one block. Retries live in the fetcher; any
    /// error here ends the block.
    pub async fn ingest_block(&self, height: u64) -> Result<IngestedBlock> {
        let txs = self.fetcher.fetch_all_txs(height).await?;
        for tx in &txs {
            check_height(height, tx.height)?;
        }
        let tx_records = txs.iter().map(flatten_tx).collect();

        let header = self.fetcher.fetch_block_header(height).await?;
        check_height(height, header.height)?;
        let header = flatten_header(&header);

        let mut messages = MessageGroups::default();
        let mut unrecognized = 0;
        for tx in &txs {
            if let Some(TxMsg::Unrecognized { .. }) = tx.msg() {
                unrecognized += 1;
            }
            if let Some(record) = flatten_tx_message(tx).record {
                messages.push(record);
            }
        }

        tracing::trace!(height, txs = txs.len(), messages = messages.len(), "ingested block");
        Ok(IngestedBlock {
            header,
            txs: tx_records,
            messages,
            unrecognized,
        })
    }
}

fn check_height(expected: u64, got: Option<i64>) -> Result<()> {
    match got {
        Some(h) if u64::try_from(h).ok() != Some(expected) => {
            Err(Error::HeightMismatch { expected, got: h })
        }
        _ => Ok(()),
    }
}
