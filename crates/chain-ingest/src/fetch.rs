use std::sync::Arc;

use crate::error::{Error, Result};
use crate::progress::{self, ErrorEvent, ProgressEvent, ProgressSender};
use crate::rpc::{BlockHeader, RpcClient, Transaction};

pub const DEFAULT_RETRIES: i64 = 100;
pub const DEFAULT_TXS_PER_PAGE: u32 = 1000;

/// One page of a block's transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxPage {
    pub txs: Vec<Transaction>,
    /// False once the node returns an empty page; collection stops there.
    pub has_more: bool,
}

impl TxPage {
    fn new(txs: Vec<Transaction>) -> Self {
        let has_more = !txs.is_empty();
        Self { txs, has_more }
    }
}

/// Retry-protected access to the node.
///
/// Every call starts from a budget of `retries`. A failed transport attempt
/// reports an error event, then fails once the remaining budget has dropped
/// below zero, so a call that never succeeds is attempted `retries + 2` times.
pub struct RetryingFetcher<R> {
    client: Arc<R>,
    retries: i64,
    per_page: u32,
    progress: Option<ProgressSender>,
}

impl<R> Clone for RetryingFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            retries: self.retries,
            per_page: self.per_page,
            progress: self.progress.clone(),
        }
    }
}

impl<R: RpcClient> RetryingFetcher<R> {
    pub fn new(client: Arc<R>, retries: i64) -> Self {
        Self {
            client,
            retries,
            per_page: DEFAULT_TXS_PER_PAGE,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn client(&self) -> &Arc<R> {
        &self.client
    }

    pub fn progress(&self) -> Option<&ProgressSender> {
        self.progress.as_ref()
    }

    /// Fetches the header at `height`. A null body is retried without being
    /// reported while budget remains.
    pub async fn fetch_block_header(&self, height: u64) -> Result<BlockHeader> {
        let mut retries = self.retries;
        loop {
            match self.client.get_block(height).await {
                Ok(resp) => match resp.into_header() {
                    Some(header) => return Ok(header),
                    None if retries > 0 => {
                        tracing::debug!(height, retries_left = retries, "block body empty; retrying");
                        retries -= 1;
                    }
                    None => return Err(Error::BlockUnavailable { height }),
                },
                Err(e) if e.is_transient() => {
                    progress::report(
                        self.progress.as_ref(),
                        ProgressEvent::Error(ErrorEvent::Block { height }),
                    )
                    .await;
                    if retries < 0 {
                        tracing::warn!(height, error = %e, "out of retries fetching block");
                        return Err(Error::RetriesExceeded { height, page: None });
                    }
                    tracing::debug!(height, retries_left = retries, error = %e, "block fetch failed; retrying");
                    retries -= 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetches one transactions page with a fresh budget.
    pub async fn fetch_tx_page(
        &self,
        height: u64,
        page: u32,
        per_page: u32,
    ) -> Result<TxPage> {
        let mut retries = self.retries;
        self.fetch_tx_page_with(height, page, per_page, &mut retries)
            .await
    }

    /// Collects every transaction of the block, pages in order, until the
    /// node returns an empty page. All pages draw on one budget.
    pub async fn fetch_all_txs(&self, height: u64) -> Result<Vec<Transaction>> {
        let mut retries = self.retries;
        let mut txs = Vec::new();
        let mut page = 1u32;
        loop {
            let batch = self
                .fetch_tx_page_with(height, page, self.per_page, &mut retries)
                .await?;
            if !batch.has_more {
                break;
            }
            txs.extend(batch.txs);
            page += 1;
        }
        tracing::trace!(height, pages = page - 1, txs = txs.len(), "collected block transactions");
        Ok(txs)
    }

    async fn fetch_tx_page_with(
        &self,
        height: u64,
        page: u32,
        per_page: u32,
        retries: &mut i64,
    ) -> Result<TxPage> {
        loop {
            match self
                .client
                .get_block_transactions(height, page, per_page)
                .await
            {
                Ok(resp) => return Ok(TxPage::new(resp.txs)),
                Err(e) if e.is_transient() => {
                    progress::report(
                        self.progress.as_ref(),
                        ProgressEvent::Error(ErrorEvent::Txs { height, page }),
                    )
                    .await;
                    if *retries < 0 {
                        tracing::warn!(height, page, error = %e, "out of retries fetching transactions");
                        return Err(Error::RetriesExceeded {
                            height,
                            page: Some(page),
                        });
                    }
                    tracing::debug!(height, page, retries_left = *retries, error = %e, "transactions fetch failed; retrying");
                    *retries -= 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
