#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chain_ingest::error::{Error, Result};
use chain_ingest::progress::{ProgressEvent, ProgressReceiver, Recv};
use chain_ingest::rpc::RpcClient;
use chain_ingest::rpc::types::{BlockHeader, BlockResponse, BlockTxsResponse, Transaction};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Scriptable in-process node.
///
/// Block `h` carries `txs_per_block` synthetic transactions: even indexes
/// are `pos/Send`, odd indexes carry the unknown `pos/Mint` tag.
pub struct FakeRpc {
    pub chain_height: u64,
    txs_per_block: usize,
    overrides: Mutex<HashMap<u64, Vec<Transaction>>>,
    header_failures: Mutex<HashMap<u64, usize>>,
    null_headers: Mutex<HashMap<u64, usize>>,
    page_failures: Mutex<HashMap<(u64, u32), usize>>,
    broken: Mutex<HashSet<u64>>,
    header_calls: Mutex<HashMap<u64, usize>>,
    page_calls: Mutex<HashMap<(u64, u32), usize>>,
    cancel_at: Mutex<Option<(u64, CancellationToken)>>,
}

impl FakeRpc {
    pub fn new(txs_per_block: usize) -> Self {
        Self {
            chain_height: 1_000_000,
            txs_per_block,
            overrides: Mutex::new(HashMap::new()),
            header_failures: Mutex::new(HashMap::new()),
            null_headers: Mutex::new(HashMap::new()),
            page_failures: Mutex::new(HashMap::new()),
            broken: Mutex::new(HashSet::new()),
            header_calls: Mutex::new(HashMap::new()),
            page_calls: Mutex::new(HashMap::new()),
            cancel_at: Mutex::new(None),
        }
    }

    /// Fail the first `n` header requests for `height` at the transport level.
    pub fn fail_headers(self, height: u64, n: usize) -> Self {
        self.header_failures.lock().expect("lock").insert(height, n);
        self
    }

    /// Answer the first `n` header requests for `height` with a null block.
    pub fn null_headers(self, height: u64, n: usize) -> Self {
        self.null_headers.lock().expect("lock").insert(height, n);
        self
    }

    pub fn fail_page(self, height: u64, page: u32, n: usize) -> Self {
        self.page_failures
            .lock()
            .expect("lock")
            .insert((height, page), n);
        self
    }

    /// Every request touching `height` fails.
    pub fn break_height(self, height: u64) -> Self {
        self.broken.lock().expect("lock").insert(height);
        self
    }

    pub fn with_txs(self, height: u64, txs: Vec<Transaction>) -> Self {
        self.overrides.lock().expect("lock").insert(height, txs);
        self
    }

    /// Cancels `token` when the header for `height` is first requested.
    pub fn cancel_when_reaching(self, height: u64, token: CancellationToken) -> Self {
        *self.cancel_at.lock().expect("lock") = Some((height, token));
        self
    }

    pub fn header_calls(&self, height: u64) -> usize {
        self.header_calls
            .lock()
            .expect("lock")
            .get(&height)
            .copied()
            .unwrap_or(0)
    }

    pub fn page_calls(&self, height: u64, page: u32) -> usize {
        self.page_calls
            .lock()
            .expect("lock")
            .get(&(height, page))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_page_calls(&self, height: u64) -> usize {
        self.page_calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|((h, _), _)| *h == height)
            .map(|(_, n)| *n)
            .sum()
    }

    fn block_txs(&self, height: u64) -> Vec<Transaction> {
        if let Some(txs) = self.overrides.lock().expect("lock").get(&height) {
            return txs.clone();
        }
        (0..self.txs_per_block)
            .map(|index| synthetic_tx(height, index))
            .collect()
    }

    fn is_broken(&self, height: u64) -> bool {
        self.broken.lock().expect("lock").contains(&height)
    }
}

fn take_one(map: &Mutex<HashMap<u64, usize>>, height: u64) -> bool {
    let mut guard = map.lock().expect("lock");
    match guard.get_mut(&height) {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        _ => false,
    }
}

#[async_trait]
impl RpcClient for FakeRpc {
    async fn get_height(&self) -> Result<u64> {
        Ok(self.chain_height)
    }

    async fn get_block(&self, height: u64) -> Result<BlockResponse> {
        *self
            .header_calls
            .lock()
            .expect("lock")
            .entry(height)
            .or_default() += 1;
        if let Some((at, token)) = self.cancel_at.lock().expect("lock").as_ref() {
            if *at == height {
                token.cancel();
            }
        }
        if self.is_broken(height) || take_one(&self.header_failures, height) {
            return Err(Error::Rpc(format!("connection reset fetching block {height}")));
        }
        if take_one(&self.null_headers, height) {
            return Ok(BlockResponse::empty());
        }
        Ok(BlockResponse::with_header(synthetic_header(
            height,
            self.block_txs(height).len(),
        )))
    }

    async fn get_block_transactions(
        &self,
        height: u64,
        page: u32,
        per_page: u32,
    ) -> Result<BlockTxsResponse> {
        *self
            .page_calls
            .lock()
            .expect("lock")
            .entry((height, page))
            .or_default() += 1;
        let scripted = {
            let mut guard = self.page_failures.lock().expect("lock");
            match guard.get_mut(&(height, page)) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    true
                }
                _ => false,
            }
        };
        if self.is_broken(height) || scripted {
            return Err(Error::Rpc(format!(
                "timeout fetching block {height} page {page}"
            )));
        }
        let per_page = per_page as usize;
        let txs: Vec<Transaction> = self
            .block_txs(height)
            .into_iter()
            .skip((page as usize - 1) * per_page)
            .take(per_page)
            .collect();
        Ok(BlockTxsResponse::page(txs))
    }
}

pub fn synthetic_header(height: u64, num_txs: usize) -> BlockHeader {
    BlockHeader {
        chain_id: Some("testnet".to_string()),
        height: Some(height as i64),
        time: Some("2022-01-01T00:00:00Z".to_string()),
        num_txs: Some(num_txs as i64),
        total_txs: Some((height * 2) as i64),
        proposer_address: Some(format!("PROPOSER{height}")),
    }
}

pub fn synthetic_tx(height: u64, index: usize) -> Transaction {
    let msg = if index % 2 == 0 {
        json!({
            "type": "pos/Send",
            "value": {
                "from_address": format!("from{height}"),
                "to_address": format!("to{index}"),
                "amount": format!("{}", 1_000 + index),
            }
        })
    } else {
        json!({"type": "pos/Mint", "value": {"amount": "1"}})
    };
    tx_with_msg(height, index, Some(msg))
}

pub fn tx_with_msg(height: u64, index: usize, msg: Option<serde_json::Value>) -> Transaction {
    serde_json::from_value(json!({
        "hash": format!("{height:08}{index:04}"),
        "height": height.to_string(),
        "index": index,
        "tx_result": {
            "code": 0,
            "codespace": "",
            "signer": format!("signer{index}"),
            "recipient": format!("recipient{index}"),
            "message_type": "send",
        },
        "stdTx": {
            "entropy": "42",
            "fee": [{"amount": "10000", "denom": "upokt"}],
            "memo": "",
            "msg": msg,
            "signature": {"pub_key": "PUBKEY", "signature": "SIG"},
        }
    }))
    .expect("synthetic tx decodes")
}

/// Drains whatever is queued right now.
pub async fn collect_events(rx: &mut ProgressReceiver) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Recv::Item(ev) = rx.recv_timeout(Duration::from_millis(20)).await {
        events.push(ev);
    }
    events
}
