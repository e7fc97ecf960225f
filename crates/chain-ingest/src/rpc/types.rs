use serde::{Deserialize, Serialize};

use crate::rpc::lenient;
use crate::rpc::msgs::TxMsg;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub height: Option<i64>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub num_txs: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_txs: Option<i64>,
    #[serde(default)]
    pub proposer_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub header: Option<BlockHeader>,
}

/// `/v1/query/block` response. A null `block` (or header) means the node has
/// no body for the height yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlockResponse {
    #[serde(default)]
    pub block: Option<Block>,
}

impl BlockResponse {
    pub fn with_header(header: BlockHeader) -> Self {
        Self {
            block: Some(Block {
                header: Some(header),
            }),
        }
    }

    pub fn empty() -> Self {
        Self { block: None }
    }

    pub fn into_header(self) -> Option<BlockHeader> {
        self.block.and_then(|b| b.header)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeightResponse {
    #[serde(deserialize_with = "lenient::i64")]
    pub height: i64,
}

/// `/v1/query/blocktxs` response page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlockTxsResponse {
    #[serde(default, deserialize_with = "lenient::vec_or_null")]
    pub txs: Vec<Transaction>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_txs: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub page_total: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_count: Option<i64>,
}

impl BlockTxsResponse {
    pub fn page(txs: Vec<Transaction>) -> Self {
        Self {
            txs,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub height: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub index: Option<i64>,
    #[serde(default)]
    pub tx_result: Option<TxResult>,
    #[serde(default, rename = "stdTx")]
    pub std_tx: Option<StdTx>,
}

impl Transaction {
    pub fn msg(&self) -> Option<&TxMsg> {
        self.std_tx.as_ref().and_then(|s| s.msg.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TxResult {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub code: Option<i64>,
    #[serde(default)]
    pub codespace: Option<String>,
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub message_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StdTx {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub entropy: Option<i64>,
    #[serde(default, deserialize_with = "lenient::vec_or_null")]
    pub fee: Vec<Coin>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub msg: Option<TxMsg>,
    #[serde(default)]
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Coin {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub amount: Option<String>,
    #[serde(default)]
    pub denom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub pub_key: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_response_with_null_block_has_no_header() {
        let resp: BlockResponse = serde_json::from_str(r#"{"block": null}"#).expect("decode");
        assert_eq!(resp.into_header(), None);
    }

    #[test]
    fn header_decodes_amino_string_integers() {
        let resp: BlockResponse = serde_json::from_str(
            r#"{"block": {"header": {
                "chain_id": "mainnet", "height": "12345", "time": "2021-07-01T00:00:00Z",
                "num_txs": "3", "total_txs": "99", "proposer_address": "ABCD"
            }}}"#,
        )
        .expect("decode");
        let header = resp.into_header().expect("header");
        assert_eq!(header.height, Some(12345));
        assert_eq!(header.num_txs, Some(3));
        assert_eq!(header.chain_id.as_deref(), Some("mainnet"));
    }

    #[test]
    fn txs_page_tolerates_null_txs() {
        let page: BlockTxsResponse =
            serde_json::from_str(r#"{"txs": null, "total_count": 0}"#).expect("decode");
        assert!(page.txs.is_empty());
        assert_eq!(page.total_count, Some(0));
    }
}
