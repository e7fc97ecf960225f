use serde_json::Value;

use crate::domain::kind::{UNKNOWN_MODULE, UNKNOWN_TYPE};
use crate::flatten::records::{
    AppBeginUnstakeRecord, AppStakeRecord, AppUnjailRecord, ChangeParamRecord, ClaimRecord,
    DaoTransferRecord, HeaderRecord, MessageRecord, NodeBeginUnstakeRecord, NodeStakeRecord,
    NodeUnjailRecord, ProofRecord, SendRecord, TxRecord, UpgradeRecord,
};
use crate::rpc::{BlockHeader, Msg, Transaction, TxMsg};

/// Result of projecting a transaction's message.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    pub record: Option<MessageRecord>,
    pub module: &'static str,
    pub type_name: &'static str,
}

impl Flattened {
    fn unknown() -> Self {
        Self {
            record: None,
            module: UNKNOWN_MODULE,
            type_name: UNKNOWN_TYPE,
        }
    }
}

pub fn flatten_header(header: &BlockHeader) -> HeaderRecord {
    HeaderRecord {
        chain_id: header.chain_id.clone(),
        height: header.height,
        time: header.time.clone(),
        num_txs: header.num_txs,
        total_txs: header.total_txs,
        proposer_address: header.proposer_address.clone(),
    }
}

pub fn flatten_tx(tx: &Transaction) -> TxRecord {
    let result = tx.tx_result.as_ref();
    let std_tx = tx.std_tx.as_ref();
    let fee = std_tx.and_then(|s| s.fee.first());
    TxRecord {
        height: tx.height,
        hash: tx.hash.clone(),
        index: tx.index,
        result_code: result.and_then(|r| r.code),
        codespace: result.and_then(|r| r.codespace.clone()),
        signer: result.and_then(|r| r.signer.clone()),
        recipient: result.and_then(|r| r.recipient.clone()),
        msg_type: result.and_then(|r| r.message_type.clone()),
        entropy: std_tx.and_then(|s| s.entropy),
        fee_amount: fee.and_then(|c| c.amount.clone()),
        fee_denom: fee.and_then(|c| c.denom.clone()),
        signer_pubkey: std_tx
            .and_then(|s| s.signature.as_ref())
            .and_then(|sig| sig.pub_key.clone()),
        empty_msg: tx.msg().is_none(),
    }
}

/// Projects the transaction's message into the record of its kind.
///
/// Missing and unrecognized messages both classify as `Unknown/Unknown`
/// with no record; the latter is logged with its raw tag.
pub fn flatten_tx_message(tx: &Transaction) -> Flattened {
    let msg = match tx.msg() {
        None => return Flattened::unknown(),
        Some(TxMsg::Unrecognized { tag, .. }) => {
            tracing::warn!(
                tag = %tag,
                height = ?tx.height,
                hash = ?tx.hash,
                "unrecognized message tag; not projected"
            );
            return Flattened::unknown();
        }
        Some(TxMsg::Known(msg)) => msg,
    };

    let kind = msg.kind();
    Flattened {
        record: Some(project(tx, msg)),
        module: kind.module(),
        type_name: kind.type_name(),
    }
}

fn project(tx: &Transaction, msg: &Msg) -> MessageRecord {
    let height = tx.height;
    let hash = tx.hash.clone();
    let index = tx.index;
    match msg {
        Msg::Send(v) => MessageRecord::Send(SendRecord {
            height,
            hash,
            index,
            from_address: v.from_address.clone(),
            to_address: v.to_address.clone(),
            amount: v.amount,
        }),
        Msg::NodeStake(v) => {
            let pk = v.public_key.as_ref();
            MessageRecord::NodeStake(NodeStakeRecord {
                height,
                hash,
                index,
                public_key: pk.and_then(|k| k.value.clone()),
                public_key_type: pk.and_then(|k| k.key_type.clone()),
                chains: v.chains.clone(),
                value: v.value,
                service_url: v.service_url.clone(),
                output_address: v.output_address.clone(),
            })
        }
        Msg::NodeBeginUnstake(v) => MessageRecord::NodeBeginUnstake(NodeBeginUnstakeRecord {
            height,
            hash,
            index,
            validator_address: v.validator_address.clone(),
            signer_address: v.signer_address.clone(),
        }),
        Msg::NodeUnjail(v) => MessageRecord::NodeUnjail(NodeUnjailRecord {
            height,
            hash,
            index,
            address: v.address.clone(),
            signer_address: v.signer_address.clone(),
        }),
        Msg::AppStake(v) => {
            let pk = v.pubkey.as_ref();
            MessageRecord::AppStake(AppStakeRecord {
                height,
                hash,
                index,
                pubkey: pk.and_then(|k| k.value.clone()),
                pubkey_type: pk.and_then(|k| k.key_type.clone()),
                chains: v.chains.clone(),
                value: v.value,
            })
        }
        Msg::AppBeginUnstake(v) => MessageRecord::AppBeginUnstake(AppBeginUnstakeRecord {
            height,
            hash,
            index,
            application_address: v.application_address.clone(),
        }),
        Msg::AppUnjail(v) => MessageRecord::AppUnjail(AppUnjailRecord {
            height,
            hash,
            index,
            address: v.address.clone(),
        }),
        Msg::ChangeParam(v) => MessageRecord::ChangeParam(ChangeParamRecord {
            height,
            hash,
            index,
            address: v.address.clone(),
            param_key: v.param_key.clone(),
            param_value: v.param_value.as_ref().map(param_value_string),
        }),
        Msg::DaoTransfer(v) => MessageRecord::DaoTransfer(DaoTransferRecord {
            height,
            hash,
            index,
            from_address: v.from_address.clone(),
            to_address: v.to_address.clone(),
            amount: v.amount,
            action: v.action.clone(),
        }),
        Msg::Upgrade(v) => {
            let upgrade = v.upgrade.as_ref();
            MessageRecord::Upgrade(UpgradeRecord {
                height,
                hash,
                index,
                address: v.address.clone(),
                upgrade_height: upgrade.and_then(|u| u.height),
                version: upgrade.and_then(|u| u.version.clone()),
                old_upgrade_height: upgrade.and_then(|u| u.old_upgrade_height),
            })
        }
        Msg::Claim(v) => {
            let session = v.header.as_ref();
            let root = v.merkle_root.as_ref();
            let range = root.and_then(|r| r.range.as_ref());
            MessageRecord::Claim(ClaimRecord {
                height,
                hash,
                index,
                from_address: v.from_address.clone(),
                total_proofs: v.total_proofs,
                expiration_height: v.expiration_height,
                evidence_type: v.evidence_type,
                app_pub_key: session.and_then(|s| s.app_public_key.clone()),
                chain: session.and_then(|s| s.chain.clone()),
                session_height: session.and_then(|s| s.session_height),
                merkle_hash: root.and_then(|r| r.merkle_hash.clone()),
                merkle_root_lower: range.and_then(|r| r.lower.clone()),
                merkle_root_upper: range.and_then(|r| r.upper.clone()),
            })
        }
        Msg::Proof(v) => MessageRecord::Proof(ProofRecord {
            height,
            hash,
            index,
            evidence_type: v.evidence_type,
        }),
    }
}

fn param_value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
