use serde::Deserialize;
use serde_json::Value;

use crate::domain::MessageKind;
use crate::rpc::lenient;

/// A transaction's decoded `stdTx.msg`.
///
/// Tags outside the known set, and known tags whose value does not decode,
/// are kept as `Unrecognized` so a bad message never fails the whole page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum TxMsg {
    Known(Msg),
    /// `tag` is empty when the message carried no `type`, and the JSON text
    /// of the field when it was not a string.
    Unrecognized { tag: String, value: Value },
}

impl From<Value> for TxMsg {
    fn from(raw: Value) -> Self {
        let (tag, value) = match raw {
            Value::Object(mut fields) => (
                fields.remove("type"),
                fields.remove("value").unwrap_or(Value::Null),
            ),
            other => (None, other),
        };
        let tag = match tag {
            Some(Value::String(tag)) => tag,
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };

        let Some(kind) = MessageKind::from_tag(&tag) else {
            return TxMsg::Unrecognized { tag, value };
        };
        match Msg::decode(kind, &value) {
            Ok(msg) => TxMsg::Known(msg),
            Err(e) => {
                tracing::debug!(tag = %tag, error = %e, "message value did not decode");
                TxMsg::Unrecognized { tag, value }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Send(SendValue),
    NodeStake(NodeStakeValue),
    NodeBeginUnstake(NodeBeginUnstakeValue),
    NodeUnjail(NodeUnjailValue),
    AppStake(AppStakeValue),
    AppBeginUnstake(AppBeginUnstakeValue),
    AppUnjail(AppUnjailValue),
    ChangeParam(ChangeParamValue),
    DaoTransfer(DaoTransferValue),
    Upgrade(UpgradeValue),
    Claim(ClaimValue),
    Proof(ProofValue),
}

impl Msg {
    pub fn decode(kind: MessageKind, value: &Value) -> serde_json::Result<Self> {
        Ok(match kind {
            MessageKind::Send => Msg::Send(SendValue::deserialize(value)?),
            MessageKind::NodeStake => Msg::NodeStake(NodeStakeValue::deserialize(value)?),
            MessageKind::NodeBeginUnstake => {
                Msg::NodeBeginUnstake(NodeBeginUnstakeValue::deserialize(value)?)
            }
            MessageKind::NodeUnjail => Msg::NodeUnjail(NodeUnjailValue::deserialize(value)?),
            MessageKind::AppStake => Msg::AppStake(AppStakeValue::deserialize(value)?),
            MessageKind::AppBeginUnstake => {
                Msg::AppBeginUnstake(AppBeginUnstakeValue::deserialize(value)?)
            }
            MessageKind::AppUnjail => Msg::AppUnjail(AppUnjailValue::deserialize(value)?),
            MessageKind::ChangeParam => Msg::ChangeParam(ChangeParamValue::deserialize(value)?),
            MessageKind::DaoTransfer => Msg::DaoTransfer(DaoTransferValue::deserialize(value)?),
            MessageKind::Upgrade => Msg::Upgrade(UpgradeValue::deserialize(value)?),
            MessageKind::Claim => Msg::Claim(ClaimValue::deserialize(value)?),
            MessageKind::Proof => Msg::Proof(ProofValue::deserialize(value)?),
        })
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Msg::Send(_) => MessageKind::Send,
            Msg::NodeStake(_) => MessageKind::NodeStake,
            Msg::NodeBeginUnstake(_) => MessageKind::NodeBeginUnstake,
            Msg::NodeUnjail(_) => MessageKind::NodeUnjail,
            Msg::AppStake(_) => MessageKind::AppStake,
            Msg::AppBeginUnstake(_) => MessageKind::AppBeginUnstake,
            Msg::AppUnjail(_) => MessageKind::AppUnjail,
            Msg::ChangeParam(_) => MessageKind::ChangeParam,
            Msg::DaoTransfer(_) => MessageKind::DaoTransfer,
            Msg::Upgrade(_) => MessageKind::Upgrade,
            Msg::Claim(_) => MessageKind::Claim,
            Msg::Proof(_) => MessageKind::Proof,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SendValue {
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PublicKey {
    #[serde(rename = "type")]
    pub key_type: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeStakeValue {
    pub public_key: Option<PublicKey>,
    pub chains: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub value: Option<i64>,
    pub service_url: Option<String>,
    pub output_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeBeginUnstakeValue {
    pub validator_address: Option<String>,
    pub signer_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeUnjailValue {
    pub address: Option<String>,
    pub signer_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppStakeValue {
    pub pubkey: Option<PublicKey>,
    pub chains: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppBeginUnstakeValue {
    pub application_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppUnjailValue {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChangeParamValue {
    pub address: Option<String>,
    pub param_key: Option<String>,
    pub param_value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DaoTransferValue {
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub amount: Option<i64>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Upgrade {
    #[serde(rename = "Height", deserialize_with = "lenient::opt_i64")]
    pub height: Option<i64>,
    #[serde(rename = "Version")]
    pub version: Option<String>,
    #[serde(rename = "OldUpgradeHeight", deserialize_with = "lenient::opt_i64")]
    pub old_upgrade_height: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpgradeValue {
    pub address: Option<String>,
    pub upgrade: Option<Upgrade>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionHeader {
    pub app_public_key: Option<String>,
    pub chain: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub session_height: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Range {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub lower: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub upper: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HashRange {
    #[serde(rename = "merkleHash")]
    pub merkle_hash: Option<String>,
    pub range: Option<Range>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClaimValue {
    pub header: Option<SessionHeader>,
    pub merkle_root: Option<HashRange>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub total_proofs: Option<i64>,
    pub from_address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub evidence_type: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub expiration_height: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProofValue {
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub evidence_type: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> TxMsg {
        serde_json::from_str(json).expect("decode msg")
    }

    #[test]
    fn send_decodes_with_string_amount() {
        let msg = decode(
            r#"{"type": "pos/Send", "value": {"from_address": "a", "to_address": "b", "amount": "1000"}}"#,
        );
        let TxMsg::Known(Msg::Send(v)) = msg else {
            panic!("expected send, got {msg:?}");
        };
        assert_eq!(v.amount, Some(1000));
        assert_eq!(v.to_address.as_deref(), Some("b"));
    }

    #[test]
    fn legacy_stake_tag_decodes_as_node_stake() {
        let msg = decode(
            r#"{"type": "pos/8.0MsgStake", "value": {"public_key": {"type": "crypto/ed25519_public_key", "value": "pk"}, "chains": ["0001"], "value": "15000000000", "service_url": "https://node:443"}}"#,
        );
        let TxMsg::Known(Msg::NodeStake(v)) = msg else {
            panic!("expected node stake, got {msg:?}");
        };
        assert_eq!(v.value, Some(15_000_000_000));
        assert_eq!(v.chains, Some(vec!["0001".to_string()]));
    }

    #[test]
    fn unknown_tag_is_kept_unrecognized() {
        let msg = decode(r#"{"type": "pos/Mint", "value": {"x": 1}}"#);
        assert!(matches!(msg, TxMsg::Unrecognized { ref tag, .. } if tag == "pos/Mint"));
    }

    #[test]
    fn malformed_known_value_is_kept_unrecognized() {
        let msg = decode(r#"{"type": "pos/Send", "value": {"amount": "lots"}}"#);
        assert!(matches!(msg, TxMsg::Unrecognized { ref tag, .. } if tag == "pos/Send"));
    }

    #[test]
    fn missing_or_non_string_tag_is_kept_unrecognized() {
        let msg = decode(r#"{"value": {"x": 1}}"#);
        assert!(matches!(msg, TxMsg::Unrecognized { ref tag, .. } if tag.is_empty()));

        let msg = decode(r#"{"type": 7, "value": {"x": 1}}"#);
        assert!(matches!(msg, TxMsg::Unrecognized { ref tag, .. } if tag == "7"));

        let msg = decode(r#""pos/Send""#);
        assert!(matches!(msg, TxMsg::Unrecognized { ref tag, .. } if tag.is_empty()));
    }

    #[test]
    fn untagged_message_does_not_fail_its_page() {
        let page: crate::rpc::types::BlockTxsResponse = serde_json::from_str(
            r#"{"txs": [
                {"hash": "A", "height": "5", "stdTx": {"msg": {"type": "pos/Send", "value": {"amount": "3"}}}},
                {"hash": "B", "height": "5", "stdTx": {"msg": {"value": {"x": 1}}}}
            ]}"#,
        )
        .expect("page decodes");
        assert_eq!(page.txs.len(), 2);
        assert!(matches!(page.txs[0].msg(), Some(TxMsg::Known(Msg::Send(_)))));
        assert!(matches!(page.txs[1].msg(), Some(TxMsg::Unrecognized { .. })));
    }
}
