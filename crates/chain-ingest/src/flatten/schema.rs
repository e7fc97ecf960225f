use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::domain::MessageKind;
use crate::error::{Error, Result};
use crate::flatten::records::{
    AppBeginUnstakeRecord, AppStakeRecord, AppUnjailRecord, ChangeParamRecord, ClaimRecord,
    DaoTransferRecord, FlatRecord, HeaderRecord, MessageRecord, NodeBeginUnstakeRecord,
    NodeStakeRecord, NodeUnjailRecord, ProofRecord, SendRecord, TxRecord, UpgradeRecord,
};

pub fn header_schema() -> SchemaRef {
    HeaderRecord::schema()
}

pub fn tx_schema() -> SchemaRef {
    TxRecord::schema()
}

pub fn schema_for(kind: MessageKind) -> SchemaRef {
    match kind {
        MessageKind::Send => SendRecord::schema(),
        MessageKind::NodeStake => NodeStakeRecord::schema(),
        MessageKind::NodeBeginUnstake => NodeBeginUnstakeRecord::schema(),
        MessageKind::NodeUnjail => NodeUnjailRecord::schema(),
        MessageKind::AppStake => AppStakeRecord::schema(),
        MessageKind::AppBeginUnstake => AppBeginUnstakeRecord::schema(),
        MessageKind::AppUnjail => AppUnjailRecord::schema(),
        MessageKind::ChangeParam => ChangeParamRecord::schema(),
        MessageKind::DaoTransfer => DaoTransferRecord::schema(),
        MessageKind::Upgrade => UpgradeRecord::schema(),
        MessageKind::Claim => ClaimRecord::schema(),
        MessageKind::Proof => ProofRecord::schema(),
    }
}

/// Assembles one message group into a batch with `schema_for(kind)`.
/// A record of any other kind in the group is a schema error.
pub fn messages_to_record_batch(kind: MessageKind, rows: &[MessageRecord]) -> Result<RecordBatch> {
    macro_rules! assemble {
        ($variant:ident, $record:ty) => {{
            let typed = rows
                .iter()
                .map(|row| match row {
                    MessageRecord::$variant(r) => Ok(r),
                    other => Err(mismatch(kind, other)),
                })
                .collect::<Result<Vec<&$record>>>()?;
            <$record>::to_record_batch(&typed)
        }};
    }

    match kind {
        MessageKind::Send => assemble!(Send, SendRecord),
        MessageKind::NodeStake => assemble!(NodeStake, NodeStakeRecord),
        MessageKind::NodeBeginUnstake => assemble!(NodeBeginUnstake, NodeBeginUnstakeRecord),
        MessageKind::NodeUnjail => assemble!(NodeUnjail, NodeUnjailRecord),
        MessageKind::AppStake => assemble!(AppStake, AppStakeRecord),
        MessageKind::AppBeginUnstake => assemble!(AppBeginUnstake, AppBeginUnstakeRecord),
        MessageKind::AppUnjail => assemble!(AppUnjail, AppUnjailRecord),
        MessageKind::ChangeParam => assemble!(ChangeParam, ChangeParamRecord),
        MessageKind::DaoTransfer => assemble!(DaoTransfer, DaoTransferRecord),
        MessageKind::Upgrade => assemble!(Upgrade, UpgradeRecord),
        MessageKind::Claim => assemble!(Claim, ClaimRecord),
        MessageKind::Proof => assemble!(Proof, ProofRecord),
    }
}

fn mismatch(kind: MessageKind, row: &MessageRecord) -> Error {
    Error::Schema(format!(
        "{} record in {} message group",
        row.kind(),
        kind
    ))
}
