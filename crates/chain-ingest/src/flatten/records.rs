use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Int64Array, ListBuilder, StringArray, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::domain::MessageKind;
use crate::error::{Error, Result};

/// A Rust field type that maps onto one Arrow column.
pub trait Column {
    fn data_type() -> DataType;

    fn nullable() -> bool {
        true
    }

    fn to_array<'a>(values: impl Iterator<Item = &'a Self>) -> ArrayRef
    where
        Self: 'a;
}

impl Column for Option<String> {
    fn data_type() -> DataType {
        DataType::Utf8
    }

    fn to_array<'a>(values: impl Iterator<Item = &'a Self>) -> ArrayRef {
        Arc::new(values.map(|v| v.as_deref()).collect::<StringArray>())
    }
}

impl Column for Option<i64> {
    fn data_type() -> DataType {
        DataType::Int64
    }

    fn to_array<'a>(values: impl Iterator<Item = &'a Self>) -> ArrayRef {
        Arc::new(values.copied().collect::<Int64Array>())
    }
}

impl Column for bool {
    fn data_type() -> DataType {
        DataType::Boolean
    }

    fn nullable() -> bool {
        false
    }

    fn to_array<'a>(values: impl Iterator<Item = &'a Self>) -> ArrayRef {
        Arc::new(BooleanArray::from(values.copied().collect::<Vec<bool>>()))
    }
}

impl Column for Option<Vec<String>> {
    fn data_type() -> DataType {
        DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
    }

    fn to_array<'a>(values: impl Iterator<Item = &'a Self>) -> ArrayRef {
        let mut builder = ListBuilder::new(StringBuilder::new());
        for value in values {
            match value {
                Some(items) => {
                    for item in items {
                        builder.values().append_value(item);
                    }
                    builder.append(true);
                }
                None => builder.append(false),
            }
        }
        Arc::new(builder.finish())
    }
}

/// A flat row type with a fixed Arrow schema.
pub trait FlatRecord: Sized {
    fn schema() -> SchemaRef;

    fn to_columns(rows: &[&Self]) -> Vec<ArrayRef>;

    fn to_record_batch(rows: &[&Self]) -> Result<RecordBatch> {
        RecordBatch::try_new(Self::schema(), Self::to_columns(rows))
            .map_err(|e| Error::Schema(format!("assemble columns: {e}")))
    }
}

/// Builds a `RecordBatch` from owned rows.
pub fn records_to_batch<T: FlatRecord>(rows: &[T]) -> Result<RecordBatch> {
    let refs: Vec<&T> = rows.iter().collect();
    T::to_record_batch(&refs)
}

// Declares a record struct together with its schema and column assembly, so
// field order and column order cannot drift apart.
macro_rules! flat_record {
    ($(#[$meta:meta])* $name:ident { $($field:ident : $ty:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl FlatRecord for $name {
            fn schema() -> SchemaRef {
                Arc::new(Schema::new(vec![
                    $(Field::new(
                        stringify!($field),
                        <$ty as Column>::data_type(),
                        <$ty as Column>::nullable(),
                    ),)+
                ]))
            }

            fn to_columns(rows: &[&Self]) -> Vec<ArrayRef> {
                vec![
                    $(<$ty as Column>::to_array(rows.iter().map(|r| &r.$field)),)+
                ]
            }
        }
    };
}

flat_record!(
    /// One row per block in `headers/`.
    HeaderRecord {
        chain_id: Option<String>,
        height: Option<i64>,
        time: Option<String>,
        num_txs: Option<i64>,
        total_txs: Option<i64>,
        proposer_address: Option<String>,
    }
);

flat_record!(
    /// One row per transaction in `txs/`.
    TxRecord {
        height: Option<i64>,
        hash: Option<String>,
        index: Option<i64>,
        result_code: Option<i64>,
        codespace: Option<String>,
        signer: Option<String>,
        recipient: Option<String>,
        msg_type: Option<String>,
        entropy: Option<i64>,
        fee_amount: Option<String>,
        fee_denom: Option<String>,
        signer_pubkey: Option<String>,
        empty_msg: bool,
    }
);

flat_record!(SendRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    from_address: Option<String>,
    to_address: Option<String>,
    amount: Option<i64>,
});

flat_record!(NodeStakeRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    public_key: Option<String>,
    public_key_type: Option<String>,
    chains: Option<Vec<String>>,
    value: Option<i64>,
    service_url: Option<String>,
    output_address: Option<String>,
});

flat_record!(NodeBeginUnstakeRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    validator_address: Option<String>,
    signer_address: Option<String>,
});

flat_record!(NodeUnjailRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    address: Option<String>,
    signer_address: Option<String>,
});

flat_record!(AppStakeRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    pubkey: Option<String>,
    pubkey_type: Option<String>,
    chains: Option<Vec<String>>,
    value: Option<i64>,
});

flat_record!(AppBeginUnstakeRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    application_address: Option<String>,
});

flat_record!(AppUnjailRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    address: Option<String>,
});

flat_record!(
    /// `param_value` holds the parameter in string form: the raw text when
    /// the node sent a JSON string, compact JSON otherwise.
    ChangeParamRecord {
        height: Option<i64>,
        hash: Option<String>,
        index: Option<i64>,
        address: Option<String>,
        param_key: Option<String>,
        param_value: Option<String>,
    }
);

flat_record!(DaoTransferRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    from_address: Option<String>,
    to_address: Option<String>,
    amount: Option<i64>,
    action: Option<String>,
});

flat_record!(UpgradeRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    address: Option<String>,
    upgrade_height: Option<i64>,
    version: Option<String>,
    old_upgrade_height: Option<i64>,
});

flat_record!(ClaimRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    from_address: Option<String>,
    total_proofs: Option<i64>,
    expiration_height: Option<i64>,
    evidence_type: Option<i64>,
    app_pub_key: Option<String>,
    chain: Option<String>,
    session_height: Option<i64>,
    merkle_hash: Option<String>,
    merkle_root_lower: Option<String>,
    merkle_root_upper: Option<String>,
});

flat_record!(ProofRecord {
    height: Option<i64>,
    hash: Option<String>,
    index: Option<i64>,
    evidence_type: Option<i64>,
});

/// A flattened message of any known kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageRecord {
    Send(SendRecord),
    NodeStake(NodeStakeRecord),
    NodeBeginUnstake(NodeBeginUnstakeRecord),
    NodeUnjail(NodeUnjailRecord),
    AppStake(AppStakeRecord),
    AppBeginUnstake(AppBeginUnstakeRecord),
    AppUnjail(AppUnjailRecord),
    ChangeParam(ChangeParamRecord),
    DaoTransfer(DaoTransferRecord),
    Upgrade(UpgradeRecord),
    Claim(ClaimRecord),
    Proof(ProofRecord),
}

impl MessageRecord {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Send(_) => MessageKind::Send,
            Self::NodeStake(_) => MessageKind::NodeStake,
            Self::NodeBeginUnstake(_) => MessageKind::NodeBeginUnstake,
            Self::NodeUnjail(_) => MessageKind::NodeUnjail,
            Self::AppStake(_) => MessageKind::AppStake,
            Self::AppBeginUnstake(_) => MessageKind::AppBeginUnstake,
            Self::AppUnjail(_) => MessageKind::AppUnjail,
            Self::ChangeParam(_) => MessageKind::ChangeParam,
            Self::DaoTransfer(_) => MessageKind::DaoTransfer,
            Self::Upgrade(_) => MessageKind::Upgrade,
            Self::Claim(_) => MessageKind::Claim,
            Self::Proof(_) => MessageKind::Proof,
        }
    }
}
