pub mod project;
pub mod records;
pub mod schema;

use std::collections::BTreeMap;

use crate::domain::MessageKind;

pub use project::{Flattened, flatten_header, flatten_tx, flatten_tx_message};
pub use records::{FlatRecord, HeaderRecord, MessageRecord, TxRecord, records_to_batch};
pub use schema::{header_schema, messages_to_record_batch, schema_for, tx_schema};

/// Message records grouped by kind, in kind order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageGroups {
    groups: BTreeMap<MessageKind, Vec<MessageRecord>>,
}

impl MessageGroups {
    pub fn push(&mut self, record: MessageRecord) {
        self.groups.entry(record.kind()).or_default().push(record);
    }

    pub fn append(&mut self, other: MessageGroups) {
        for (kind, mut records) in other.groups {
            self.groups.entry(kind).or_default().append(&mut records);
        }
    }

    pub fn get(&self, kind: MessageKind) -> &[MessageRecord] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MessageKind, &[MessageRecord])> {
        self.groups.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Row count per kind present.
    pub fn counts(&self) -> BTreeMap<MessageKind, usize> {
        self.groups.iter().map(|(k, v)| (*k, v.len())).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<MessageRecord> for MessageGroups {
    fn from_iter<I: IntoIterator<Item = MessageRecord>>(iter: I) -> Self {
        let mut groups = Self::default();
        for record in iter {
            groups.push(record);
        }
        groups
    }
}
