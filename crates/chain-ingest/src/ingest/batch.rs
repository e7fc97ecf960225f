use std::collections::BTreeMap;

use crate::domain::{MessageKind, SegmentRange, TablePath};
use crate::error::Result;
use crate::flatten::{
    HeaderRecord, MessageGroups, TxRecord, messages_to_record_batch, records_to_batch,
};
use crate::ingest::block::IngestedBlock;
use crate::sink::SegmentSink;

/// What one flush wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushSummary {
    pub range: SegmentRange,
    pub headers: usize,
    pub txs: usize,
    pub messages: BTreeMap<MessageKind, usize>,
    pub unrecognized: usize,
}

/// Records accumulated since the last flush.
#[derive(Debug, Default)]
pub struct Batch {
    headers: Vec<HeaderRecord>,
    txs: Vec<TxRecord>,
    messages: MessageGroups,
    unrecognized: usize,
}

impl Batch {
    pub fn push(&mut self, block: IngestedBlock) {
        self.headers.push(block.header);
        self.txs.extend(block.txs);
        self.messages.append(block.messages);
        self.unrecognized += block.unrecognized;
    }

    pub fn block_count(&self) -> usize {
        self.headers.len()
    }

    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Writes the batch as one segment per table.
    ///
    /// Headers and transactions are always written, even with zero
    /// transaction rows, so both tables end at the same block. Message
    /// tables are written only for kinds present. Every column set is
    /// assembled before the first write.
    pub fn write_to<S: SegmentSink + ?Sized>(
        self,
        sink: &S,
        range: SegmentRange,
    ) -> Result<FlushSummary> {
        let mut segments = Vec::with_capacity(2 + self.messages.counts().len());
        segments.push((TablePath::Headers, records_to_batch(&self.headers)?));
        segments.push((TablePath::Txs, records_to_batch(&self.txs)?));
        for (kind, rows) in self.messages.iter() {
            segments.push((TablePath::Messages(kind), messages_to_record_batch(kind, rows)?));
        }

        for (table, batch) in segments {
            sink.append_segment(&table, batch, range)?;
        }

        Ok(FlushSummary {
            range,
            headers: self.headers.len(),
            txs: self.txs.len(),
            messages: self.messages.counts(),
            unrecognized: self.unrecognized,
        })
    }
}
