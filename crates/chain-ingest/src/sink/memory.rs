use std::sync::Mutex;

use arrow::record_batch::RecordBatch;

use crate::domain::{SegmentRange, TablePath};
use crate::error::{Error, Result};
use crate::sink::SegmentSink;

#[derive(Debug, Clone)]
pub struct WrittenSegment {
    pub table: TablePath,
    pub range: SegmentRange,
    pub batch: RecordBatch,
}

/// Keeps every appended segment in memory, in append order.
#[derive(Debug, Default)]
pub struct InMemorySink {
    segments: Mutex<Vec<WrittenSegment>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> Result<Vec<WrittenSegment>> {
        let guard = self
            .segments
            .lock()
            .map_err(|_| Error::Internal("poisoned lock".to_string()))?;
        Ok(guard.clone())
    }

    /// Segments written for one table, in append order.
    pub fn table(&self, table: TablePath) -> Result<Vec<WrittenSegment>> {
        Ok(self
            .segments()?
            .into_iter()
            .filter(|s| s.table == table)
            .collect())
    }

    pub fn rows(&self, table: TablePath) -> Result<usize> {
        Ok(self
            .table(table)?
            .iter()
            .map(|s| s.batch.num_rows())
            .sum())
    }
}

impl SegmentSink for InMemorySink {
    fn append_segment(
        &self,
        table: &TablePath,
        batch: RecordBatch,
        range: SegmentRange,
    ) -> Result<()> {
        let mut guard = self
            .segments
            .lock()
            .map_err(|_| Error::Internal("poisoned lock".to_string()))?;
        guard.push(WrittenSegment {
            table: *table,
            range,
            batch,
        });
        Ok(())
    }
}
