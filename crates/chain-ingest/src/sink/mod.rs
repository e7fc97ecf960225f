mod layout;
mod memory;
mod parquet_file;

pub use layout::{IndexLayout, parse_segment_name, segment_upper_bound};
pub use memory::{InMemorySink, WrittenSegment};
pub use parquet_file::{ParquetSink, read_segment};

use arrow::record_batch::RecordBatch;

use crate::domain::{SegmentRange, TablePath};
use crate::error::Result;

/// Destination for flushed batches. One call writes one segment file for
/// `table` covering `range`.
///
/// Implementations are synchronous; callers run them on the blocking pool.
pub trait SegmentSink: Send + Sync {
    fn append_segment(&self, table: &TablePath, batch: RecordBatch, range: SegmentRange)
    -> Result<()>;
}
