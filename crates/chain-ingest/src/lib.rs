pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod ingest;
pub mod progress;
pub mod rpc;
pub mod sink;

pub use config::{Concurrency, IngestConfig};
pub use coordinator::{ChunkFailure, RangeCoordinator, RunSummary, chunk_bounds};
pub use domain::{MessageKind, SegmentRange, TablePath};
pub use error::{Error, Result};
pub use fetch::{RetryingFetcher, TxPage};
pub use ingest::{BatchWriter, BlockIngester, FlushSummary, IngestedBlock, RangeSummary};
pub use progress::{
    Drain, ErrorEvent, ProgressEvent, ProgressReporter, ProgressTotals, progress_channel,
};
pub use rpc::{HttpRpcClient, RpcClient};
pub use sink::{InMemorySink, IndexLayout, ParquetSink, SegmentSink};
