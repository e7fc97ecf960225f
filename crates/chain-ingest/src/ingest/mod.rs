pub mod batch;
pub mod block;
pub mod writer;

pub use batch::{Batch, FlushSummary};
pub use block::{BlockIngester, IngestedBlock};
pub use writer::{BatchWriter, RangeSummary};
