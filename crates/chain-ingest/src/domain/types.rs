use std::fmt;
use std::path::PathBuf;

use crate::domain::kind::MessageKind;

/// Inclusive block range covered by a chunk or an output segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentRange {
    pub start: u64,
    pub end: u64,
}

impl SegmentRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of blocks covered; a range always holds at least one block.
    pub fn block_count(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn file_name(&self) -> String {
        format!("block_{}-{}.parquet", self.start, self.end)
    }
}

impl fmt::Display for SegmentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Logical output table; each maps to a directory under the index root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TablePath {
    Headers,
    Txs,
    Messages(MessageKind),
}

impl TablePath {
    pub fn relative_dir(&self) -> PathBuf {
        match self {
            Self::Headers => PathBuf::from("headers"),
            Self::Txs => PathBuf::from("txs"),
            Self::Messages(kind) => PathBuf::from("tx_msgs")
                .join(kind.module())
                .join(kind.type_name()),
        }
    }

    /// Every table the indexer can write.
    pub fn all() -> impl Iterator<Item = TablePath> {
        [TablePath::Headers, TablePath::Txs]
            .into_iter()
            .chain(MessageKind::ALL.into_iter().map(TablePath::Messages))
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Headers => f.write_str("headers"),
            Self::Txs => f.write_str("txs"),
            Self::Messages(kind) => write!(f, "tx_msgs/{kind}"),
        }
    }
}
