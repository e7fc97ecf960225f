#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("out of retries getting block {height}{}", page.map(|p| format!(" transactions page {p}")).unwrap_or_default())]
    RetriesExceeded { height: u64, page: Option<u32> },
    #[error("block {height} unavailable: node kept returning an empty body")]
    BlockUnavailable { height: u64 },
    #[error("height mismatch: expected {expected}, got {got}")]
    HeightMismatch { expected: u64, got: i64 },
    #[error("schema error: {0}")]
    Schema(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("config invalid: {0}")]
    Config(String),
    #[error("ingestion cancelled")]
    Cancelled,
    #[error("internal invariant: {0}")]
    Internal(String),
}

impl Error {
    /// Transport-level failures the fetcher is allowed to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Rpc(_))
    }
}

pub type Result<T> = core::result::Result<T, Error>;
