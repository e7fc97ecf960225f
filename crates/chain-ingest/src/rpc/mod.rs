pub mod http;
pub mod lenient;
pub mod msgs;
pub mod traits;
pub mod types;

pub use http::HttpRpcClient;
pub use msgs::{Msg, TxMsg};
pub use traits::RpcClient;
pub use types::{BlockHeader, BlockResponse, BlockTxsResponse, Transaction};
