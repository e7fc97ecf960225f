use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::rpc::traits::RpcClient;
use crate::rpc::types::{BlockResponse, BlockTxsResponse, HeightResponse};

#[derive(Serialize)]
struct HeightQuery {
    height: u64,
}

#[derive(Serialize)]
struct BlockTxsQuery {
    height: u64,
    page: u32,
    per_page: u32,
    prove: bool,
    order: &'static str,
}

/// JSON-over-HTTP client for a node's `/v1/query/*` routes.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRpcClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(Error::Config("rpc url must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn route(&self, route: &str) -> String {
        format!("{}/v1{}", self.base_url, route)
    }

    async fn post<B, T>(&self, route: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.route(route);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("POST {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Rpc(format!("POST {url}: status {status}: {text}")));
        }
        resp.json::<T>()
            .await
            .map_err(|e| Error::Rpc(format!("decode {route} response: {e}")))
    }
}

#[async_trait::async_trait]
impl RpcClient for HttpRpcClient {
    async fn get_height(&self) -> Result<u64> {
        let resp: HeightResponse = self.post("/query/height", &serde_json::json!({})).await?;
        u64::try_from(resp.height)
            .map_err(|_| Error::Decode(format!("negative chain height {}", resp.height)))
    }

    async fn get_block(&self, height: u64) -> Result<BlockResponse> {
        self.post("/query/block", &HeightQuery { height }).await
    }

    async fn get_block_transactions(
        &self,
        height: u64,
        page: u32,
        per_page: u32,
    ) -> Result<BlockTxsResponse> {
        let query = BlockTxsQuery {
            height,
            page,
            per_page,
            prove: false,
            order: "asc",
        };
        self.post("/query/blocktxs", &query).await
    }
}
