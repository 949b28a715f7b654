//! [`NodeClient`] over the node's HTTP API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{NodeClient, NodeError, RelayOutcome};
use crate::config::{WalletConfig, PATH_DIRECTORY_BLOCK_HEAD, PATH_GET_RAW_DATA};
use crate::crypto::Hash;

#[derive(Debug, Deserialize)]
struct HeadResponse {
    #[serde(rename = "KeyMR")]
    key_mr: String,
}

#[derive(Debug, Deserialize)]
struct RawDataResponse {
    #[serde(rename = "Data")]
    data: String,
}

/// HTTP client for one node.
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    client: reqwest::Client,
    config: WalletConfig,
}

impl HttpNodeClient {
    pub fn new(config: &WalletConfig) -> Result<Self, NodeError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| NodeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let url = self.config.endpoint(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_reqwest(e, path))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NodeError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| NodeError::Decode(e.to_string()))
    }
}

fn map_reqwest(err: reqwest::Error, path: &str) -> NodeError {
    if err.is_timeout() {
        NodeError::Timeout(path.to_string())
    } else {
        NodeError::Transport(err.to_string())
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn directory_block_head(&self) -> Result<Hash, NodeError> {
        let head: HeadResponse = self.get_json(PATH_DIRECTORY_BLOCK_HEAD).await?;
        head.key_mr
            .parse()
            .map_err(|_| NodeError::Decode(format!("bad KeyMR '{}'", head.key_mr)))
    }

    async fn get_raw(&self, hash: &Hash) -> Result<Vec<u8>, NodeError> {
        let path = format!("{PATH_GET_RAW_DATA}{hash}");
        let raw: RawDataResponse = self.get_json(&path).await?;
        hex::decode(&raw.data).map_err(|e| NodeError::Decode(e.to_string()))
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<RelayOutcome, NodeError> {
        let url = self.config.endpoint(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_reqwest(e, path))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest(e, path))?;
        if !(200..300).contains(&status) {
            warn!(path, status, "node refused relay");
        }
        Ok(RelayOutcome { status, body })
    }
}
