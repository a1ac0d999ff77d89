//! HTTP client for a pruntime worker's prpc endpoint.
//!
//! `GetInfo` uses prpc's JSON mode; `ContractQuery` carries protobuf.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use prost::Message;
use serde::Deserialize;

use crate::worker::api::{WorkerApi, WorkerError, WorkerInfo, WorkerResult};
use crate::worker::prpc::{ContractQueryRequest, ContractQueryResponse, PrpcError};

/// Client for `PhactoryAPI`.
#[derive(Debug, Clone)]
pub struct PruntimeClient {
    client: Client,
    base_url: String,
}

/// Subset of `PhactoryInfo` this tool reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhactoryInfo {
    public_key: Option<String>,
    blocknum: u64,
    headernum: u64,
}

impl PruntimeClient {
    pub fn new(base_url: &str, timeout: Duration) -> WorkerResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/prpc/PhactoryAPI.{}", self.base_url, method)
    }

    /// Send a signed, encrypted contract query.
    pub async fn contract_query(
        &self,
        request: &ContractQueryRequest,
    ) -> WorkerResult<ContractQueryResponse> {
        let res = self
            .client
            .post(self.endpoint("ContractQuery"))
            .body(request.encode_to_vec())
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;
        if !status.is_success() {
            let message = PrpcError::decode(body.as_ref())
                .map(|e| e.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(WorkerError::Rpc(format!(
                "ContractQuery returned {}: {}",
                status, message
            )));
        }
        ContractQueryResponse::decode(body.as_ref()).map_err(|e| WorkerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl WorkerApi for PruntimeClient {
    async fn get_info(&self) -> WorkerResult<WorkerInfo> {
        let res = self
            .client
            .post(format!("{}?json", self.endpoint("GetInfo")))
            .body("{}")
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(WorkerError::Rpc(format!("GetInfo returned {}: {}", status, text)));
        }
        parse_info(&text)
    }
}

fn parse_info(text: &str) -> WorkerResult<WorkerInfo> {
    let info: PhactoryInfo =
        serde_json::from_str(text).map_err(|e| WorkerError::Decode(e.to_string()))?;
    Ok(WorkerInfo {
        public_key: info
            .public_key
            .map(|k| k.trim_start_matches("0x").to_string())
            .unwrap_or_default(),
        blocknum: info.blocknum,
        headernum: info.headernum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_format() {
        let client = PruntimeClient::new("http://localhost:18000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("ContractQuery"),
            "http://localhost:18000/prpc/PhactoryAPI.ContractQuery"
        );
    }

    #[test]
    fn test_parse_info() {
        let info = parse_info(
            r#"{"initialized":true,"registered":true,"public_key":"0xdeadbeef","blocknum":42,"headernum":43,"state_root":"00"}"#,
        )
        .unwrap();
        assert_eq!(info.public_key, "deadbeef");
        assert_eq!(info.blocknum, 42);
        assert_eq!(info.headernum, 43);

        assert!(parse_info("not json").is_err());
        // missing fields default
        assert_eq!(parse_info("{}").unwrap(), WorkerInfo::default());
    }

    #[tokio::test]
    async fn test_unreachable_worker() {
        let client = PruntimeClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        assert!(matches!(client.get_info().await, Err(WorkerError::Http(_))));
        let request = ContractQueryRequest::default();
        assert!(matches!(
            client.contract_query(&request).await,
            Err(WorkerError::Http(_))
        ));
    }
}
