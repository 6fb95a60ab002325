//! JSON-RPC 2.0 client used for both the chain node and the wallet endpoint.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on one HTTP round trip; a hung endpoint surfaces as an error.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// JSON-RPC error types.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Error object returned by the remote side.
    #[error("RPC error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl RpcError {
    /// Error code returned by the remote side, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Revert payload attached to an execution error (`data` as a hex string,
    /// or nested under `data.data` by some nodes).
    pub fn revert_data(&self) -> Option<Vec<u8>> {
        let RpcError::Remote { data: Some(data), .. } = self else {
            return None;
        };
        let hex = data
            .as_str()
            .or_else(|| data.get("data").and_then(|d| d.as_str()))?;
        crate::eth::decode_hex(hex).ok()
    }
}

#[derive(Serialize)]
struct Request<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

/// JSON-RPC client bound to one endpoint.
#[derive(Clone)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    headers: Vec<(String, String)>,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not build http client with timeout");
                reqwest::Client::new()
            });
        Self {
            url: url.into(),
            http,
            headers: Vec::new(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Attach a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Issue a call and deserialize its `result`. A `null` result
    /// deserializes into `T` as JSON `null` (use `Option<T>` for nullable calls).
    pub async fn call<T: DeserializeOwned, P: Serialize>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = Request {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let mut req = self.http.post(&self.url).json(&body);
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        tracing::debug!(method, id, url = %self.url, "rpc call");
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error = resp.text().await.unwrap_or_default();
            return Err(RpcError::Response(format!("HTTP {}: {}", status, error)));
        }

        let resp: Response = resp.json().await?;
        if let Some(err) = resp.error {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        let result = resp.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result)
            .map_err(|e| RpcError::Response(format!("{}: {}", method, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope() {
        let req = Request {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_chainId",
            params: serde_json::json!([]),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "eth_chainId", "params": []})
        );
    }

    #[test]
    fn test_error_response_parses() {
        let resp: Response = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted","data":"0x646cf558"}}"#,
        )
        .unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, 3);
        assert_eq!(err.data, Some(serde_json::json!("0x646cf558")));
    }

    #[test]
    fn test_revert_data_extraction() {
        let flat = RpcError::Remote {
            code: 3,
            message: "execution reverted".to_string(),
            data: Some(serde_json::json!("0x646cf558")),
        };
        assert_eq!(flat.revert_data(), Some(vec![0x64, 0x6c, 0xf5, 0x58]));

        let nested = RpcError::Remote {
            code: -32603,
            message: "Internal error".to_string(),
            data: Some(serde_json::json!({"data": "0x01"})),
        };
        assert_eq!(nested.revert_data(), Some(vec![0x01]));
        assert_eq!(nested.code(), Some(-32603));

        let other = RpcError::Response("bad".to_string());
        assert_eq!(other.revert_data(), None);
        assert_eq!(other.code(), None);
    }

    #[tokio::test]
    async fn test_hung_endpoint_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = RpcClient::with_timeout(format!("http://{}", addr), Duration::from_millis(200));
        let result: Result<bool, RpcError> = client.call("eth_call", serde_json::json!([])).await;
        match result {
            Err(RpcError::Request(e)) => assert!(e.is_timeout(), "{}", e),
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }
}
