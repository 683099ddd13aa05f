//! Driver protocol: Transport, ApiResponse, DriverError.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("invalid service URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("connect failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),
    #[error("bad request: {0}")]
    Request(#[from] http::Error),
    #[error("response is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoded response: status code and JSON body (`Null` when the body is empty).
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// `error` field of a `{"error": ..}` body.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Sends one request and waits for the full response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `target` is a path with optional query, e.g. `/orders?userId=1`.
    async fn send(
        &self,
        method: &str,
        target: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, DriverError>;
}
