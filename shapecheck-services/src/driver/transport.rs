//! Transport implementations: real HTTP over hyper, and in-process dispatch into an App.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST};
use http::Uri;
use http_body_util::{BodyExt, Full};
use hyper::Request;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use shapecheck_core::{App, RequestContext, Response};
use tokio::net::TcpStream;

use super::protocol::{ApiResponse, DriverError, Transport};

fn decode_body(bytes: &[u8]) -> Result<Value, DriverError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn encode_body(body: Option<&Value>) -> Result<Vec<u8>, DriverError> {
    match body {
        Some(v) => Ok(serde_json::to_vec(v)?),
        None => Ok(Vec::new()),
    }
}

/// HTTP/1.1 over a fresh TCP connection per request.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    host: String,
    port: u16,
    authority: String,
}

impl HttpTransport {
    /// `base_url` like `http://localhost:3001`. Only plain `http` is supported.
    pub fn new(base_url: &str) -> Result<Self, DriverError> {
        let invalid = |reason: &str| DriverError::InvalidUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };
        let uri: Uri = base_url.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;
        if uri.scheme_str().is_some_and(|s| s != "http") {
            return Err(invalid("only http:// is supported"));
        }
        let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;
        Ok(Self {
            host: authority.host().to_string(),
            port: authority.port_u16().unwrap_or(80),
            authority: authority.as_str().to_string(),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.authority)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: &str,
        target: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, DriverError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "client connection closed with error");
            }
        });

        let mut builder = Request::builder()
            .method(method)
            .uri(target)
            .header(HOST, self.authority.as_str());
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder.body(Full::new(Bytes::from(encode_body(body)?)))?;

        let res = sender.send_request(req).await?;
        let status = res.status().as_u16();
        let bytes = res.into_body().collect().await?.to_bytes();
        tracing::debug!(%method, %target, status, "response");
        Ok(ApiResponse {
            status,
            body: decode_body(&bytes)?,
        })
    }
}

/// Dispatches straight into an App without a socket.
#[derive(Clone)]
pub struct InProcessTransport {
    app: Arc<App>,
}

impl InProcessTransport {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn send(
        &self,
        method: &str,
        target: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, DriverError> {
        let req = RequestContext::new(method, target).with_body(encode_body(body)?);
        let Response {
            status_code, body, ..
        } = self.app.handle(req);
        Ok(ApiResponse {
            status: status_code,
            body: decode_body(&body)?,
        })
    }
}
