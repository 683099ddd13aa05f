//! Async HTTP server: tokio + hyper, one App shared by all connections.
//! `run` blocks until Ctrl-C; `spawn` starts a server on the current runtime and returns a
//! handle that can shut it down.

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::{App, CoreError, RequestContext, Response};

/// Request bodies larger than this are rejected with 413.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Accept connections on `listener` until `shutdown` resolves.
pub async fn serve<F>(app: Arc<App>, listener: TcpListener, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let app = Arc::clone(&app);
                tokio::task::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let app = Arc::clone(&app);
                        async move { Ok::<_, Infallible>(dispatch(&app, req).await) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
        }
    }
}

async fn dispatch(app: &App, req: Request<hyper::body::Incoming>) -> HyperResponse<Full<Bytes>> {
    let resp = match to_request_context(req).await {
        Ok(ctx) => {
            let method = ctx.method.clone();
            let path = ctx.path.clone();
            let resp = app.handle(ctx);
            tracing::debug!(%method, %path, status = resp.status_code, "request");
            resp
        }
        Err(e) => Response::from_error(&e),
    };
    to_hyper_response(resp)
}

async fn to_request_context(req: Request<hyper::body::Incoming>) -> Result<RequestContext, CoreError> {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let ctx = RequestContext::new(req.method().as_str(), &target);
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                CoreError::PayloadTooLarge(format!(
                    "request body exceeds {} bytes",
                    MAX_BODY_BYTES
                ))
            } else {
                CoreError::BadRequest(e.to_string())
            }
        })?
        .to_bytes();
    Ok(ctx.with_body(body.to_vec()))
}

fn to_hyper_response(resp: Response) -> HyperResponse<Full<Bytes>> {
    let mut out = HyperResponse::new(Full::new(Bytes::from(resp.body)));
    *out.status_mut() =
        StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if let Some(value) = resp
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        out.headers_mut().insert(CONTENT_TYPE, value);
    }
    out
}

/// Running server started by `spawn`.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://host:port` of the bound listener.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn shutdown(mut self) -> io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Bind `addr` and serve `app` on the current runtime. Port 0 picks a free port.
pub async fn spawn(app: App, addr: impl ToSocketAddrs) -> io::Result<ServerHandle> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(serve(Arc::new(app), listener, async move {
        let _ = rx.await;
    }));
    Ok(ServerHandle {
        addr: local,
        shutdown: Some(tx),
        task,
    })
}

/// Run the server (blocks) until Ctrl-C.
pub fn run(app: App, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!("{}:{}", host, port);
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async move {
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        serve(Arc::new(app), listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    })
}
