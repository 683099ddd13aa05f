//! HTTP server over a real socket: spawn, request, shutdown.

use std::sync::Arc;

use serde_json::json;
use shapecheck_core::http::{spawn, MAX_BODY_BYTES};
use shapecheck_core::{App, RequestContext, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

fn echo_app() -> App {
    let mut app = App::new();
    app.register_route(
        "POST",
        "echo/:name",
        Arc::new(|req: &RequestContext| {
            Response::ok(&json!({
                "name": req.param("name"),
                "q": req.query_param("q"),
                "body": req.json_body()?,
            }))
        }),
    )
    .unwrap();
    app
}

#[tokio::test]
async fn serves_json_and_errors() {
    let server = spawn(echo_app(), "127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    assert_eq!(server.base_url(), format!("http://{}", addr));

    let body = r#"{"a":1}"#;
    let response = raw_request(
        addr,
        &format!(
            "POST /echo/bob?q=1 HTTP/1.1\r\nHost: test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(response.ends_with(r#"{"body":{"a":1},"name":"bob","q":"1"}"#), "{}", response);

    let response = raw_request(
        addr,
        "GET /missing HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"), "{}", response);
    assert!(response.ends_with(r#"{"error":"Cannot GET /missing"}"#), "{}", response);

    server.shutdown().await.unwrap();
}

fn post_echo(body: &str) -> String {
    format!(
        "POST /echo/big HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[tokio::test]
async fn request_bodies_are_capped() {
    let server = spawn(echo_app(), "127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();

    let fits = format!("\"{}\"", "a".repeat(MAX_BODY_BYTES - 2));
    let response = raw_request(addr, &post_echo(&fits)).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", &response[..64.min(response.len())]);

    let too_big = format!("\"{}\"", "a".repeat(MAX_BODY_BYTES - 1));
    let response = raw_request(addr, &post_echo(&too_big)).await;
    assert!(response.starts_with("HTTP/1.1 413"), "{}", response);
    assert!(
        response.ends_with(&format!(r#"{{"error":"request body exceeds {} bytes"}}"#, MAX_BODY_BYTES)),
        "{}",
        response
    );

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let server = spawn(App::new(), "127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    server.shutdown().await.unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}
