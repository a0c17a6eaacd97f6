//! Serves the built-in schema on a real socket.

use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use timeql_server::{bind_schema, Server, ServerConfig, SCHEMA};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig::new()).await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::new(config, bind_schema(SCHEMA).unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap();
    }
}

struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl HttpResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn send(addr: SocketAddr, method: &str, path: &str, headers: &[(&str, &str)], body: &str) -> HttpResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
        body.len()
    );
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    request.push_str(body);
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();
    HttpResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

async fn query(addr: SocketAddr, body: Value) -> HttpResponse {
    send(
        addr,
        "POST",
        "/query",
        &[("Content-Type", "application/json"), ("Origin", "https://app.test")],
        &body.to_string(),
    )
    .await
}

#[tokio::test]
async fn test_today() {
    let server = TestServer::start().await;
    let response = query(server.addr, json!({"query": "{ today }"})).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://app.test")
    );
    assert_eq!(response.header("access-control-allow-credentials"), Some("true"));

    let today = response.json()["data"]["today"].as_str().unwrap().to_string();
    let today = chrono::DateTime::parse_from_rfc3339(&today).unwrap();
    assert!((Utc::now().fixed_offset() - today).num_seconds().abs() <= 2);
    server.stop().await;
}

#[tokio::test]
async fn test_distance_with_variables() {
    let server = TestServer::start().await;
    let response = query(
        server.addr,
        json!({
            "query": "query Distance($from: Time!) { distanceOfTimeToNowInWords(from: $from) }",
            "operationName": "Distance",
            "variables": {"from": "1970-01-01T00:00:00Z"}
        }),
    )
    .await;
    assert_eq!(response.status, 200);
    let words = response.json()["data"]["distanceOfTimeToNowInWords"]
        .as_str()
        .unwrap()
        .to_string();
    let seconds: i64 = words.strip_suffix(" second(s)").unwrap().parse().unwrap();
    assert!((Utc::now().timestamp() - seconds).abs() <= 2);
    server.stop().await;
}

#[tokio::test]
async fn test_error_envelope() {
    let server = TestServer::start().await;
    let response = query(server.addr, json!({"query": "{\n  testError\n}"})).await;
    assert_eq!(response.status, 200);
    insta::assert_json_snapshot!(response.json(), @r###"
    {
      "data": {
        "testError": null
      },
      "errors": [
        {
          "message": "This is not the droid you are looking for",
          "locations": [
            {
              "line": 2,
              "column": 3
            }
          ],
          "path": [
            "testError"
          ],
          "extensions": {
            "code": "NotFound",
            "message": "This is not the droid you are looking for"
          }
        }
      ]
    }
    "###);
    server.stop().await;
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = TestServer::start().await;
    let response = send(
        server.addr,
        "POST",
        "/query",
        &[("Content-Type", "application/json")],
        "{not json",
    )
    .await;
    assert_eq!(response.status, 400);
    let body = response.json();
    assert!(body.get("data").is_none());
    assert_eq!(body["errors"][0]["extensions"]["code"], "BAD_REQUEST");
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    // The server keeps serving.
    let response = query(server.addr, json!({"query": "{ __typename }"})).await;
    assert_eq!(response.json(), json!({"data": {"__typename": "Query"}}));
    server.stop().await;
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = TestServer::start_with(ServerConfig::new().max_body_size(1024)).await;
    let padding = " ".repeat(2048);
    let body = format!(r#"{{"query": "{{ today }}"{padding}}}"#);
    let response = send(
        server.addr,
        "POST",
        "/query",
        &[("Content-Type", "application/json")],
        &body,
    )
    .await;
    assert_eq!(response.status, 413);
    let body = response.json();
    assert!(body.get("data").is_none());
    assert_eq!(body["errors"][0]["message"], "Request body exceeds 1024 bytes.");
    assert_eq!(body["errors"][0]["extensions"]["code"], "PAYLOAD_TOO_LARGE");

    let response = query(server.addr, json!({"query": "{ __typename }"})).await;
    assert_eq!(response.json(), json!({"data": {"__typename": "Query"}}));
    server.stop().await;
}

#[tokio::test]
async fn test_deeply_nested_body() {
    let server = TestServer::start().await;
    let query_text = format!("{{ distanceOfTimeToNowInWords(from: {}) }}", "[".repeat(20_000));
    let response = query(server.addr, json!({ "query": query_text })).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.json()["errors"][0]["message"],
        "Syntax Error: document is nested more than 128 levels deep"
    );
    server.stop().await;
}

#[tokio::test]
async fn test_preflight() {
    let server = TestServer::start().await;
    let response = send(
        server.addr,
        "OPTIONS",
        "/query",
        &[
            ("Origin", "https://app.test"),
            ("Access-Control-Request-Method", "POST"),
        ],
        "",
    )
    .await;
    assert_eq!(response.status, 204);
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://app.test")
    );
    assert_eq!(
        response.header("access-control-allow-methods"),
        Some("GET, PUT, POST, DELETE")
    );
    assert_eq!(
        response.header("access-control-allow-headers"),
        Some("Origin, Authorization, Content-Type")
    );
    assert_eq!(response.header("access-control-max-age"), Some("50"));
    assert_eq!(response.header("access-control-allow-credentials"), Some("true"));
    server.stop().await;
}

#[tokio::test]
async fn test_health_and_unknown_paths() {
    let server = TestServer::start().await;
    let health = send(server.addr, "GET", "/health", &[], "").await;
    assert_eq!(health.status, 200);
    assert_eq!(health.json(), json!({"status": "healthy"}));

    let missing = send(server.addr, "GET", "/nope", &[], "").await;
    assert_eq!(missing.status, 404);

    let wrong_method = send(server.addr, "DELETE", "/query", &[], "").await;
    assert_eq!(wrong_method.status, 405);
    assert_eq!(wrong_method.header("allow"), Some("POST, OPTIONS"));
    server.stop().await;
}

#[tokio::test]
async fn test_request_errors_are_ok_status() {
    let server = TestServer::start().await;
    let response = query(server.addr, json!({"query": "mutation { today }"})).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.json(),
        json!({"errors": [{
            "message": "Schema is not configured for mutations.",
            "locations": [{"line": 1, "column": 1}]
        }]})
    );
    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_connections() {
    let server = TestServer::start().await;
    let addr = server.addr;
    let requests: Vec<_> = (0..16)
        .map(|_| tokio::spawn(async move { query(addr, json!({"query": "{ today }"})).await }))
        .collect();
    for request in requests {
        let response = request.await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.json()["data"]["today"].is_string());
    }
    server.stop().await;
}
