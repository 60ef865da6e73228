//! ReqwestTransport against a local HTTP responder

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::json;
use snrs_config::TrackerConfig;
use snrs_identity::{MemoryContext, SNRS_UUID};
use snrs_tracker::{
    Category, HttpMethod, HttpRequest, HttpTransport, MessageBuilder, ReqwestTransport,
    SendOutcome, TrackerClient, TransportError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Accept one connection, capture the raw request, answer with `response`
async fn one_shot_server(response: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        let _ = tx.send(request);
    });

    (format!("http://{addr}"), rx)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

#[tokio::test]
async fn test_post_json_roundtrip() {
    let (base, captured) =
        one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok").await;

    let mut headers = IndexMap::new();
    headers.insert("Api-Key".to_string(), "k-1".to_string());
    let request = HttpRequest::json(
        HttpMethod::Post,
        format!("{base}/sdk-proxy"),
        headers,
        &json!([{"label": "x"}]),
        Duration::from_secs(5),
    )
    .unwrap();

    let response = ReqwestTransport::new().send(request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"ok");

    let raw = captured.await.unwrap();
    assert!(raw.starts_with("POST /sdk-proxy HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("api-key: k-1"));
    assert!(raw.ends_with(r#"[{"label":"x"}]"#));
}

#[tokio::test]
async fn test_non_200_is_a_response() {
    let (base, _captured) = one_shot_server(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;

    let request = HttpRequest::json(
        HttpMethod::Put,
        format!("{base}/tracker/key"),
        IndexMap::new(),
        &json!({}),
        Duration::from_secs(5),
    )
    .unwrap();

    let response = ReqwestTransport::new().send(request).await.unwrap();
    assert_eq!(response.status, 503);
    assert!(!response.is_accepted());
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = HttpRequest::json(
        HttpMethod::Post,
        format!("http://{addr}/"),
        IndexMap::new(),
        &json!([]),
        Duration::from_secs(5),
    )
    .unwrap();

    let err = ReqwestTransport::new().send(request).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn test_request_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let request = HttpRequest::json(
        HttpMethod::Post,
        format!("http://{addr}/"),
        IndexMap::new(),
        &json!([]),
        Duration::from_millis(200),
    )
    .unwrap();

    let err = ReqwestTransport::new().send(request).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout(Duration::from_millis(200)));
}

#[tokio::test]
async fn test_tracker_flush_over_http() {
    let (base, captured) =
        one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;

    let config = TrackerConfig::new("live-key").with_batch_url(format!("{base}/sdk-proxy"));
    let ctx = Arc::new(MemoryContext::new().with_cookie(SNRS_UUID, "abc-123"));
    let tracker = TrackerClient::new(config, ctx).unwrap();

    tracker
        .enqueue(Category::Event, MessageBuilder::new().label("ping").build())
        .unwrap();
    assert_eq!(tracker.flush().await, SendOutcome::Sent { count: 1 });

    let raw = captured.await.unwrap().to_ascii_lowercase();
    assert!(raw.contains("user-agent: synerise-php-sdk/3.0"));
    assert!(raw.contains("\"uuid\":\"abc-123\""));
}
