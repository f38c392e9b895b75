use measurement_outbox::{
    HttpTransport, HttpTransportConfig, OutboxError, TrackingRequest, Transport,
    MAX_GET_URI_LENGTH,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

/// What the fake collector saw.
#[derive(Debug)]
struct Received {
    request_line: String,
    headers: Vec<String>,
    body: String,
}

/// Accept one connection, record the request, answer with `status`.
async fn serve_once(status: u16) -> (Url, oneshot::Receiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.split("\r\n").filter(|l| !l.is_empty());
        let request_line = lines.next().unwrap().to_string();
        let headers: Vec<String> = lines.map(|l| l.to_ascii_lowercase()).collect();

        let content_length = headers
            .iter()
            .find_map(|h| h.strip_prefix("content-length:"))
            .map(|v| v.trim().parse::<usize>().unwrap())
            .unwrap_or(0);

        while buffer.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buffer[header_end..]).to_string();

        let response = format!(
            "HTTP/1.1 {status} Status\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let _ = tx.send(Received {
            request_line,
            headers,
            body,
        });
    });

    let base = Url::parse(&format!("http://{addr}/collect")).unwrap();
    (base, rx)
}

fn transport() -> HttpTransport {
    HttpTransport::new(HttpTransportConfig {
        timeout: Duration::from_secs(5),
        user_agent: Some("measurement-test/1.0".to_string()),
    })
    .unwrap()
}

#[tokio::test]
async fn short_request_is_sent_as_get() {
    let (mut url, received) = serve_once(200).await;
    url.query_pairs_mut()
        .append_pair("v", "1")
        .append_pair("t", "pageview");

    transport()
        .send(&TrackingRequest::from_uri(&url))
        .await
        .unwrap();

    let received = received.await.unwrap();
    assert_eq!(received.request_line, "GET /collect?v=1&t=pageview HTTP/1.1");
    assert!(received
        .headers
        .iter()
        .any(|h| h == "user-agent: measurement-test/1.0"));
    assert!(received.body.is_empty());
}

#[tokio::test]
async fn long_request_is_posted_with_query_as_body() {
    let (mut url, received) = serve_once(204).await;
    url.query_pairs_mut()
        .append_pair("v", "1")
        .append_pair("dp", &"x".repeat(MAX_GET_URI_LENGTH));
    let query = url.query().unwrap().to_string();

    transport()
        .send(&TrackingRequest::from_uri(&url))
        .await
        .unwrap();

    let received = received.await.unwrap();
    assert_eq!(received.request_line, "POST /collect HTTP/1.1");
    assert!(received
        .headers
        .iter()
        .any(|h| h == "content-type: application/x-www-form-urlencoded"));
    assert_eq!(received.body, query);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (url, received) = serve_once(503).await;

    let result = transport().send(&TrackingRequest::from_uri(&url)).await;
    assert!(matches!(result, Err(OutboxError::Status { status: 503, .. })));
    received.await.unwrap();
}

#[tokio::test]
async fn unreachable_collector_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/collect")).unwrap();
    let result = transport().send(&TrackingRequest::from_uri(&url)).await;
    assert!(matches!(result, Err(OutboxError::Http(_))));
}
