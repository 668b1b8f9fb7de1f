//! Retry/backoff behavior against a local stub backend.
//!
//! The stub serves one canned HTTP response per connection; `connection:
//! close` forces a fresh connection per attempt, so the hit counter equals
//! the number of attempts made.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tailorflow::api::{ApiClient, ApiError};
use tailorflow::models::Resume;
use tailorflow::net::{self, RequestConfig};

fn http_response(status_line: &str, extra_headers: &[&str], body: &str) -> String {
    let mut out = format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
        body.len()
    );
    for h in extra_headers {
        out.push_str(h);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}

fn resp_500() -> String {
    http_response("500 Internal Server Error", &[], r#"{"detail": "boom"}"#)
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn parse_content_length(headers: &[u8]) -> usize {
    let text = String::from_utf8_lossy(headers);
    text.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Serve `responses` in order, one per connection, repeating the last one.
async fn spawn_stub(responses: Vec<String>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_srv = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let n = hits_srv.fetch_add(1, Ordering::SeqCst);
            let response = responses
                .get(n)
                .or_else(|| responses.last())
                .cloned()
                .unwrap_or_default();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 65536];
                let mut read = 0usize;
                // Read the request (headers + announced body) before replying.
                loop {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            read += n;
                            if let Some(end) = find_headers_end(&buf[..read]) {
                                let body_len = parse_content_length(&buf[..end]);
                                if read >= end + body_len {
                                    break;
                                }
                            }
                            if read == buf.len() {
                                break;
                            }
                        }
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, hits)
}

fn analysis_body(score: u8) -> String {
    format!(
        r#"{{"score": {score}, "matched": ["Rust"], "missing": [],
            "sections": {{"skillsCoveragePct": 80, "preferredCoveragePct": 50, "domainCoveragePct": 70}},
            "normalizedJD": {{"skills": ["Rust"], "responsibilities": []}}}}"#
    )
}

#[tokio::test]
async fn repeated_500s_consume_exactly_retries_plus_one_attempts() {
    let (addr, hits) = spawn_stub(vec![resp_500(), resp_500(), resp_500(), resp_500()]).await;
    let url = format!("http://{addr}/api/analyze");

    let started = Instant::now();
    let res = net::send_with_retry(
        || net::http_client().post(&url).json(&serde_json::json!({})),
        RequestConfig {
            timeout_ms: 2_000,
            retries: 2,
            requires_auth: false,
        },
        "test",
    )
    .await
    .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    assert_eq!(hits.load(Ordering::SeqCst), 3, "expected retries + 1 attempts");
    // Inter-attempt delays follow min(1000 * 2^attempt, 5000): 1s then 2s.
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(3_000),
        "backoff too short: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(8_000),
        "backoff too long: {elapsed:?}"
    );
}

#[tokio::test]
async fn recovers_when_a_retry_succeeds() {
    let (addr, hits) = spawn_stub(vec![
        resp_500(),
        http_response("200 OK", &[], &analysis_body(77)),
    ])
    .await;

    let api = ApiClient::new(format!("http://{addr}"), None, 5_000, 2);
    let analysis = api.analyze(&Resume::default(), &Default::default()).await.unwrap();

    assert_eq!(analysis.score, 77);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rate_limit_waits_for_retry_after_then_succeeds() {
    let (addr, hits) = spawn_stub(vec![
        http_response("429 Too Many Requests", &["retry-after: 1"], r#"{"error": "rate_limit_exceeded"}"#),
        http_response("200 OK", &[], r#"{"status": "ok"}"#),
    ])
    .await;
    let url = format!("http://{addr}/api/health");

    let started = Instant::now();
    let res = net::send_with_retry(
        || net::http_client().get(&url),
        RequestConfig {
            timeout_ms: 2_000,
            retries: 2,
            requires_auth: false,
        },
        "test",
    )
    .await
    .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(1), "did not wait: {elapsed:?}");
    assert!(elapsed <= Duration::from_secs(5), "waited past cap: {elapsed:?}");
}

#[tokio::test]
async fn terminal_4xx_is_surfaced_immediately_with_decoded_message() {
    let (addr, hits) = spawn_stub(vec![http_response(
        "422 Unprocessable Entity",
        &[],
        r#"{"error": true, "message": "Invalid input: resume is empty",
            "error_code": "VALIDATION_ERROR", "status_code": 422,
            "details": {"field": "resume"}}"#,
    )])
    .await;

    let api = ApiClient::new(format!("http://{addr}"), None, 2_000, 2);
    let err = api
        .analyze(&Resume::default(), &Default::default())
        .await
        .unwrap_err();

    match err {
        ApiError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Invalid input: resume is empty");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1, "4xx must not be retried");
}

#[tokio::test]
async fn export_error_yields_no_bytes_and_a_decoded_message() {
    let (addr, _hits) = spawn_stub(vec![http_response(
        "422 Unprocessable Entity",
        &[],
        r#"{"error": true, "message": "Export failed: resume has no content"}"#,
    )])
    .await;

    let api = ApiClient::new(format!("http://{addr}"), None, 2_000, 0);
    let err = api.export_docx(&Resume::default()).await.unwrap_err();

    // No bytes means the caller never reaches the download path.
    match err {
        ApiError::Api { message, .. } => {
            assert_eq!(message, "Export failed: resume has no content");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn network_failure_on_final_attempt_is_raised() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/api/health");
    let err = net::send_with_retry(
        || net::http_client().get(&url),
        RequestConfig {
            timeout_ms: 1_000,
            retries: 1,
            requires_auth: false,
        },
        "test",
    )
    .await
    .unwrap_err();

    assert!(err.is_connect() || err.is_request());
}

#[tokio::test]
async fn timeout_counts_as_a_failed_attempt() {
    // A server that accepts and then goes silent.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });

    let url = format!("http://{addr}/api/health");
    let err = net::send_with_retry(
        || net::http_client().get(&url),
        RequestConfig {
            timeout_ms: 300,
            retries: 0,
            requires_auth: false,
        },
        "test",
    )
    .await
    .unwrap_err();

    assert!(err.is_timeout());
}
