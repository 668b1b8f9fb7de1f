//! Rate-limit friendly request sending with a bounded retry budget.
//!
//! Every logical request gets one `x-request-id` for backend correlation and
//! up to `retries + 1` attempts. Retry selection lives in [`retry_delay`] so
//! the policy is testable without sockets.

use std::sync::OnceLock;
use std::time::Duration;

use uuid::Uuid;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest sleep the policy will ever pick, for 429 and 5xx alike.
const MAX_BACKOFF_MS: u64 = 5_000;
/// Sleep applied to a 429 without a usable retry-after header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

/// Shared client: connection pooling across all endpoint calls.
pub fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .expect("reqwest client")
    })
}

/// Per-call request configuration. `requires_auth` is carried for parity with
/// the backend contract but nothing reads it yet.
#[derive(Clone, Copy, Debug)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    #[allow(dead_code)]
    pub requires_auth: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            retries: 2,
            requires_auth: false,
        }
    }
}

/// Exponential backoff for attempt `attempt` (0-based): 1000, 2000, 4000,
/// then capped at 5000ms.
pub fn backoff_ms(attempt: u32) -> u64 {
    1000u64
        .saturating_mul(1u64 << attempt.min(12))
        .min(MAX_BACKOFF_MS)
}

/// Decide whether the just-finished attempt should be retried, and after how
/// long. `status` is `None` for a network-level failure (DNS, reset, timeout
/// abort). Returns `None` when the response should be handed back as-is
/// (success or a terminal 4xx).
pub fn retry_delay(status: Option<u16>, retry_after_secs: Option<u64>, attempt: u32) -> Option<Duration> {
    match status {
        Some(429) => Some(Duration::from_secs(
            retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS).min(5),
        )),
        Some(s) if s >= 500 => Some(Duration::from_millis(backoff_ms(attempt))),
        Some(_) => None,
        None => Some(Duration::from_millis(backoff_ms(attempt))),
    }
}

fn parse_retry_after(res: &reqwest::Response) -> Option<u64> {
    res.headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Send a request with the bounded-retry policy.
///
/// `make` builds a fresh request per attempt (multipart bodies cannot be
/// cloned); the same request id is reattached so the backend can correlate
/// retries of one logical call. Exhausting the budget on an HTTP error status
/// returns the final response for the caller to decode; a network-level
/// failure on the final attempt is raised instead.
pub async fn send_with_retry<F>(
    make: F,
    cfg: RequestConfig,
    label: &str,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let request_id = Uuid::new_v4().to_string();
    let mut attempt: u32 = 0;

    loop {
        let req = make()
            .header(REQUEST_ID_HEADER, &request_id)
            .timeout(Duration::from_millis(cfg.timeout_ms));

        match req.send().await {
            Ok(res) => {
                let status = res.status().as_u16();
                let retry_after = parse_retry_after(&res);
                match retry_delay(Some(status), retry_after, attempt) {
                    Some(delay) if attempt < cfg.retries => {
                        attempt += 1;
                        log::warn!(
                            "[net] {label} http {status} retry={attempt} backoff={}ms",
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    _ => return Ok(res),
                }
            }
            Err(e) => {
                if attempt >= cfg.retries {
                    return Err(e);
                }
                let delay = Duration::from_millis(backoff_ms(attempt));
                attempt += 1;
                log::warn!(
                    "[net] {label} error retry={attempt} backoff={}ms : {e}",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_ms(0), 1000);
        assert_eq!(backoff_ms(1), 2000);
        assert_eq!(backoff_ms(2), 4000);
        assert_eq!(backoff_ms(3), 5000);
        assert_eq!(backoff_ms(10), 5000);
    }

    #[test]
    fn rate_limit_honors_retry_after_capped_at_five_seconds() {
        assert_eq!(
            retry_delay(Some(429), Some(2), 0),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            retry_delay(Some(429), Some(30), 0),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            retry_delay(Some(429), None, 0),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn server_errors_and_network_failures_back_off_exponentially() {
        assert_eq!(
            retry_delay(Some(500), None, 0),
            Some(Duration::from_millis(1000))
        );
        assert_eq!(
            retry_delay(Some(503), None, 1),
            Some(Duration::from_millis(2000))
        );
        assert_eq!(
            retry_delay(None, None, 2),
            Some(Duration::from_millis(4000))
        );
    }

    #[test]
    fn success_and_terminal_statuses_return_immediately() {
        assert_eq!(retry_delay(Some(200), None, 0), None);
        assert_eq!(retry_delay(Some(201), None, 0), None);
        assert_eq!(retry_delay(Some(400), None, 0), None);
        assert_eq!(retry_delay(Some(404), None, 0), None);
        assert_eq!(retry_delay(Some(422), None, 0), None);
    }
}
