//! Typed facade over the TailorFlow backend.
//!
//! One method per endpoint; every call goes through [`crate::net`] for the
//! retry/backoff/request-id behavior, and every non-success status is decoded
//! into a single [`ApiError`] carrying a human-readable message, optional
//! structured details, and the HTTP status code.

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::{
    AnalysisResult, AnalyzeRequest, AppEvent, ActionKind, HealthResponse, Jd, ParseKind,
    ParseRequest, ParseResponse, Resume, RewriteConstraints, RewriteRequest, RewriteResponse,
    RewriteTarget,
};
use crate::net::{self, RequestConfig};

/// Heavier backend operations get longer budgets.
const PARSE_UPLOAD_TIMEOUT_MS: u64 = 45_000;
const ANALYZE_TIMEOUT_MS: u64 = 45_000;
const REWRITE_TIMEOUT_MS: u64 = 60_000;
/// Rewrites are costly and not idempotent-safe; retry once at most.
const REWRITE_RETRIES: u32 = 1;
const HEALTH_TIMEOUT_MS: u64 = 5_000;

/// Pacing between sequential batch-rewrite calls.
const BATCH_PACING_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status for API-level failures, if this was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Decode a non-success body into an [`ApiError::Api`].
///
/// Recognizes `{error, message?, details?}` and `{detail?, message?}` shapes;
/// anything unparsable falls back to the HTTP status text.
pub(crate) fn decode_error_body(status: u16, body: &str) -> ApiError {
    let fallback = || {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"))
    };

    let (message, details) = match serde_json::from_str::<Value>(body) {
        Ok(v) => {
            let message = v
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| v.get("detail").and_then(Value::as_str))
                .or_else(|| v.get("error").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(fallback);
            (message, v.get("details").cloned())
        }
        Err(_) => (fallback(), None),
    };

    ApiError::Api {
        status,
        message,
        details,
    }
}

async fn into_api_error(res: reqwest::Response) -> ApiError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    decode_error_body(status, &body)
}

async fn decode_json<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ApiError> {
    if !res.status().is_success() {
        return Err(into_api_error(res).await);
    }
    let text = res.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// The backend client handed to every spawned action task.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    auth_token: Option<String>,
    timeout_ms: u64,
    retries: u32,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout_ms: u64,
        retries: u32,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            auth_token,
            timeout_ms,
            retries,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => rb.header("Authorization", format!("Bearer {token}")),
            None => rb,
        }
    }

    fn cfg(&self, timeout_ms: u64, retries: u32) -> RequestConfig {
        RequestConfig {
            timeout_ms,
            retries,
            requires_auth: self.auth_token.is_some(),
        }
    }

    fn default_cfg(&self) -> RequestConfig {
        self.cfg(self.timeout_ms, self.retries)
    }

    /// `GET /api/health`: connectivity probe for the status line.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let url = self.url("/api/health");
        let res = net::send_with_retry(
            || self.authed(net::http_client().get(&url)),
            self.cfg(HEALTH_TIMEOUT_MS, 0),
            "health",
        )
        .await?;
        let health: HealthResponse = decode_json(res).await?;
        Ok(health.status == "ok")
    }

    async fn parse_inner(
        &self,
        kind: ParseKind,
        content: &str,
        filename: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = self.url("/api/parse");
        let body = ParseRequest {
            kind,
            content,
            filename,
        };
        let res = net::send_with_retry(
            || self.authed(net::http_client().post(&url).json(&body)),
            self.default_cfg(),
            "parse",
        )
        .await?;
        let parsed: ParseResponse = decode_json(res).await?;
        Ok(parsed.parsed)
    }

    /// `POST /api/parse` with `type: "resume"`.
    pub async fn parse_resume(
        &self,
        content: &str,
        filename: Option<&str>,
    ) -> Result<Resume, ApiError> {
        let parsed = self.parse_inner(ParseKind::Resume, content, filename).await?;
        Ok(serde_json::from_value(parsed)?)
    }

    /// `POST /api/parse` with `type: "jd"`.
    pub async fn parse_jd(&self, content: &str, filename: Option<&str>) -> Result<Jd, ApiError> {
        let parsed = self.parse_inner(ParseKind::Jd, content, filename).await?;
        Ok(serde_json::from_value(parsed)?)
    }

    async fn parse_upload_inner(&self, kind: ParseKind, path: &Path) -> Result<Value, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let url = self.url("/api/parse-upload");
        // The multipart body is rebuilt per attempt; streams are not cloneable.
        let res = net::send_with_retry(
            || {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone());
                let form = reqwest::multipart::Form::new()
                    .text("type", kind.as_str())
                    .part("file", part);
                self.authed(net::http_client().post(&url).multipart(form))
            },
            self.cfg(PARSE_UPLOAD_TIMEOUT_MS, self.retries),
            "parse-upload",
        )
        .await?;
        let parsed: ParseResponse = decode_json(res).await?;
        Ok(parsed.parsed)
    }

    /// `POST /api/parse-upload`: multipart file upload, resume side.
    pub async fn parse_upload_resume(&self, path: &Path) -> Result<Resume, ApiError> {
        let parsed = self.parse_upload_inner(ParseKind::Resume, path).await?;
        Ok(serde_json::from_value(parsed)?)
    }

    /// `POST /api/parse-upload`: multipart file upload, JD side.
    pub async fn parse_upload_jd(&self, path: &Path) -> Result<Jd, ApiError> {
        let parsed = self.parse_upload_inner(ParseKind::Jd, path).await?;
        Ok(serde_json::from_value(parsed)?)
    }

    /// `POST /api/analyze`: the most expensive backend call.
    pub async fn analyze(&self, resume: &Resume, jd: &Jd) -> Result<AnalysisResult, ApiError> {
        let url = self.url("/api/analyze");
        let body = AnalyzeRequest { resume, jd };
        let res = net::send_with_retry(
            || self.authed(net::http_client().post(&url).json(&body)),
            self.cfg(ANALYZE_TIMEOUT_MS, self.retries),
            "analyze",
        )
        .await?;
        decode_json(res).await
    }

    /// `POST /api/rewrite`: one bullet per call. The backend accepts an
    /// optional analysis id but does not require session correlation, so none
    /// is sent.
    pub async fn rewrite(
        &self,
        section: &str,
        text: &str,
        jd_keywords: &[String],
        max_words: u32,
    ) -> Result<RewriteResponse, ApiError> {
        let url = self.url("/api/rewrite");
        let body = RewriteRequest {
            analysis_id: None,
            section,
            text,
            constraints: RewriteConstraints {
                jd_keywords,
                max_words,
            },
        };
        let res = net::send_with_retry(
            || self.authed(net::http_client().post(&url).json(&body)),
            self.cfg(REWRITE_TIMEOUT_MS, REWRITE_RETRIES),
            "rewrite",
        )
        .await?;
        decode_json(res).await
    }

    /// Rewrite a work list strictly sequentially, one bullet per call, with a
    /// fixed pacing delay between calls. Results and progress are posted as
    /// events; a failed item is reported and the batch moves on.
    pub async fn rewrite_batch(
        &self,
        section: &str,
        items: Vec<(RewriteTarget, String)>,
        jd_keywords: Vec<String>,
        max_words: u32,
        events: UnboundedSender<AppEvent>,
    ) {
        let total = items.len();
        for (done, (target, text)) in items.into_iter().enumerate() {
            match self.rewrite(section, &text, &jd_keywords, max_words).await {
                Ok(r) => {
                    let _ = events.send(AppEvent::RewriteDone {
                        target,
                        rewritten: r.rewritten,
                        diff: r.diff,
                    });
                }
                Err(e) => {
                    let _ = events.send(AppEvent::ActionFailed {
                        action: ActionKind::BatchRewrite,
                        message: e.to_string(),
                    });
                }
            }
            let _ = events.send(AppEvent::BatchProgress {
                done: done + 1,
                total,
            });
            if done + 1 < total {
                tokio::time::sleep(Duration::from_millis(BATCH_PACING_MS)).await;
            }
        }
        let _ = events.send(AppEvent::BatchDone);
    }

    /// `POST /api/export/docx`: returns the document bytes on success; a
    /// non-2xx response surfaces the decoded error and yields no bytes.
    pub async fn export_docx(&self, resume: &Resume) -> Result<Vec<u8>, ApiError> {
        let url = self.url("/api/export/docx");
        let res = net::send_with_retry(
            || self.authed(net::http_client().post(&url).json(resume)),
            self.default_cfg(),
            "export",
        )
        .await?;
        if !res.status().is_success() {
            return Err(into_api_error(res).await);
        }
        Ok(res.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_error_message_details_shape() {
        let body = r#"{"error": true, "message": "Invalid input: content too long",
                       "error_code": "VALIDATION_ERROR", "status_code": 422,
                       "details": {"field": "content"}}"#;
        match decode_error_body(422, body) {
            ApiError::Api {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid input: content too long");
                assert_eq!(details.unwrap()["field"], "content");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn decodes_detail_shape() {
        let body = r#"{"detail": "analysis failed"}"#;
        match decode_error_body(500, body) {
            ApiError::Api { message, .. } => assert_eq!(message, "analysis failed"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn decodes_string_error_field() {
        let body = r#"{"error": "rate_limit_exceeded"}"#;
        match decode_error_body(429, body) {
            ApiError::Api { message, .. } => assert_eq!(message, "rate_limit_exceeded"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_status_text_on_garbage() {
        match decode_error_body(503, "<html>busy</html>") {
            ApiError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_status_gets_numeric_fallback() {
        match decode_error_body(599, "") {
            ApiError::Api { message, .. } => assert_eq!(message, "HTTP 599"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
