use crate::capture::Capture;
use crate::errors::IngestError;
use crate::github::IssueTracker;
use crate::http::{HandlerBody, json_response, text_response};
use crate::rate_limit::RateLimiter;
use http_body_util::BodyExt;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Rate-limit key used when the trusted proxy header is missing.
///
/// All header-less callers share this one bucket. That matches the deployed
/// behavior; whether it is intentional is an open product question.
const UNKNOWN_CLIENT_KEY: &str = "unknown";

#[derive(Serialize)]
struct CaptureAccepted {
    capture_id: Uuid,
}

#[derive(Serialize)]
struct UpstreamErrorBody {
    error: &'static str,
    status: u16,
    detail: String,
}

/// The ingestion pipeline: method check, per-IP rate limit, JSON parse and
/// shape check, capture assembly, issue creation, response mapping.
///
/// Collaborators are injected at construction so the handler can be exercised
/// with stubs. Each request runs the steps strictly in order and every
/// failure is terminal; nothing is retried.
pub struct IngestHandler {
    client_ip_header: String,
    rate_limiter: Arc<dyn RateLimiter>,
    tracker: Arc<dyn IssueTracker>,
}

impl IngestHandler {
    pub fn new(
        client_ip_header: String,
        rate_limiter: Arc<dyn RateLimiter>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Self {
        Self {
            client_ip_header,
            rate_limiter,
            tracker,
        }
    }

    /// Handles one request end to end.
    ///
    /// Validation failures and rate-limit denials are converted to final
    /// responses at the point of detection. The returned error covers only
    /// conditions the caller cannot act on (transport failures, response
    /// construction); the service layer maps those to 502/500 fallbacks.
    pub async fn handle<B>(&self, req: Request<B>) -> Result<Response<HandlerBody>, IngestError>
    where
        B: hyper::body::Body + Send,
        B::Data: Send,
        B::Error: std::fmt::Display,
    {
        if req.method() != Method::POST {
            return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }

        let client_key = req
            .headers()
            .get(&self.client_ip_header)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNKNOWN_CLIENT_KEY)
            .to_string();

        let allowed = match self.rate_limiter.limit(&client_key).await {
            Ok(allowed) => allowed,
            Err(e) => {
                // Fail closed: an unreachable limiter refuses the request
                tracing::warn!(error = %e, "rate limiter unavailable, refusing request");
                false
            }
        };
        if !allowed {
            tracing::debug!(key = %client_key, "rate limit exceeded");
            return text_response(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests");
        }

        let bytes = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::debug!(error = %e, "failed to read request body");
                return text_response(StatusCode::BAD_REQUEST, "Bad Request: invalid JSON");
            }
        };

        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) => {
                return text_response(StatusCode::BAD_REQUEST, "Bad Request: invalid JSON");
            }
        };

        // Null, arrays, primitives, and {} all collapse to the same error;
        // the response text is part of the external contract.
        let payload = match value {
            serde_json::Value::Object(map) if !map.is_empty() => map,
            _ => {
                return text_response(StatusCode::BAD_REQUEST, "Bad Request: empty payload");
            }
        };

        let capture = Capture::new(payload);
        let submission = capture.to_submission()?;

        match self.tracker.create_issue(&submission).await {
            Ok(()) => {
                tracing::debug!(capture_id = %capture.id(), "capture forwarded to tracker");
                json_response(
                    StatusCode::CREATED,
                    &CaptureAccepted {
                        capture_id: capture.id(),
                    },
                )
            }
            Err(IngestError::UpstreamRejected { status, detail }) => {
                tracing::error!(status, "issue tracker rejected capture");
                json_response(
                    StatusCode::BAD_GATEWAY,
                    &UpstreamErrorBody {
                        error: "GitHub API error",
                        status,
                        detail,
                    },
                )
            }
            Err(e) => Err(e),
        }
    }
}
