//! HTTP implementation of the signal-service client

use super::{ServiceReply, SignalService};
use crate::session::Motion;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Operator-facing message for any transport-level fault on an action.
/// The UI shows this verbatim, so it stays one stable string.
const CONNECT_FAILED: &str = "Failed to connect to server";

/// reqwest-backed client for the signal-processing service.
///
/// A per-request timeout bounds every call so a hung service degrades to
/// the normalized fault instead of stalling the session.
pub struct HttpSignalService {
    client: Client,
    base_url: String,
}

impl HttpSignalService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST an action endpoint. Any transport fault normalizes to an error
    /// reply carrying [`CONNECT_FAILED`].
    async fn post_action(&self, path: &str, body: Option<RecordBody<'_>>) -> ServiceReply {
        let mut request = self
            .client
            .post(self.url(path))
            .header("Accept", "application/json");
        if let Some(body) = &body {
            request = request.json(body);
        }

        match read_reply(request.send().await).await {
            Ok(reply) => reply,
            Err(fault) => {
                tracing::warn!(path, fault = %fault, "service action degraded to error reply");
                ServiceReply::Error {
                    message: CONNECT_FAILED.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl SignalService for HttpSignalService {
    async fn request_recording(&self, motion: &Motion) -> ServiceReply {
        self.post_action(
            "/record",
            Some(RecordBody {
                motion: motion.as_str(),
            }),
        )
        .await
    }

    async fn request_stop_recording(&self) -> ServiceReply {
        self.post_action("/stop-recording", None).await
    }

    async fn request_training(&self) -> ServiceReply {
        self.post_action("/train", None).await
    }

    async fn request_start_inference(&self) -> ServiceReply {
        self.post_action("/start-inference", None).await
    }

    async fn request_stop_inference(&self) -> ServiceReply {
        self.post_action("/stop-inference", None).await
    }

    async fn query_status(&self) -> ServiceReply {
        let request = self
            .client
            .get(self.url("/status"))
            .header("Accept", "application/json");

        match read_reply(request.send().await).await {
            Ok(reply) => reply,
            Err(fault) => {
                tracing::debug!(fault = %fault, "status query degraded to waiting");
                ServiceReply::Waiting
            }
        }
    }
}

/// Turn a raw HTTP outcome into a reply, or a fault description for the log.
/// Non-2xx statuses and unparseable bodies are transport faults; the service
/// reports domain rejections inside a 200 body.
async fn read_reply(
    result: Result<reqwest::Response, reqwest::Error>,
) -> Result<ServiceReply, String> {
    let response = result.map_err(|e| {
        if e.is_timeout() {
            format!("request timeout: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            format!("request failed: {e}")
        }
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("failed to read response: {e}"))?;

    if !status.is_success() {
        return Err(format!("HTTP {status}: {body}"));
    }

    serde_json::from_str(&body).map_err(|e| format!("failed to parse reply: {e} - body: {body}"))
}

// Wire types

#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    motion: &'a str,
}
