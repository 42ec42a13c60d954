//! Response handling shared by the HTTP clients.
//!
//! Every helper reports a failed attempt as a human-readable string; the
//! retry policy turns the last one into a `ClientError::RemoteCall`.

use load_manager_core::TaskOptions;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::retry::RetryPolicy;

/// A base URL plus the client and retry policy used to reach it.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub(crate) client: reqwest::Client,
    base_url: String,
    pub(crate) retry: RetryPolicy,
}

impl Endpoint {
    pub(crate) fn new(client: reqwest::Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            retry,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Name a payload in logs and errors.
pub(crate) fn payload_target(options: &TaskOptions) -> String {
    options
        .task_id
        .map_or_else(|| format!("dataset {}", options.dataset_id), |id| id.to_string())
}

/// Describe a transport-level failure.
pub(crate) fn transport(err: &reqwest::Error) -> String {
    format!("request failed: {err}")
}

/// Pass through a 2xx response, turn anything else into a failure.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        Err(format!("status {status}"))
    } else {
        Err(format!("status {status}: {body}"))
    }
}

/// Decode a required JSON body from a 2xx response.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| format!("failed to decode response body: {e}"))
}

/// Decode a body that may legitimately be absent.
///
/// `204`, `404`, an empty body and a JSON `null` all mean "nothing found".
pub(crate) async fn decode_optional<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, String> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let response = ensure_success(response).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read response body: {e}"))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<Option<T>>(&bytes)
        .map_err(|e| format!("failed to decode response body: {e}"))
}

/// Decode a boolean acknowledgement; an empty 2xx body counts as `true`.
pub(crate) async fn decode_ack(response: Response) -> Result<bool, String> {
    let response = ensure_success(response).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read response body: {e}"))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(true);
    }

    serde_json::from_slice::<bool>(&bytes)
        .map_err(|e| format!("failed to decode acknowledgement: {e}"))
}
