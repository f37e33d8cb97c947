//! Long-running operation helpers.
//!
//! ARM answers slow writes with 201/202 plus an `Azure-AsyncOperation` or
//! `Location` header to poll.

use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const ASYNC_OPERATION: &str = "azure-asyncoperation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
}

impl OperationState {
    /// Map an ARM provisioning status onto a polling decision.
    /// Unknown states keep polling.
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "succeeded" | "completed" => OperationState::Succeeded,
            "failed" | "canceled" | "cancelled" => OperationState::Failed,
            _ => OperationState::InProgress,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where to poll for a pending operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollTargets {
    pub async_operation: Option<Url>,
    pub location: Option<Url>,
}

impl PollTargets {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            async_operation: header_url(headers, ASYNC_OPERATION),
            location: header_url(headers, LOCATION.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.async_operation.is_none() && self.location.is_none()
    }
}

fn header_url(headers: &HeaderMap, name: &str) -> Option<Url> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Url::parse(value).ok())
}

/// Delay before the next poll: `Retry-After` seconds, else `default`
pub fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_operation_state_from_status() {
        assert_eq!(OperationState::from_status("Succeeded"), OperationState::Succeeded);
        assert_eq!(OperationState::from_status("Completed"), OperationState::Succeeded);
        assert_eq!(OperationState::from_status("Failed"), OperationState::Failed);
        assert_eq!(OperationState::from_status("Canceled"), OperationState::Failed);
        assert_eq!(OperationState::from_status("InProgress"), OperationState::InProgress);
        assert_eq!(OperationState::from_status("Importing"), OperationState::InProgress);
    }

    #[test]
    fn test_retry_after_header() {
        let default = Duration::from_secs(5);
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers, default), default);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after(&headers, default), Duration::from_secs(12));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers, default), default);
    }

    #[test]
    fn test_poll_targets_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(PollTargets::from_headers(&headers).is_empty());

        headers.insert(
            ASYNC_OPERATION,
            HeaderValue::from_static("https://management.azure.com/operations/op1?api-version=2014-04-01"),
        );
        headers.insert(LOCATION, HeaderValue::from_static("not a url"));

        let targets = PollTargets::from_headers(&headers);
        assert_eq!(
            targets.async_operation.as_ref().map(Url::path),
            Some("/operations/op1")
        );
        assert!(targets.location.is_none());
        assert!(!targets.is_empty());
    }
}
