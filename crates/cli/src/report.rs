//! The JSON report printed after a plan runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use transport::HttpResponse;

use crate::config::StrategyKind;

/// Longest body excerpt kept in a report, in characters.
const BODY_EXCERPT_CHARS: usize = 512;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp, serialised as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    #[cfg(test)]
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What one response looked like.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    /// Request method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Response status.
    pub status: u16,
    /// Body size in bytes.
    pub bytes: usize,
    /// Start of the body, when it is text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<&HttpResponse> for ResponseSummary {
    fn from(response: &HttpResponse) -> Self {
        Self {
            method: response.method().to_string(),
            url: response.url().to_string(),
            status: response.status_code().as_u16(),
            bytes: response.body().len(),
            body: response
                .text()
                .ok()
                .filter(|text| !text.is_empty())
                .map(|text| text.chars().take(BODY_EXCERPT_CHARS).collect()),
        }
    }
}

/// Outcome of running a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Strategy that ran.
    pub strategy: StrategyKind,
    /// When the run started.
    pub started_at: Timestamp,
    /// Wall-clock duration of the run.
    pub elapsed_ms: u64,
    /// Whether the strategy produced its success result.
    pub succeeded: bool,
    /// Error message when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Responses, positioned per strategy:
    /// one slot per request for `all`/`some`, one slot otherwise.
    /// A slot is `null` where no response is available.
    pub responses: Vec<Option<ResponseSummary>>,
}

impl Report {
    /// A successful report.
    pub fn success(
        strategy: StrategyKind,
        started_at: Timestamp,
        elapsed_ms: u64,
        responses: Vec<Option<ResponseSummary>>,
    ) -> Self {
        Self {
            strategy,
            started_at,
            elapsed_ms,
            succeeded: true,
            error: None,
            responses,
        }
    }

    /// A failed report; `responses` holds any response that came with the failure.
    pub fn failure(
        strategy: StrategyKind,
        started_at: Timestamp,
        elapsed_ms: u64,
        error: String,
        responses: Vec<Option<ResponseSummary>>,
    ) -> Self {
        Self {
            strategy,
            started_at,
            elapsed_ms,
            succeeded: false,
            error: Some(error),
            responses,
        }
    }
}
