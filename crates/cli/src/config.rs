//! Execution plans.
//!
//! A [`Plan`] says which strategy to run over which requests, and with what
//! schedule and timeout. Plans come either from the command line or from a
//! JSON file:
//!
//! ```json
//! {
//!   "strategy": "retry",
//!   "requests": [{ "url": "http://localhost:8080/health", "status": [200] }],
//!   "backoff": { "kind": "exponential", "initial_ms": 100, "factor": 2, "retries": 4 },
//!   "timeout_ms": 5000
//! }
//! ```
//!
//! [`Plan::validate`] rejects inconsistent plans before any request is sent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqstrategy::{Backoff, CallContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use transport::{HttpClientConfig, HttpError, HttpRequest, Method, ValidatedRequest};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Problems with a plan, detected before anything is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The plan file could not be read.
    #[error("failed to read plan '{}': {source}", path.display())]
    Read {
        /// Plan file path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The plan file is not a valid plan.
    #[error("failed to parse plan '{}': {source}", path.display())]
    Parse {
        /// Plan file path.
        path: PathBuf,
        /// JSON failure.
        #[source]
        source: serde_json::Error,
    },

    /// The plan lists no requests.
    #[error("plan has no requests")]
    NoRequests,

    /// `do` and `retry` take exactly one request.
    #[error("strategy '{strategy}' takes exactly one request, got {count}")]
    NotSingleRequest {
        /// The offending strategy.
        strategy: StrategyKind,
        /// Number of requests in the plan.
        count: usize,
    },

    /// Both `intervals_ms` and `backoff` were given.
    #[error("plan sets both 'intervals_ms' and 'backoff'; pick one")]
    ConflictingSchedule,

    /// A retry schedule was given for a strategy that never retries.
    #[error("strategy '{0}' does not retry; remove 'intervals_ms'/'backoff'")]
    UnusedSchedule(StrategyKind),

    /// A request could not be built.
    #[error("request #{index}: {source}")]
    InvalidRequest {
        /// Position of the request in the plan.
        index: usize,
        /// Why it could not be built.
        #[source]
        source: HttpError,
    },

    /// A request method is not a valid HTTP method token.
    #[error("request #{index}: invalid method '{method}'")]
    InvalidMethod {
        /// Position of the request in the plan.
        index: usize,
        /// The rejected method.
        method: String,
    },
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Which coordination strategy a plan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// One validated call.
    Do,
    /// First accepted response wins.
    Race,
    /// Every response, or the first failure.
    All,
    /// Whatever succeeded.
    Some,
    /// One request, re-attempted over a schedule.
    Retry,
}

impl StrategyKind {
    fn takes_single_request(self) -> bool {
        matches!(self, Self::Do | Self::Retry)
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Do => "do",
            Self::Race => "race",
            Self::All => "all",
            Self::Some => "some",
            Self::Retry => "retry",
        };
        f.write_str(name)
    }
}

/// One request in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSpec {
    /// HTTP method; `GET` when omitted.
    #[serde(default = "default_method")]
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Extra headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Raw request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Accepted status codes; any status is accepted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<u16>,
}

fn default_method() -> String {
    "GET".to_owned()
}

impl RequestSpec {
    /// A request with the default method and no headers, body, or status rule.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: default_method(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            status: Vec::new(),
        }
    }

    fn build(&self, index: usize, ctx: &CallContext) -> Result<ValidatedRequest, ConfigError> {
        let method = self
            .method
            .to_ascii_uppercase()
            .parse::<Method>()
            .map_err(|_| ConfigError::InvalidMethod {
                index,
                method: self.method.clone(),
            })?;
        let invalid = |source| ConfigError::InvalidRequest { index, source };

        let mut request = HttpRequest::new(method, &self.url).map_err(invalid)?;
        for (name, value) in &self.headers {
            request = request.with_header(name, value).map_err(invalid)?;
        }
        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }

        let mut validated = request.validated().with_context(ctx.clone());
        if !self.status.is_empty() {
            validated = validated.require_status(self.status.iter().copied());
        }
        Ok(validated)
    }
}

/// A complete description of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    /// Strategy to run.
    pub strategy: StrategyKind,
    /// Requests, in the order results are reported.
    pub requests: Vec<RequestSpec>,
    /// Explicit retry intervals in milliseconds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intervals_ms: Vec<u64>,
    /// Generated retry schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Backoff>,
    /// Deadline for the whole invocation, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// HTTP client settings.
    #[serde(default)]
    pub client: HttpClientConfig,
}

impl Plan {
    /// A plan with no schedule, no timeout, and default client settings.
    pub fn new(strategy: StrategyKind, requests: Vec<RequestSpec>) -> Self {
        Self {
            strategy,
            requests,
            intervals_ms: Vec::new(),
            backoff: None,
            timeout_ms: None,
            client: HttpClientConfig::default(),
        }
    }

    /// Reads a plan from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Checks that the plan is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests.is_empty() {
            return Err(ConfigError::NoRequests);
        }
        if self.strategy.takes_single_request() && self.requests.len() != 1 {
            return Err(ConfigError::NotSingleRequest {
                strategy: self.strategy,
                count: self.requests.len(),
            });
        }

        let has_schedule = !self.intervals_ms.is_empty() || self.backoff.is_some();
        if !self.intervals_ms.is_empty() && self.backoff.is_some() {
            return Err(ConfigError::ConflictingSchedule);
        }
        if has_schedule && self.strategy != StrategyKind::Retry {
            return Err(ConfigError::UnusedSchedule(self.strategy));
        }
        Ok(())
    }

    /// The retry intervals this plan asks for.
    pub fn intervals(&self) -> Vec<Duration> {
        match &self.backoff {
            Some(backoff) => backoff.intervals(),
            None => self
                .intervals_ms
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect(),
        }
    }

    /// Builds the requests, all sharing one context.
    ///
    /// The timeout, if any, starts counting now, so build right before running.
    pub fn build_requests(&self) -> Result<Vec<ValidatedRequest>, ConfigError> {
        let mut ctx = CallContext::new();
        if let Some(ms) = self.timeout_ms {
            ctx = ctx.with_timeout(Duration::from_millis(ms));
        }
        self.requests
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.build(index, &ctx))
            .collect()
    }
}
