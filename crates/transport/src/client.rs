//! The `reqwest`-backed [`Client`] implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqstrategy::{CallContext, Client, Error};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{HttpError, HttpRequest, HttpResponse};

/// Settings for the underlying `reqwest` client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Value of the `user-agent` header.
    pub user_agent: String,
    /// Maximum time to establish a connection, in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Headers added to every request unless the request sets them itself.
    pub default_headers: BTreeMap<String, String>,
    /// Largest response body that will be buffered; unlimited when unset.
    pub max_body_bytes: Option<usize>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("reqstrategy/", env!("CARGO_PKG_VERSION")).to_owned(),
            connect_timeout_ms: None,
            default_headers: BTreeMap::new(),
            max_body_bytes: None,
        }
    }
}

/// HTTP client that honours each request's [`CallContext`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    max_body_bytes: Option<usize>,
}

impl HttpClient {
    /// Builds a client from `config`.
    pub fn new(config: &HttpClientConfig) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.insert(header_name, header_value);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);
        if let Some(ms) = config.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        let inner = builder.build().map_err(|source| HttpError::Build { source })?;
        Ok(Self {
            inner,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Wraps an existing `reqwest` client. Response bodies are not size-limited.
    pub fn from_reqwest(inner: reqwest::Client) -> Self {
        Self {
            inner,
            max_body_bytes: None,
        }
    }

    /// Sends `request` and buffers the response.
    ///
    /// Any status is a successful send; judging the status is the validators'
    /// job.
    #[instrument(
        level = "debug",
        skip_all,
        fields(method = %request.method, url = %request.url)
    )]
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self
            .inner
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|source| HttpError::Send {
            method: request.method.to_string(),
            url: request.url.to_string(),
            source,
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = self.read_body(request, response).await?;

        debug!(status = status.as_u16(), bytes = body.len(), "response received");
        Ok(HttpResponse {
            method: request.method.clone(),
            url: request.url.clone(),
            status,
            headers,
            body,
        })
    }

    async fn read_body(&self, request: &HttpRequest, mut response: reqwest::Response) -> Result<Vec<u8>, HttpError> {
        let unreadable = |source| HttpError::Body {
            method: request.method.to_string(),
            url: request.url.to_string(),
            source,
        };
        let Some(limit) = self.max_body_bytes else {
            let body = response.bytes().await.map_err(unreadable)?;
            return Ok(body.to_vec());
        };

        let too_large = || HttpError::BodyTooLarge {
            method: request.method.to_string(),
            url: request.url.to_string(),
            limit,
        };
        let declared = response.content_length().unwrap_or(0);
        if declared > u64::try_from(limit).unwrap_or(u64::MAX) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(unreadable)? {
            if body.len().saturating_add(chunk.len()) > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl Client for HttpClient {
    type Request = HttpRequest;
    type Response = HttpResponse;

    async fn call(&self, request: &HttpRequest, ctx: &CallContext) -> Result<HttpResponse, Error> {
        if let Some(cause) = ctx.err() {
            return Err(cause);
        }
        tokio::select! {
            biased;
            cause = ctx.done() => {
                debug!(method = %request.method, url = %request.url, error = %cause, "call abandoned by context");
                Err(cause)
            }
            result = self.send(request) => result.map_err(Error::transport),
        }
    }
}
