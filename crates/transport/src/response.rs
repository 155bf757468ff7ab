//! Buffered HTTP responses.

use reqstrategy::HasStatus;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::HttpError;

/// A fully received HTTP response.
///
/// The body is read eagerly so validators can inspect it and so a rejected
/// response can still be examined by the caller.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl HttpResponse {
    /// Method of the request that produced this response.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL of the request that produced this response.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Response status.
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str, HttpError> {
        std::str::from_utf8(&self.body).map_err(|source| HttpError::NotText { source })
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|source| HttpError::Decode { source })
    }
}

impl HasStatus for HttpResponse {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }
}
