//! Outbound HTTP call descriptions.

use reqstrategy::Target;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::{HttpError, HttpResponse};

/// A request ready to be validated and coordinated by `reqstrategy`.
pub type ValidatedRequest = reqstrategy::Request<HttpRequest, HttpResponse>;

/// Everything needed to send one HTTP request.
///
/// Unlike [`reqwest::Request`] this is a plain value: the body is buffered so
/// the same description can be sent again by `retry` or fanned out as-is.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: &str) -> Result<Self, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Creates a `GET` request.
    pub fn get(url: &str) -> Result<Self, HttpError> {
        Self::new(Method::GET, url)
    }

    /// Creates a `POST` request.
    pub fn post(url: &str) -> Result<Self, HttpError> {
        Self::new(Method::POST, url)
    }

    /// Adds a header, replacing any earlier value for the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sets a raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and the matching `content-type` header.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_vec(value).map_err(|source| HttpError::Encode { source })?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body);
        Ok(self)
    }

    /// Returns the headers that will be sent.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body, if one is set.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Wraps this request for use with the `reqstrategy` strategies.
    pub fn validated(self) -> ValidatedRequest {
        ValidatedRequest::new(self)
    }
}

impl Target for HttpRequest {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_normalised() {
        let request = HttpRequest::get("http://localhost").unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.url(), "http://localhost/");
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let err = HttpRequest::get("not a url").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
        assert!(err.to_string().starts_with("invalid URL 'not a url'"));
    }

    #[test]
    fn test_invalid_header_is_reported() {
        let err = HttpRequest::get("http://localhost/")
            .unwrap()
            .with_header("bad header", "x")
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader { ref name, .. } if name == "bad header"));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = HttpRequest::post("http://localhost/items")
            .unwrap()
            .with_json(&serde_json::json!({"name": "widget"}))
            .unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(request.body(), Some(br#"{"name":"widget"}"#.as_slice()));
    }

    #[test]
    fn test_validated_request_can_require_status() {
        let request = HttpRequest::get("http://localhost/").unwrap().validated().require_status([200]);
        assert_eq!(request.validators().len(), 1);
    }
}
