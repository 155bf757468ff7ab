//! Errors raised while building, sending, or decoding HTTP calls.
//!
//! [`HttpError::Send`], [`HttpError::Body`], and [`HttpError::BodyTooLarge`] are what the client reports as
//! [`reqstrategy::Error::Transport`]; callers recover them with
//! [`reqstrategy::Error::downcast_ref`].

use thiserror::Error;

/// HTTP adapter failures.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL text.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A header name or value was not valid HTTP.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The header name as supplied.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The underlying `reqwest` client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Build {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be sent or no response arrived.
    #[error("{method} {url}: {source}")]
    Send {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// Connection, TLS, or protocol failure.
        #[source]
        source: reqwest::Error,
    },

    /// The response arrived but its body could not be read.
    #[error("{method} {url}: failed to read response body: {source}")]
    Body {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// Read failure.
        #[source]
        source: reqwest::Error,
    },

    /// The response body is larger than the configured limit.
    #[error("{method} {url}: response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// A JSON request body could not be encoded.
    #[error("failed to encode request body: {source}")]
    Encode {
        /// Serialisation failure.
        #[source]
        source: serde_json::Error,
    },

    /// A response body was not the expected JSON.
    #[error("failed to decode response body: {source}")]
    Decode {
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },

    /// A response body was not UTF-8 text.
    #[error("response body is not valid UTF-8: {source}")]
    NotText {
        /// Decoding failure.
        #[source]
        source: std::str::Utf8Error,
    },
}
