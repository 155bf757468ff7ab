//! HTTP client adapter for `reqstrategy`.
//!
//! Implements the [`reqstrategy::Client`] trait over `reqwest`. Responses are
//! buffered into [`HttpResponse`] values that implement
//! [`reqstrategy::HasStatus`], and [`HttpRequest`] implements
//! [`reqstrategy::Target`], so `require_status` works with no extra glue:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! use std::sync::Arc;
//! use transport::{HttpClient, HttpClientConfig, HttpRequest};
//!
//! let client = Arc::new(HttpClient::new(&HttpClientConfig::default())?);
//! let primary = HttpRequest::get("https://primary.example/health")?.validated().require_status([200]);
//! let mirror = HttpRequest::get("https://mirror.example/health")?.validated().require_status([200]);
//! let fastest = reqstrategy::race(&client, [primary, mirror]).await?;
//! println!("{}", fastest.url());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection handling, request encoding, and body
//! buffering live here. The strategies in `reqstrategy` see only the
//! [`reqstrategy::Client`] trait.
//!
//! ## Cancellation
//!
//! Every call races the send against [`reqstrategy::CallContext::done`]; when
//! the context fires first the in-flight request is dropped and the context's
//! error is returned.

pub mod client;
pub mod errors;
pub mod request;
pub mod response;

pub use client::{HttpClient, HttpClientConfig};
pub use errors::HttpError;
pub use request::{HttpRequest, ValidatedRequest};
pub use response::HttpResponse;
pub use reqwest::Method;
