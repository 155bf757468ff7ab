//! The client port.
//!
//! Infrastructure crates implement [`Client`] for a concrete transport; the
//! strategies in this crate only ever see the trait.

use async_trait::async_trait;

use crate::{CallContext, Error};

/// Performs one outbound call.
///
/// Implementations must be safe for concurrent use: `race`, `all`, and `some`
/// invoke [`Client::call`] from several tasks at once. They should also honour
/// `ctx` and return [`CallContext::done`]'s error once it fires; cancellation
/// is cooperative and the strategies rely on it to wind down in-flight calls.
#[async_trait]
pub trait Client: Send + Sync {
    /// The call description this client accepts.
    type Request: Send + Sync + 'static;

    /// The value produced for a completed call.
    type Response: Send + 'static;

    /// Performs `request`, returning the response or why none was produced.
    ///
    /// Transport failures should be wrapped with [`Error::transport`].
    async fn call(&self, request: &Self::Request, ctx: &CallContext) -> Result<Self::Response, Error>;
}

/// Method and target of a request, used to describe it in validation errors.
pub trait Target {
    /// Request method, e.g. `"GET"`.
    fn method(&self) -> &str;

    /// Target URL.
    fn url(&self) -> &str;
}

/// Exposes the status code of a response.
pub trait HasStatus {
    /// Numeric status code, e.g. `200`.
    fn status(&self) -> u16;
}
