//! Coordination strategies for outbound client calls.
//!
//! This crate does not perform I/O itself. Callers bring a [`Client`] (see
//! the `transport` crate for one over `reqwest`) and describe what counts as
//! a good response by attaching validators to a [`Request`]:
//!
//! ```ignore
//! let request = Request::new(HttpRequest::get("http://localhost/")?)
//!     .require_status([200, 404]);
//! ```
//!
//! then pick how to invoke it:
//!
//! | Function | Behaviour |
//! |----------|-----------|
//! | [`execute`] | one call, then validation |
//! | [`race`] | concurrent calls, first accepted response wins |
//! | [`all`] | concurrent calls, every response or the first failure |
//! | [`some`] | concurrent calls, whatever succeeded |
//! | [`retry`] | sequential attempts separated by caller-supplied intervals |
//!
//! Cancellation and deadlines travel with each request in its [`CallContext`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`client`] | The [`Client`] port and the [`Target`]/[`HasStatus`] accessors |
//! | [`context`] | [`CallContext`] cancellation and deadline signal |
//! | [`request`] | [`Request`], [`Validator`], [`UnexpectedStatus`] |
//! | [`call`] | [`execute`], the validated call |
//! | [`strategies`] | [`race`], [`all`], [`some`] |
//! | [`retry`](mod@retry) | [`retry`](fn@retry) |
//! | [`backoff`] | [`Backoff`] interval schedules |
//! | [`errors`] | [`Error`], [`CallFailure`] |
//! | [`identifiers`] | [`InvocationId`] |

pub mod backoff;
pub mod call;
pub mod client;
pub mod context;
pub mod errors;
mod fanout;
pub mod identifiers;
pub mod request;
pub mod retry;
pub mod strategies;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use backoff::Backoff;
pub use call::execute;
pub use client::{Client, HasStatus, Target};
pub use context::CallContext;
pub use errors::{BoxError, CallFailure, Error};
pub use identifiers::InvocationId;
pub use request::{Request, UnexpectedStatus, Validator};
pub use retry::retry;
pub use strategies::{all, race, some};
