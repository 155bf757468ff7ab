//! Error types shared by every coordination strategy.
//!
//! [`Error`] classifies why a call or a group of calls did not produce an
//! accepted response. [`CallFailure`] pairs an [`Error`] with the response
//! that triggered it, when there is one, so callers can still inspect a
//! rejected response (e.g. the body of a non-2xx reply).

use std::fmt;

use thiserror::Error;

/// Boxed error used for transport and validator failures.
///
/// Transport and validator errors are supplied by external collaborators, so
/// their concrete types are unknown to this crate. Callers recover them with
/// [`Error::downcast_ref`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Why a call, or a whole group of calls, failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The client failed to produce a response at all.
    ///
    /// The client's error is propagated verbatim; it is never wrapped in a
    /// message of our own.
    #[error(transparent)]
    Transport(BoxError),

    /// A validator rejected an otherwise successful response.
    ///
    /// The rejected response travels next to this error in [`CallFailure`].
    #[error(transparent)]
    Rejected(BoxError),

    /// Every call in a race or best-effort gather failed.
    ///
    /// Individual causes are intentionally not retained.
    #[error("all requests failed")]
    AllFailed,

    /// The request's context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The request's deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// A concurrent call ended without reporting a result (its task panicked
    /// or was torn down with the runtime).
    #[error("call abandoned before reporting a result")]
    Abandoned,
}

impl Error {
    /// Wraps a client-side failure as [`Error::Transport`].
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Wraps a validator failure as [`Error::Rejected`].
    pub fn rejected(err: impl Into<BoxError>) -> Self {
        Self::Rejected(err.into())
    }

    /// Returns `true` for [`Error::Cancelled`] and [`Error::DeadlineExceeded`].
    ///
    /// Lets callers tell "gave up waiting" apart from "the server rejected it".
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns the wrapped transport or validator error as `T`, if it is one.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: std::error::Error + 'static,
    {
        match self {
            Self::Transport(inner) | Self::Rejected(inner) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Failure of a single call
// ---------------------------------------------------------------------------

/// The failed outcome of one validated call.
///
/// `response` is present when the client produced a response that a
/// validator then rejected; it is absent for transport failures and
/// cancellations.
pub struct CallFailure<S> {
    response: Option<S>,
    error: Error,
}

impl<S> CallFailure<S> {
    /// Creates a failure that carries the rejected response.
    pub fn with_response(response: S, error: Error) -> Self {
        Self {
            response: Some(response),
            error,
        }
    }

    /// Returns the error classification.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Returns the rejected response, if the client produced one.
    pub fn response(&self) -> Option<&S> {
        self.response.as_ref()
    }

    /// Discards the response and returns the error.
    pub fn into_error(self) -> Error {
        self.error
    }

    /// Splits the failure into its response and error.
    pub fn into_parts(self) -> (Option<S>, Error) {
        (self.response, self.error)
    }
}

impl<S> From<Error> for CallFailure<S> {
    fn from(error: Error) -> Self {
        Self {
            response: None,
            error,
        }
    }
}

impl<S> fmt::Debug for CallFailure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallFailure")
            .field("has_response", &self.response.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl<S> fmt::Display for CallFailure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<S> std::error::Error for CallFailure<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Reset;

    #[test]
    fn test_transport_error_is_displayed_verbatim() {
        let err = Error::transport(Reset);
        assert_eq!(err.to_string(), "connection reset");
        assert!(err.downcast_ref::<Reset>().is_some());
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(Error::DeadlineExceeded.is_cancellation());
        assert!(!Error::AllFailed.is_cancellation());
        assert_eq!(Error::AllFailed.to_string(), "all requests failed");
    }

    #[test]
    fn test_call_failure_keeps_response() {
        let failure = CallFailure::with_response(404_u16, Error::rejected("not found"));
        assert_eq!(failure.response(), Some(&404));
        assert_eq!(failure.to_string(), "not found");

        let (response, error) = failure.into_parts();
        assert_eq!(response, Some(404));
        assert!(matches!(error, Error::Rejected(_)));
    }

    #[test]
    fn test_call_failure_from_error_has_no_response() {
        let failure: CallFailure<u16> = Error::Cancelled.into();
        assert!(failure.response().is_none());
        assert!(failure.into_error().is_cancellation());
    }
}
