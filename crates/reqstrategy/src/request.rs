//! Requests with attached validators.
//!
//! A [`Request`] bundles the caller's call description with an ordered list of
//! [`Validator`]s and a [`CallContext`]. Attaching a validator never mutates
//! the request in place; it returns a new value that shares the same call
//! description, so one base request can be forked into several differently
//! validated variants.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::{BoxError, CallContext, Error, HasStatus, Target};

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

type ValidateFn<S> = dyn Fn(&S) -> Result<(), BoxError> + Send + Sync;

/// Accepts or rejects a response.
///
/// `Ok(())` means accepted; an error rejects the response and becomes the
/// [`Error::Rejected`] payload.
pub struct Validator<S>(Arc<ValidateFn<S>>);

impl<S> Validator<S> {
    /// Wraps a validation function.
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(&S) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(validate))
    }

    /// Runs the validator against `response`.
    pub fn validate(&self, response: &S) -> Result<(), BoxError> {
        (self.0)(response)
    }
}

impl<S> Clone for Validator<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S> fmt::Debug for Validator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

/// A response status outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} {url}: expected response status {expected:?}, got {actual}")]
pub struct UnexpectedStatus {
    /// Request method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Accepted status codes, in the order they were listed.
    pub expected: Vec<u16>,
    /// Status the response actually carried.
    pub actual: u16,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A call description plus its validators and context.
///
/// `R` is the client's request type and `S` its response type. Cloning is
/// cheap and does not require `R: Clone`.
pub struct Request<R, S> {
    inner: Arc<R>,
    validators: Vec<Validator<S>>,
    context: CallContext,
}

impl<R, S> Request<R, S> {
    /// Wraps `inner` with no validators and a fresh context.
    pub fn new(inner: R) -> Self {
        Self {
            inner: Arc::new(inner),
            validators: Vec::new(),
            context: CallContext::new(),
        }
    }

    /// Returns the call description.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns the request's context.
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Returns the attached validators in attachment order.
    pub fn validators(&self) -> &[Validator<S>] {
        &self.validators
    }

    /// Returns a copy of this request that uses `context`.
    #[must_use]
    pub fn with_context(&self, context: CallContext) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            validators: self.validators.clone(),
            context,
        }
    }

    /// Returns a copy of this request with `validate` appended to its
    /// validators. `self` is left unchanged.
    #[must_use]
    pub fn with_validator<F>(&self, validate: F) -> Self
    where
        F: Fn(&S) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let mut validators = Vec::with_capacity(self.validators.len() + 1);
        validators.extend(self.validators.iter().cloned());
        validators.push(Validator::new(validate));
        Self {
            inner: Arc::clone(&self.inner),
            validators,
            context: self.context.clone(),
        }
    }

    /// Runs every validator in order, stopping at the first rejection.
    pub(crate) fn validate(&self, response: &S) -> Result<(), Error> {
        for validator in &self.validators {
            validator.validate(response).map_err(Error::Rejected)?;
        }
        Ok(())
    }
}

impl<R, S> Request<R, S>
where
    R: Target + 'static,
    S: HasStatus + 'static,
{
    /// Returns a copy of this request that only accepts responses whose
    /// status is one of `codes`.
    ///
    /// Rejections carry an [`UnexpectedStatus`] naming the method, URL,
    /// accepted set, and actual status.
    #[must_use]
    pub fn require_status(&self, codes: impl IntoIterator<Item = u16>) -> Self {
        let expected: Vec<u16> = codes.into_iter().collect();
        let method = self.inner.method().to_owned();
        let url = self.inner.url().to_owned();
        self.with_validator(move |response: &S| {
            let actual = response.status();
            if expected.contains(&actual) {
                return Ok(());
            }
            Err(UnexpectedStatus {
                method: method.clone(),
                url: url.clone(),
                expected: expected.clone(),
                actual,
            }
            .into())
        })
    }
}

impl<R, S> Clone for Request<R, S> {
    fn clone(&self) -> Self {
        self.with_context(self.context.clone())
    }
}

impl<R: fmt::Debug, S> fmt::Debug for Request<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("inner", &self.inner)
            .field("validators", &self.validators.len())
            .field("context", &self.context)
            .finish()
    }
}

impl<R, S> From<R> for Request<R, S> {
    fn from(inner: R) -> Self {
        Self::new(inner)
    }
}
