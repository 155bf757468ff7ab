//! Concurrent strategies: `race`, `all`, and `some`.
//!
//! All three start every request at once (see [`crate::fanout`]) and differ
//! only in how they consume completions and when they stop the rest:
//!
//! | Strategy | Stops on | Returns |
//! |----------|----------|---------|
//! | [`race`] | first accepted response | that response, or [`Error::AllFailed`] |
//! | [`all`]  | first failure | that failure, or every response in request order |
//! | [`some`] | never (drains all) | `Some`/`None` per request, or [`Error::AllFailed`] |
//!
//! Once a strategy returns, every call still in flight is cancelled through
//! its context.

use std::sync::Arc;

use tracing::{debug, field, instrument, trace, Span};

use crate::fanout::FanOut;
use crate::{Client, Error, InvocationId, Request};

/// Runs `requests` concurrently and returns the first accepted response.
///
/// Failed and rejected calls are skipped. If none is accepted the result is
/// [`Error::AllFailed`], never one particular call's error. When two calls
/// succeed at practically the same moment, which one wins depends on the
/// runtime's scheduling and is not deterministic.
///
/// An empty `requests` yields [`Error::AllFailed`].
#[instrument(
    name = "race",
    skip_all,
    fields(invocation = %InvocationId::new_random(), requests = field::Empty)
)]
pub async fn race<C, I>(client: &Arc<C>, requests: I) -> Result<C::Response, Error>
where
    C: Client + ?Sized + 'static,
    I: IntoIterator<Item = Request<C::Request, C::Response>>,
{
    let requests: Vec<_> = requests.into_iter().collect();
    Span::current().record("requests", requests.len());

    let mut fan_out = FanOut::start(client, requests);
    while let Some(completion) = fan_out.next().await {
        match completion.outcome {
            Ok(response) => {
                debug!(order = completion.order, "race won");
                return Ok(response);
            }
            Err(failure) => {
                trace!(order = completion.order, error = %failure, "race entrant failed");
            }
        }
    }

    debug!("every race entrant failed");
    Err(Error::AllFailed)
}

/// Runs `requests` concurrently and returns every response in request order.
///
/// The first failure, transport error or rejection alike, is returned on its
/// own and the remaining calls are cancelled; no partial results are kept.
///
/// An empty `requests` yields an empty vector.
#[instrument(
    name = "all",
    skip_all,
    fields(invocation = %InvocationId::new_random(), requests = field::Empty)
)]
pub async fn all<C, I>(client: &Arc<C>, requests: I) -> Result<Vec<C::Response>, Error>
where
    C: Client + ?Sized + 'static,
    I: IntoIterator<Item = Request<C::Request, C::Response>>,
{
    let requests: Vec<_> = requests.into_iter().collect();
    Span::current().record("requests", requests.len());

    let mut responses = empty_slots(requests.len());
    let mut fan_out = FanOut::start(client, requests);
    while let Some(completion) = fan_out.next().await {
        match completion.outcome {
            Ok(response) => responses[completion.order] = Some(response),
            Err(failure) => {
                debug!(order = completion.order, error = %failure, "all failed on first error");
                return Err(failure.into_error());
            }
        }
    }

    responses
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(Error::Abandoned)
}

/// Runs `requests` concurrently and waits for all of them.
///
/// Slot `i` of the result holds request `i`'s response if it was accepted and
/// `None` otherwise. A partial success is not an error; only when no request
/// succeeded is [`Error::AllFailed`] returned. An empty `requests` has no
/// successes and therefore also yields [`Error::AllFailed`].
#[instrument(
    name = "some",
    skip_all,
    fields(invocation = %InvocationId::new_random(), requests = field::Empty)
)]
pub async fn some<C, I>(client: &Arc<C>, requests: I) -> Result<Vec<Option<C::Response>>, Error>
where
    C: Client + ?Sized + 'static,
    I: IntoIterator<Item = Request<C::Request, C::Response>>,
{
    let requests: Vec<_> = requests.into_iter().collect();
    Span::current().record("requests", requests.len());

    let mut responses = empty_slots(requests.len());
    let mut successful = 0_usize;
    let mut fan_out = FanOut::start(client, requests);
    while let Some(completion) = fan_out.next().await {
        match completion.outcome {
            Ok(response) => {
                responses[completion.order] = Some(response);
                successful += 1;
            }
            Err(failure) => {
                trace!(order = completion.order, error = %failure, "call failed");
            }
        }
    }

    if successful == 0 {
        debug!("no call succeeded");
        return Err(Error::AllFailed);
    }
    debug!(successful, "some finished");
    Ok(responses)
}

fn empty_slots<S>(len: usize) -> Vec<Option<S>> {
    std::iter::repeat_with(|| None).take(len).collect()
}
