//! Sequential retry over caller-supplied wait intervals.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::{execute, CallFailure, Client, InvocationId, Request};

/// Re-attempts `request` until it is accepted or `intervals` run out.
///
/// The first attempt happens immediately. After each failed attempt the next
/// interval is taken from the front of `intervals` and waited out before the
/// following attempt, so the shape of the sequence is the back-off policy:
/// `[1s, 1s, 1s]` retries three times at a fixed pace, `[1s, 2s, 4s]` backs
/// off exponentially (see [`crate::Backoff`] for builders).
///
/// - When no interval is left, the last attempt's response and error are
///   returned. With an empty sequence this is exactly one [`execute`].
/// - If the request's context is done during a wait, its
///   [`Error::Cancelled`](crate::Error::Cancelled) or
///   [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded) is returned
///   with no response. A deadline on the request therefore bounds the whole
///   chain, not each attempt.
#[instrument(name = "retry", skip_all, fields(invocation = %InvocationId::new_random()))]
pub async fn retry<C, I>(
    client: &C,
    request: &Request<C::Request, C::Response>,
    intervals: I,
) -> Result<C::Response, CallFailure<C::Response>>
where
    C: Client + ?Sized,
    I: IntoIterator<Item = Duration>,
{
    let ctx = request.context();
    let mut intervals = intervals.into_iter();
    let mut attempt: u32 = 1;

    loop {
        let failure = match execute(client, request).await {
            Ok(response) => {
                debug!(attempt, "attempt accepted");
                return Ok(response);
            }
            Err(failure) => failure,
        };

        let Some(wait) = intervals.next() else {
            debug!(attempt, error = %failure, "no intervals left, giving up");
            return Err(failure);
        };

        debug!(
            attempt,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            error = %failure,
            "attempt failed, waiting before retry"
        );
        tokio::select! {
            biased;
            cause = ctx.done() => {
                debug!(attempt, error = %cause, "context done while waiting to retry");
                return Err(cause.into());
            }
            () = tokio::time::sleep(wait) => {}
        }
        attempt = attempt.saturating_add(1);
    }
}
