//! The validated call every strategy builds on.

use tracing::{debug, trace};

use crate::{CallFailure, Client, Request};

/// Performs `request` through `client`, then runs its validators.
///
/// - A transport failure is returned as-is and no validator runs.
/// - The first validator rejection stops validation; the rejected response
///   is kept in the returned [`CallFailure`].
/// - If every validator accepts, the response is returned.
///
/// Apart from validation this is the same as calling [`Client::call`] with
/// the request's own context.
pub async fn execute<C>(
    client: &C,
    request: &Request<C::Request, C::Response>,
) -> Result<C::Response, CallFailure<C::Response>>
where
    C: Client + ?Sized,
{
    let response = client
        .call(request.inner(), request.context())
        .await
        .map_err(|err| {
            debug!(error = %err, "call failed before validation");
            CallFailure::from(err)
        })?;

    if let Err(err) = request.validate(&response) {
        debug!(error = %err, "response rejected");
        return Err(CallFailure::with_response(response, err));
    }

    trace!(validators = request.validators().len(), "response accepted");
    Ok(response)
}
