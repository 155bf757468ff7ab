//! Fan-out/fan-in execution shared by `race`, `all`, and `some`.
//!
//! [`FanOut::start`] spawns one task per request. Each task derives a
//! cancellable context from its request's own context, performs the validated
//! call with it, and reports exactly one [`Completion`] tagged with the
//! request's position. Completions arrive in completion order through a
//! channel sized to the number of requests, so reporting never blocks.
//!
//! Dropping the [`FanOut`] fires the shared stop signal. Every task still in
//! flight then cancels its derived context and waits for the client to wind
//! the call down; tasks that already finished are unaffected.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug_span, trace, Instrument};

use crate::{execute, CallFailure, Client, Error, Request};

/// The outcome of one fanned-out call.
pub(crate) struct Completion<S> {
    /// Position of the request in the caller's input, in `[0, N)`.
    pub(crate) order: usize,
    pub(crate) outcome: Result<S, CallFailure<S>>,
}

/// Receiving end of a running fan-out.
pub(crate) struct FanOut<S> {
    results: mpsc::Receiver<Completion<S>>,
    expected: usize,
    received: usize,
    stop: CancellationToken,
}

impl<S: Send + 'static> FanOut<S> {
    /// Starts one concurrent call per request.
    pub(crate) fn start<C>(client: &Arc<C>, requests: Vec<Request<C::Request, S>>) -> Self
    where
        C: Client<Response = S> + ?Sized + 'static,
    {
        let expected = requests.len();
        let (tx, results) = mpsc::channel(expected.max(1));
        let stop = CancellationToken::new();

        for (order, request) in requests.into_iter().enumerate() {
            let reporter = Reporter {
                order,
                tx: Some(tx.clone()),
            };
            let unit = run_call(Arc::clone(client), request, stop.clone(), reporter);
            tokio::spawn(unit.instrument(debug_span!("call", order)));
        }

        Self {
            results,
            expected,
            received: 0,
            stop,
        }
    }
}

impl<S> FanOut<S> {
    /// Returns the next completion, or `None` once all of them were received.
    pub(crate) async fn next(&mut self) -> Option<Completion<S>> {
        if self.received == self.expected {
            return None;
        }
        let completion = self.results.recv().await?;
        self.received += 1;
        Some(completion)
    }
}

impl<S> Drop for FanOut<S> {
    fn drop(&mut self) {
        trace!(pending = self.expected - self.received, "stop signalled");
        self.stop.cancel();
    }
}

async fn run_call<C>(
    client: Arc<C>,
    request: Request<C::Request, C::Response>,
    stop: CancellationToken,
    mut reporter: Reporter<C::Response>,
) where
    C: Client + ?Sized,
{
    let ctx = request.context().child();
    let request = request.with_context(ctx.clone());

    let call = execute(client.as_ref(), &request);
    tokio::pin!(call);

    // A call that completes before stop fires keeps its own outcome.
    let outcome = tokio::select! {
        biased;
        outcome = &mut call => outcome,
        _ = stop.cancelled() => {
            trace!("stop received, cancelling in-flight call");
            ctx.cancel();
            call.await
        }
    };
    reporter.report(outcome);
}

/// Sends a task's single completion.
///
/// If the task unwinds before reporting, the drop reports
/// [`Error::Abandoned`] instead so the receiver still gets one completion
/// per request.
struct Reporter<S> {
    order: usize,
    tx: Option<mpsc::Sender<Completion<S>>>,
}

impl<S> Reporter<S> {
    fn report(&mut self, outcome: Result<S, CallFailure<S>>) {
        if let Some(tx) = self.tx.take() {
            // Capacity equals the number of requests, so only a closed
            // receiver can fail this; the strategy has decided already.
            let _ = tx.try_send(Completion {
                order: self.order,
                outcome,
            });
        }
    }
}

impl<S> Drop for Reporter<S> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.report(Err(Error::Abandoned.into()));
        }
    }
}
