//! Cancellation and deadline context carried by every request.
//!
//! A [`CallContext`] is the request-scoped signal a client must honour: it is
//! done once its cancellation token fires or its deadline passes, whichever
//! comes first. Contexts form a tree; a context derived with
//! [`CallContext::child`] is cancelled whenever its parent is, but cancelling
//! the child leaves the parent untouched.

use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::Error;

/// Cancellation signal plus optional deadline for one request.
///
/// Cloning shares the same signal: cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Creates a context that is never done unless cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context driven by an existing cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Returns this context with `deadline` applied.
    ///
    /// If a deadline is already set, the earlier of the two is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns this context with a deadline `timeout` from now.
    ///
    /// A timeout too large to represent as an instant sets no deadline; any
    /// existing deadline is kept.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Derives a context that is cancelled with this one and can also be
    /// cancelled on its own. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `true` once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Returns why the context is done, or `None` while it is still live.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Waits until the context is done and returns the reason.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Error::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Error::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Error::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reports_deadline_exceeded() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(50));
        assert!(ctx.err().is_none());

        let cause = ctx.done().await;
        assert!(matches!(cause, Error::DeadlineExceeded));
        assert!(matches!(ctx.err(), Some(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_cancel_reports_cancelled() {
        let ctx = CallContext::new();
        let clone = ctx.clone();
        clone.cancel();

        assert!(ctx.is_done());
        assert!(matches!(ctx.done().await, Error::Cancelled));
    }

    #[test]
    fn test_child_follows_parent_but_not_the_reverse() {
        let parent = CallContext::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());

        let other = parent.child();
        parent.cancel();
        assert!(other.is_done());
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_keeps_context_live() {
        let ctx = CallContext::new().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_done());

        let bounded = CallContext::new()
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::MAX);
        assert!(bounded.deadline().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = CallContext::new()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
        assert_eq!(ctx.child().deadline(), ctx.deadline());
    }
}
