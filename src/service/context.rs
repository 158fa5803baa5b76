//! Per-request unit-of-work context

use crate::error::ContextError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation token plus an optional deadline.
///
/// Checking a context never waits; it only polls the current state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never done unless cancelled explicitly
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// A context cancelled together with `parent`, expiring `timeout` from now
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            deadline: None,
        }
        .timeout(timeout)
    }

    fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `Some` once the context is cancelled or past its deadline
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<(), ContextError> {
        self.err().map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_never_done() {
        let ctx = RequestContext::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_zero_timeout_is_expired() {
        let ctx = RequestContext::with_timeout(Duration::ZERO);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[test]
    fn test_generous_timeout_is_live() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(60));
        assert!(ctx.deadline().is_some());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let ctx = RequestContext::with_timeout(Duration::ZERO);
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn test_parent_cancellation_propagates() {
        let shutdown = CancellationToken::new();
        let ctx = RequestContext::child_of(&shutdown, Duration::from_secs(60));
        assert!(ctx.check().is_ok());

        shutdown.cancel();
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn test_child_cancel_leaves_parent_alone() {
        let shutdown = CancellationToken::new();
        let ctx = RequestContext::child_of(&shutdown, Duration::from_secs(60));

        ctx.cancel();
        assert!(!shutdown.is_cancelled());
    }
}
