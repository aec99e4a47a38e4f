//! Per-request deadline and cancellation
//!
//! A [`RequestContext`] travels with each call into the engine. It is only
//! consulted at points where nothing has been written yet: before
//! validation, before each atomic mutation attempt and around retry
//! backoffs. Once a mutation has started it runs to completion, so an abort
//! reported from here never leaves a partial effect.

use crate::types::LedgerError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// A context with no deadline that is never cancelled unless its token is
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the deadline
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Tie this context to an externally owned cancellation token
    ///
    /// Typically a child token of the originating request's token.
    pub fn cancelled_by(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The token that cancels this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fail if the request was cancelled or has run out of time
    pub fn check(&self) -> Result<(), LedgerError> {
        if self.cancel.is_cancelled() {
            return Err(LedgerError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(LedgerError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
