//! Cooperative cancellation: checked before each FS call and between commit
//! steps (`spec.md` §5 "Scheduling model").
//!
//! Wraps `tokio_util::sync::CancellationToken` rather than a bespoke atomic
//! flag, since the CLI already pulls in `tokio` for `spawn_blocking` and a
//! cancellation token composes cleanly with a future awaiting the blocking
//! task.

use crate::error::CoreError;
use tokio_util::sync::CancellationToken;

/// A cheaply cloneable handle an `Executor` checks at well-defined points.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(CancellationToken);

impl CancelToken {
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Check the token, returning [`CoreError::Cancelled`] if it has fired.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cancelled`] iff cancellation has been requested.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}
