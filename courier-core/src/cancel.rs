//! One-shot cancellation handle.
//!
//! A [`CancellationToken`] is the arbitration point between a caller that
//! wants to cancel and a backend that wants to deliver. Both race to move the
//! token out of [`TokenState::Pending`]; exactly one of them wins.
//!
//! ```text
//!            cancel()              try_claim_delivery()
//! Cancelled <──────── Pending ────────────────────────> Delivered
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// State of a [`CancellationToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Neither cancelled nor delivered.
    Pending,
    /// `cancel()` won the race.
    Cancelled,
    /// The backend claimed delivery.
    Delivered,
}

type CancelAction = Box<dyn FnOnce() + Send>;

struct Inner {
    state: TokenState,
    action: Option<CancelAction>,
}

/// Thread-safe, cloneable handle to cancel an in-flight request.
///
/// Clones share state. Cancelling is idempotent and never blocks on the
/// backend: the attached cancel action runs on the cancelling thread, once.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Mutex<Inner>>,
    description: Arc<str>,
}

impl CancellationToken {
    /// Creates a pending token.
    ///
    /// `description` only shows up in `Debug` output.
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self::with_state(description.into(), TokenState::Pending)
    }

    /// A token for a request that already finished, e.g. one that was
    /// aborted before dispatch. Cancelling it does nothing.
    pub fn completed(description: impl Into<Arc<str>>) -> Self {
        Self::with_state(description.into(), TokenState::Delivered)
    }

    fn with_state(description: Arc<str>, state: TokenState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                action: None,
            })),
            description,
        }
    }

    /// Cancels the request.
    ///
    /// Only the first call on a pending token has an effect: it moves the
    /// token to [`TokenState::Cancelled`] and runs the cancel action.
    pub fn cancel(&self) {
        let action = {
            let mut inner = self.inner.lock();
            if inner.state != TokenState::Pending {
                return;
            }
            inner.state = TokenState::Cancelled;
            inner.action.take()
        };

        if let Some(action) = action {
            action();
        }
    }

    /// Claims the right to deliver the definitive result.
    ///
    /// Returns `false` if the token was cancelled (or already claimed), in
    /// which case the caller must deliver [`Error::Cancelled`](crate::Error::Cancelled)
    /// or nothing at all.
    pub fn try_claim_delivery(&self) -> bool {
        let action = {
            let mut inner = self.inner.lock();
            if inner.state != TokenState::Pending {
                return false;
            }
            inner.state = TokenState::Delivered;
            inner.action.take()
        };
        // The action may own resources with their own locks.
        drop(action);
        true
    }

    /// Attaches the action run when the token is cancelled.
    ///
    /// If the token is already cancelled the action runs immediately; if it
    /// was already delivered the action is dropped. A second call replaces a
    /// previously attached action.
    pub fn set_cancel_action<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.inner.lock();
        let state = inner.state;
        match state {
            TokenState::Pending => {
                inner.action = Some(Box::new(action));
            }
            TokenState::Cancelled => {
                drop(inner);
                action();
            }
            TokenState::Delivered => {}
        }
    }

    /// Current state.
    pub fn state(&self) -> TokenState {
        self.inner.lock().state
    }

    /// Returns `true` once `cancel()` won the race.
    pub fn is_cancelled(&self) -> bool {
        self.state() == TokenState::Cancelled
    }

    /// Human readable description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("description", &self.description)
            .field("state", &self.state())
            .finish()
    }
}
