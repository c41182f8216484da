//! One-shot completion delivery.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cancel::CancellationToken;
use crate::error::Error;
use crate::response::Response;

/// Callback receiving the terminal result of a request.
pub type Completion = Box<dyn FnOnce(Result<Response, Error>) + Send>;

/// Shared holder of a [`Completion`] that can fire at most once.
///
/// Backends clone the slot into every path that may finish the request
/// (transport callback, timer, cancel action). Whichever path calls
/// [`complete`](Self::complete) first takes the callback; later calls are
/// no-ops.
#[derive(Clone)]
pub struct CompletionSlot(Arc<Mutex<Option<Completion>>>);

impl CompletionSlot {
    /// Wraps a completion.
    pub fn new(completion: Completion) -> Self {
        Self(Arc::new(Mutex::new(Some(completion))))
    }

    /// Invokes the completion if it has not fired yet.
    ///
    /// Returns `true` if this call fired it. The callback runs outside the
    /// slot's lock.
    pub fn complete(&self, result: Result<Response, Error>) -> bool {
        let completion = self.0.lock().take();
        match completion {
            Some(completion) => {
                completion(result);
                true
            }
            None => false,
        }
    }

    /// Delivers `result` if the token can still be claimed, otherwise
    /// delivers [`Error::Cancelled`].
    pub fn deliver(&self, token: &CancellationToken, result: Result<Response, Error>) -> bool {
        if token.try_claim_delivery() {
            self.complete(result)
        } else {
            self.complete(Err(Error::Cancelled))
        }
    }

    /// Returns `true` once the completion has fired.
    pub fn is_completed(&self) -> bool {
        self.0.lock().is_none()
    }
}

impl fmt::Debug for CompletionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSlot")
            .field("completed", &self.is_completed())
            .finish()
    }
}
