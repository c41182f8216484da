use std::sync::Arc;

use courier_core::{CancellationToken, Completion, Endpoint};

use crate::BackendLabel;

/// Transport that performs prepared endpoints.
///
/// # Contract
///
/// - `completion` is invoked exactly once, on any thread.
/// - Cancelling the returned token before a definitive result is claimed
///   leads to a completion with [`Error::Cancelled`](courier_core::Error::Cancelled).
/// - `request` itself does not block on the transport.
pub trait Backend: Send + Sync {
    /// Starts performing `endpoint`.
    fn request(&self, endpoint: Endpoint, completion: Completion) -> CancellationToken;

    /// Returns the label of this backend, used in logs and token descriptions.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }
}

impl Backend for &dyn Backend {
    fn request(&self, endpoint: Endpoint, completion: Completion) -> CancellationToken {
        (*self).request(endpoint, completion)
    }

    fn label(&self) -> BackendLabel {
        (*self).label()
    }
}

impl Backend for Box<dyn Backend> {
    fn request(&self, endpoint: Endpoint, completion: Completion) -> CancellationToken {
        (**self).request(endpoint, completion)
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

impl Backend for Arc<dyn Backend> {
    fn request(&self, endpoint: Endpoint, completion: Completion) -> CancellationToken {
        (**self).request(endpoint, completion)
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}
