use std::fmt;

use courier_core::{Endpoint, Error, Response, Target};

use super::Middleware;

/// Direction of a network activity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkActivityChange {
    /// A request is about to start.
    Began,
    /// A request finished, failed, was aborted or was cancelled.
    Ended,
}

/// Reports when requests begin and end, e.g. to drive an activity indicator.
pub struct NetworkActivityMiddleware {
    callback: Box<dyn Fn(NetworkActivityChange) + Send + Sync>,
}

impl NetworkActivityMiddleware {
    /// Calls `callback` with every change.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(NetworkActivityChange) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl Middleware for NetworkActivityMiddleware {
    fn will_send_request(&self, _target: &dyn Target, _endpoint: &mut Endpoint) {
        (self.callback)(NetworkActivityChange::Began);
    }

    fn did_receive_response(&self, _target: &dyn Target, _result: &Result<Response, Error>) {
        (self.callback)(NetworkActivityChange::Ended);
    }
}

impl fmt::Debug for NetworkActivityMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkActivityMiddleware")
            .finish_non_exhaustive()
    }
}
