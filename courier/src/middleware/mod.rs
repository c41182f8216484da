//! Hooks observing every request the provider makes.
//!
//! A [`Middleware`] sees each request twice: once before it is handed to the
//! backend, with mutable access to the [`Endpoint`], and once after the
//! result is known. The provider guarantees one call of each per request,
//! in that order, including requests that are aborted or cancelled.

use std::sync::Arc;

use courier_core::{Endpoint, Error, Response, Target};

mod activity;
mod logger;

pub use activity::{NetworkActivityChange, NetworkActivityMiddleware};
pub use logger::{BodyFormatter, LogSink, NetworkLoggerMiddleware};

/// Request lifecycle hook.
///
/// Both methods run synchronously: `will_send_request` on the caller's
/// thread, `did_receive_response` on whichever thread the backend completes
/// on.
pub trait Middleware: Send + Sync {
    /// Called before the request is sent. May modify the endpoint, including
    /// aborting it with [`Endpoint::abort`].
    fn will_send_request(&self, _target: &dyn Target, _endpoint: &mut Endpoint) {}

    /// Called with the result before the caller's completion runs.
    fn did_receive_response(&self, _target: &dyn Target, _result: &Result<Response, Error>) {}
}

impl<M> Middleware for Arc<M>
where
    M: Middleware + ?Sized,
{
    fn will_send_request(&self, target: &dyn Target, endpoint: &mut Endpoint) {
        (**self).will_send_request(target, endpoint)
    }

    fn did_receive_response(&self, target: &dyn Target, result: &Result<Response, Error>) {
        (**self).did_receive_response(target, result)
    }
}

impl<M> Middleware for Box<M>
where
    M: Middleware + ?Sized,
{
    fn will_send_request(&self, target: &dyn Target, endpoint: &mut Endpoint) {
        (**self).will_send_request(target, endpoint)
    }

    fn did_receive_response(&self, target: &dyn Target, result: &Result<Response, Error>) {
        (**self).did_receive_response(target, result)
    }
}
