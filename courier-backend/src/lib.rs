#![warn(missing_docs)]
//! Transport interface for courier.
//!
//! A [`Backend`] takes a prepared [`Endpoint`](courier_core::Endpoint),
//! performs it however it likes and reports the outcome through the
//! [`Completion`](courier_core::Completion) exactly once. It returns a
//! [`CancellationToken`](courier_core::CancellationToken) the caller can use
//! to cancel the request; a cancelled request still completes, with
//! [`Error::Cancelled`](courier_core::Error::Cancelled).
//!
//! If you want to plug in your own transport, implement [`Backend`].

mod backend;
mod label;

pub use backend::Backend;
pub use label::BackendLabel;
