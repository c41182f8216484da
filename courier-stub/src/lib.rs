#![warn(missing_docs)]
//! Deterministic stub backend for courier.
//!
//! [`StubBackend`] answers requests from a table of [`StubRule`]s keyed by
//! URL and method instead of touching the network. Responses are delivered
//! through a [`Scheduler`], either right away ([`StubBehavior::Immediate`])
//! or after a delay ([`StubBehavior::Delayed`]), which makes cancellation
//! races reproducible:
//!
//! - [`TokioScheduler`] uses real timers.
//! - [`VirtualScheduler`] only moves when the test advances its clock.
//!
//! ```
//! use std::borrow::Cow;
//! use std::time::Duration;
//!
//! use courier_core::{StubResponse, Target, Url};
//! use courier_stub::{StubBackend, StubBehavior, StubRule, VirtualScheduler};
//!
//! struct Zen;
//!
//! impl Target for Zen {
//!     fn base_url(&self) -> Url {
//!         Url::parse("https://api.github.com").unwrap()
//!     }
//!
//!     fn path(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("/zen")
//!     }
//! }
//!
//! let clock = VirtualScheduler::new();
//! let backend = StubBackend::builder().scheduler(clock.clone()).build();
//! backend.stub_rule(
//!     &Zen,
//!     StubRule::new(StubResponse::network_response(200, "Design for failure."))
//!         .with_behavior(StubBehavior::Delayed(Duration::from_secs(2))),
//! );
//! assert_eq!(backend.stub_count(), 1);
//! ```

mod backend;
pub mod config;
pub mod error;
mod rule;
pub mod scheduler;

pub use backend::{StubBackend, StubBackendBuilder};
pub use config::{StubBehavior, StubConfig, UnmatchedStubPolicy};
pub use error::UnstubbedRequest;
pub use rule::{StubKey, StubRule};
pub use scheduler::{ScheduledHandle, Scheduler, Task, TokioScheduler, VirtualScheduler};
