use std::fmt;
use std::sync::Arc;

use courier_core::{Endpoint, Method, StubResponse, Target, Url};

use crate::config::StubBehavior;

/// Key of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StubKey {
    /// Full URL of the target, before parameter encoding.
    pub url: Url,
    /// Request method.
    pub method: Method,
}

impl StubKey {
    /// Key for a target.
    pub fn for_target(target: &dyn Target) -> Self {
        Self {
            url: target.full_url(),
            method: target.method(),
        }
    }

    /// Key for an endpoint.
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            url: endpoint.url().clone(),
            method: endpoint.method().clone(),
        }
    }
}

impl fmt::Display for StubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

type ResponseFn = dyn Fn(&Endpoint, &dyn Target) -> StubResponse + Send + Sync;

/// How the stub backend answers one (URL, method) pair.
#[derive(Clone)]
pub struct StubRule {
    behavior: Option<StubBehavior>,
    response: Arc<ResponseFn>,
}

impl StubRule {
    /// Always answers with `response`.
    pub fn new(response: StubResponse) -> Self {
        Self::conditional(move |_, _| response.clone())
    }

    /// Computes the response from the endpoint and target of each request.
    pub fn conditional<F>(response: F) -> Self
    where
        F: Fn(&Endpoint, &dyn Target) -> StubResponse + Send + Sync + 'static,
    {
        Self {
            behavior: None,
            response: Arc::new(response),
        }
    }

    /// Overrides the backend's default behavior for this rule.
    pub fn with_behavior(mut self, behavior: StubBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Behavior set on this rule, if any.
    pub fn behavior(&self) -> Option<StubBehavior> {
        self.behavior
    }

    /// Evaluates the rule for a request.
    pub fn respond(&self, endpoint: &Endpoint, target: &dyn Target) -> StubResponse {
        (self.response)(endpoint, target)
    }
}

impl fmt::Debug for StubRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubRule")
            .field("behavior", &self.behavior)
            .finish_non_exhaustive()
    }
}
