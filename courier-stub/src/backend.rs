use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use courier_backend::{Backend, BackendLabel};
use courier_core::{
    CancellationToken, Completion, CompletionSlot, Endpoint, Error, Response, StubResponse,
    Target,
};
use dashmap::DashMap;
use tracing::{trace, warn};

use crate::config::{StubBehavior, StubConfig, UnmatchedStubPolicy};
use crate::error::UnstubbedRequest;
use crate::rule::{StubKey, StubRule};
use crate::scheduler::{Scheduler, TokioScheduler};

/// Backend answering requests from a rule table.
///
/// For every request the response is taken from, in order:
///
/// 1. the rule registered for the endpoint's URL and method,
/// 2. the target's [`sample_response`](Target::sample_response),
/// 3. the backend's default response.
///
/// If none applies, or the response is [`StubResponse::NoRuleError`], the
/// [`UnmatchedStubPolicy`] decides: by default `request` panics.
///
/// Clones share the rule table and counters.
#[derive(Clone)]
pub struct StubBackend {
    rules: Arc<DashMap<StubKey, StubRule>>,
    scheduler: Arc<dyn Scheduler>,
    config: StubConfig,
    default_response: Option<StubResponse>,
    request_count: Arc<AtomicUsize>,
}

impl StubBackend {
    /// Backend with default configuration and tokio timers.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder.
    pub fn builder() -> StubBackendBuilder {
        StubBackendBuilder::default()
    }

    /// Answers requests for `target` with `response`, using the default behavior.
    pub fn stub(&self, target: &dyn Target, response: StubResponse) {
        self.stub_rule(target, StubRule::new(response));
    }

    /// Answers requests for `target` with the response computed by `response`.
    pub fn stub_with<F>(&self, target: &dyn Target, response: F)
    where
        F: Fn(&Endpoint, &dyn Target) -> StubResponse + Send + Sync + 'static,
    {
        self.stub_rule(target, StubRule::conditional(response));
    }

    /// Registers `rule` for the target's URL and method, replacing any
    /// previous rule.
    pub fn stub_rule(&self, target: &dyn Target, rule: StubRule) {
        let key = StubKey::for_target(target);
        trace!(%key, behavior = ?rule.behavior(), "stub registered");
        self.rules.insert(key, rule);
    }

    /// Removes the rule for `target`. Returns `true` if one was registered.
    pub fn remove_stub(&self, target: &dyn Target) -> bool {
        self.rules.remove(&StubKey::for_target(target)).is_some()
    }

    /// Removes every rule.
    pub fn remove_all_stubs(&self) {
        self.rules.clear();
    }

    /// Number of registered rules.
    pub fn stub_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Active configuration.
    pub fn config(&self) -> &StubConfig {
        &self.config
    }

    fn resolve(&self, endpoint: &Endpoint) -> (Option<StubResponse>, StubBehavior) {
        let key = StubKey::for_endpoint(endpoint);
        // Clone the rule out so the shard lock is not held while it runs.
        let rule = self.rules.get(&key).map(|entry| entry.value().clone());
        let target = endpoint.target();

        match rule {
            Some(rule) => {
                trace!(%key, "stub rule matched");
                let behavior = rule.behavior().unwrap_or(self.config.default_behavior);
                (Some(rule.respond(endpoint, target.as_ref())), behavior)
            }
            None => {
                let response = target
                    .sample_response()
                    .or_else(|| self.default_response.clone());
                trace!(%key, fallback = response.is_some(), "no stub rule");
                (response, self.config.default_behavior)
            }
        }
    }

    fn unmatched(&self, endpoint: &Endpoint) -> Error {
        let unstubbed = UnstubbedRequest {
            method: endpoint.method().clone(),
            url: endpoint.url().clone(),
        };
        match self.config.unmatched {
            UnmatchedStubPolicy::Panic => panic!("{unstubbed}"),
            UnmatchedStubPolicy::Error => {
                warn!(method = %unstubbed.method, url = %unstubbed.url, "request is not stubbed");
                Error::underlying(unstubbed)
            }
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for StubBackend {
    fn request(&self, endpoint: Endpoint, completion: Completion) -> CancellationToken {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let (response, behavior) = self.resolve(&endpoint);

        let result = match response {
            Some(StubResponse::NetworkResponse(status_code, body)) => {
                Ok(Response::new(status_code, body).with_url(endpoint.url().clone()))
            }
            Some(StubResponse::NetworkError(error)) => Err(Error::transport(error)),
            Some(StubResponse::NoRuleError) | None => Err(self.unmatched(&endpoint)),
        };

        let token = CancellationToken::new(format!(
            "stub {} {}",
            endpoint.method(),
            endpoint.url()
        ));
        let slot = CompletionSlot::new(completion);
        let delay = behavior.delay();
        trace!(?delay, token = ?token, "scheduling stub delivery");

        let timer = {
            let token = token.clone();
            let slot = slot.clone();
            self.scheduler.schedule(
                delay,
                Box::new(move || {
                    slot.deliver(&token, result);
                }),
            )
        };

        let scheduler = self.scheduler.clone();
        token.set_cancel_action(move || {
            timer.dispose();
            let _delivery = scheduler.schedule(
                Duration::ZERO,
                Box::new(move || {
                    slot.complete(Err(Error::Cancelled));
                }),
            );
        });

        token
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("stub")
    }
}

impl fmt::Debug for StubBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubBackend")
            .field("stubs", &self.rules.len())
            .field("config", &self.config)
            .field("default_response", &self.default_response)
            .finish_non_exhaustive()
    }
}

/// Builder for [`StubBackend`].
///
/// ```
/// use std::time::Duration;
/// use courier_stub::{StubBackend, StubBehavior, UnmatchedStubPolicy, VirtualScheduler};
///
/// let backend = StubBackend::builder()
///     .scheduler(VirtualScheduler::new())
///     .default_behavior(StubBehavior::Delayed(Duration::from_millis(100)))
///     .unmatched(UnmatchedStubPolicy::Error)
///     .build();
/// assert_eq!(backend.stub_count(), 0);
/// ```
#[derive(Default)]
pub struct StubBackendBuilder {
    scheduler: Option<Arc<dyn Scheduler>>,
    config: StubConfig,
    default_response: Option<StubResponse>,
}

impl StubBackendBuilder {
    /// Scheduler used for delivery. Defaults to [`TokioScheduler`].
    pub fn scheduler<S: Scheduler + 'static>(mut self, scheduler: S) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: StubConfig) -> Self {
        self.config = config;
        self
    }

    /// Behavior of rules that do not set their own.
    pub fn default_behavior(mut self, behavior: StubBehavior) -> Self {
        self.config.default_behavior = behavior;
        self
    }

    /// Policy for unmatched requests.
    pub fn unmatched(mut self, policy: UnmatchedStubPolicy) -> Self {
        self.config.unmatched = policy;
        self
    }

    /// Response for requests with no rule and no target sample.
    pub fn default_response(mut self, response: StubResponse) -> Self {
        self.default_response = Some(response);
        self
    }

    /// Builds the backend.
    pub fn build(self) -> StubBackend {
        StubBackend {
            rules: Arc::new(DashMap::new()),
            scheduler: self
                .scheduler
                .unwrap_or_else(|| Arc::new(TokioScheduler::new())),
            config: self.config,
            default_response: self.default_response,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}
