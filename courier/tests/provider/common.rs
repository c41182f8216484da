//! Targets, recorders and middlewares shared by the provider tests.

use std::borrow::Cow;
use std::sync::Arc;

use courier::Middleware;
use courier_core::{
    Endpoint, Error, Method, Parameters, Response, Target, Url,
};
use courier_stub::{StubBackend, VirtualScheduler};
use parking_lot::Mutex;

pub const ZEN: &str = "Half measures are as bad as nothing at all.";

/// Configurable target against `https://api.github.com`.
#[derive(Clone)]
pub struct Api {
    pub path: String,
    pub method: Method,
    pub parameters: Parameters,
}

impl Api {
    pub fn get(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            method: Method::GET,
            parameters: Parameters::new(),
        }
    }

    pub fn zen() -> Self {
        Self::get("/zen")
    }
}

impl Target for Api {
    fn base_url(&self) -> Url {
        Url::parse("https://api.github.com").unwrap()
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.path)
    }

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn parameters(&self) -> Parameters {
        self.parameters.clone()
    }
}

/// Stub backend driven by a fresh virtual clock.
pub fn virtual_backend() -> (StubBackend, VirtualScheduler) {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder().scheduler(clock.clone()).build();
    (backend, clock)
}

/// Collects every result a completion receives.
#[derive(Clone, Default)]
pub struct Recorder {
    results: Arc<Mutex<Vec<Result<Response, Error>>>>,
}

impl Recorder {
    pub fn completion(&self) -> impl FnOnce(Result<Response, Error>) + Send + 'static {
        let results = self.results.clone();
        move |result| results.lock().push(result)
    }

    pub fn count(&self) -> usize {
        self.results.lock().len()
    }

    /// Takes the single recorded result, failing if there is not exactly one.
    pub fn single(&self) -> Result<Response, Error> {
        let mut results = self.results.lock();
        assert_eq!(results.len(), 1, "expected exactly one completion");
        results.remove(0)
    }
}

/// Shared, ordered log of middleware calls.
pub type Events = Arc<Mutex<Vec<String>>>;

/// Middleware appending `will:<name>` and `did:<name>:<outcome>` to a log.
pub struct Tracker {
    pub name: &'static str,
    pub events: Events,
}

impl Tracker {
    pub fn new(name: &'static str, events: &Events) -> Self {
        Self {
            name,
            events: events.clone(),
        }
    }
}

pub fn outcome(result: &Result<Response, Error>) -> String {
    match result {
        Ok(response) => response.status_code.to_string(),
        Err(Error::Aborted) => "aborted".to_owned(),
        Err(Error::Cancelled) => "cancelled".to_owned(),
        Err(Error::TransportFailed(_)) => "transport".to_owned(),
        Err(error) => format!("other({error})"),
    }
}

impl Middleware for Tracker {
    fn will_send_request(&self, _target: &dyn Target, _endpoint: &mut Endpoint) {
        self.events.lock().push(format!("will:{}", self.name));
    }

    fn did_receive_response(&self, _target: &dyn Target, result: &Result<Response, Error>) {
        self.events
            .lock()
            .push(format!("did:{}:{}", self.name, outcome(result)));
    }
}

/// Middleware aborting every request.
pub struct Abort;

impl Middleware for Abort {
    fn will_send_request(&self, _target: &dyn Target, endpoint: &mut Endpoint) {
        endpoint.abort();
    }
}
