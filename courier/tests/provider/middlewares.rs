//! The built-in middlewares.

use std::fmt;
use std::sync::Arc;

use courier::Provider;
use courier::middleware::{
    NetworkActivityChange, NetworkActivityMiddleware, NetworkLoggerMiddleware,
};
use courier_core::StubResponse;
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

use crate::common::{Abort, Api, Recorder, ZEN, virtual_backend};

type Lines = Arc<Mutex<Vec<String>>>;

fn logger_sink(lines: &Lines) -> impl Fn(&str) + Send + Sync + 'static {
    let lines = lines.clone();
    move |line| lines.lock().push(line.to_owned())
}

/// Records the message of every INFO event.
struct CaptureInfo(Lines);

impl<S: Subscriber> Layer<S> for CaptureInfo {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::INFO {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.0.lock().push(visitor.0);
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Test 1: Activity is reported as Began then Ended around a request.
#[test]
fn test_activity_began_and_ended() {
    let (backend, clock) = virtual_backend();
    backend.stub(&Api::zen(), StubResponse::network_response(200, ZEN));
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    let provider = Provider::builder()
        .backend(backend)
        .middleware(NetworkActivityMiddleware::new(move |change| {
            sink.lock().push(change)
        }))
        .build();

    let _token = provider.request(Api::zen(), Recorder::default().completion());
    assert_eq!(*changes.lock(), [NetworkActivityChange::Began]);

    clock.run_pending();
    assert_eq!(
        *changes.lock(),
        [NetworkActivityChange::Began, NetworkActivityChange::Ended]
    );
}

/// Test 2: An aborted request still ends its activity.
#[test]
fn test_activity_on_abort() {
    let (backend, _clock) = virtual_backend();
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    let provider = Provider::builder()
        .backend(backend)
        .middleware(NetworkActivityMiddleware::new(move |change| {
            sink.lock().push(change)
        }))
        .middleware(Abort)
        .build();

    let _token = provider.request(Api::zen(), Recorder::default().completion());

    assert_eq!(
        *changes.lock(),
        [NetworkActivityChange::Began, NetworkActivityChange::Ended]
    );
}

/// Test 3: The logger writes one request line and one response line.
#[test]
fn test_logger_terse() {
    let (backend, clock) = virtual_backend();
    backend.stub(&Api::zen(), StubResponse::network_response(200, ZEN));
    let lines = Lines::default();
    let provider = Provider::builder()
        .backend(backend)
        .middleware(NetworkLoggerMiddleware::new().output(logger_sink(&lines)))
        .build();

    let _token = provider.request(Api::zen(), Recorder::default().completion());
    clock.run_pending();

    assert_eq!(
        *lines.lock(),
        [
            "Request: GET https://api.github.com/zen",
            "Response: 200 https://api.github.com/zen",
        ]
    );
}

/// Test 4: Verbose logging adds headers, parameters and the formatted body.
#[test]
fn test_logger_verbose_with_formatter() {
    let (backend, clock) = virtual_backend();
    backend.stub(&Api::zen(), StubResponse::network_response(200, ZEN));
    let lines = Lines::default();
    let provider = Provider::builder()
        .backend(backend)
        .middleware(
            NetworkLoggerMiddleware::new()
                .verbose(true)
                .body_formatter(|body| format!("{} bytes", body.len()))
                .output(logger_sink(&lines)),
        )
        .build();

    let _token = provider.request(Api::zen(), Recorder::default().completion());
    clock.run_pending();

    let lines = lines.lock();
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("Request Headers: "));
    assert!(lines[2].starts_with("Request Parameters: "));
    assert_eq!(lines[4], format!("Response Body: {} bytes", ZEN.len()));
}

/// Test 5: Failures are logged with the error message.
#[test]
fn test_logger_error() {
    let (backend, _clock) = virtual_backend();
    let lines = Lines::default();
    let provider = Provider::builder()
        .backend(backend)
        .middleware(NetworkLoggerMiddleware::new().output(logger_sink(&lines)))
        .middleware(Abort)
        .build();

    let _token = provider.request(Api::zen(), Recorder::default().completion());

    assert_eq!(
        lines.lock().last().map(String::as_str),
        Some("Response Error: request aborted before dispatch")
    );
}

/// Test 6: Logger lines are emitted as INFO tracing events.
#[test]
fn test_logger_emits_tracing_events() {
    let (backend, clock) = virtual_backend();
    backend.stub(&Api::zen(), StubResponse::network_response(200, ZEN));
    let provider = Provider::builder()
        .backend(backend)
        .middleware(NetworkLoggerMiddleware::new())
        .build();
    let captured = Lines::default();
    let subscriber = tracing_subscriber::registry().with(CaptureInfo(captured.clone()));

    tracing::subscriber::with_default(subscriber, || {
        let _token = provider.request(Api::zen(), Recorder::default().completion());
        clock.run_pending();
    });

    assert_eq!(
        *captured.lock(),
        [
            "Request: GET https://api.github.com/zen",
            "Response: 200 https://api.github.com/zen",
        ]
    );
}
