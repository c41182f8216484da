//! Delivery on real timers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use courier_backend::Backend;
use courier_core::{Completion, Error, Response, StubResponse};
use courier_stub::{StubBackend, StubBehavior, StubRule, TokioScheduler};
use futures::channel::oneshot;

use crate::common::{Api, ZEN};

fn channel() -> (Completion, oneshot::Receiver<Result<Response, Error>>) {
    let (sender, receiver) = oneshot::channel();
    let completion: Completion = Box::new(move |result| {
        let _ = sender.send(result);
    });
    (completion, receiver)
}

/// Test 1: Immediate delivery still happens after `request` returns.
#[tokio::test]
async fn test_immediate_is_asynchronous() {
    let backend = StubBackend::new();
    backend.stub(&Api::zen(), StubResponse::network_response(200, ZEN));

    let delivered = Arc::new(AtomicBool::new(false));
    let flag = delivered.clone();
    let (sender, receiver) = oneshot::channel();
    let _token = backend.request(
        Api::zen().endpoint(),
        Box::new(move |result| {
            flag.store(true, Ordering::SeqCst);
            let _ = sender.send(result);
        }),
    );
    assert!(!delivered.load(Ordering::SeqCst));

    let response = receiver.await.unwrap().unwrap();
    assert_eq!(response.map_string().unwrap(), ZEN);
}

/// Test 2: A delayed stub waits for its delay.
#[tokio::test]
async fn test_delayed_waits() {
    let backend = StubBackend::builder()
        .scheduler(TokioScheduler::new())
        .default_behavior(StubBehavior::Delayed(Duration::from_millis(50)))
        .build();
    backend.stub(&Api::zen(), StubResponse::network_response(200, ZEN));

    let started = Instant::now();
    let (completion, receiver) = channel();
    let _token = backend.request(Api::zen().endpoint(), completion);

    let response = receiver.await.unwrap().unwrap();
    assert_eq!(response.status_code, 200);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

/// Test 3: Cancelling a delayed stub delivers Cancelled without waiting for the delay.
#[tokio::test]
async fn test_cancel_delayed() {
    let backend = StubBackend::new();
    backend.stub_rule(
        &Api::zen(),
        StubRule::new(StubResponse::network_response(200, ZEN))
            .with_behavior(StubBehavior::Delayed(Duration::from_secs(30))),
    );

    let (completion, receiver) = channel();
    let token = backend.request(Api::zen().endpoint(), completion);
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), receiver)
        .await
        .expect("cancellation should not wait for the stub delay")
        .unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
}

/// Test 4: Outside a runtime, delivery falls back to a thread.
#[test]
fn test_delivery_without_runtime() {
    let backend = StubBackend::builder()
        .default_behavior(StubBehavior::Delayed(Duration::from_millis(10)))
        .build();
    backend.stub(&Api::zen(), StubResponse::network_response(200, ZEN));

    let (sender, receiver) = std::sync::mpsc::channel();
    let _token = backend.request(
        Api::zen().endpoint(),
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );

    let result = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(result.unwrap().status_code, 200);
}
