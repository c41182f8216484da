//! Rule table resolution and the unmatched-request policy.

use std::sync::Arc;
use std::thread;

use courier_backend::Backend;
use courier_core::{Error, Method, ParameterValue, StubResponse};
use courier_stub::{StubBackend, UnmatchedStubPolicy, UnstubbedRequest, VirtualScheduler};

use crate::common::{Api, Recorder, ZEN};

fn deliver(backend: &StubBackend, clock: &VirtualScheduler, target: &Api) -> Recorder {
    let recorder = Recorder::default();
    let _token = backend.request(target.endpoint(), recorder.completion());
    clock.run_pending();
    recorder
}

fn body(recorder: &Recorder) -> String {
    recorder.single().unwrap().map_string().unwrap()
}

/// Test 1: A request with no rule and no sample panics, naming the request.
#[test]
#[should_panic(expected = "GET https://api.github.com/zen is not stubbed yet")]
fn test_unstubbed_request_panics() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder().scheduler(clock.clone()).build();

    let _token = backend.request(Api::zen().endpoint(), Recorder::default().completion());
}

/// Test 2: An explicit NoRuleError rule is treated as unstubbed.
#[test]
#[should_panic(expected = "is not stubbed yet")]
fn test_no_rule_error_panics() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder().scheduler(clock.clone()).build();
    backend.stub(&Api::zen(), StubResponse::NoRuleError);

    let _token = backend.request(Api::zen().endpoint(), Recorder::default().completion());
}

/// Test 3: The error policy delivers an UnstubbedRequest instead of panicking.
#[test]
fn test_unstubbed_request_error_policy() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder()
        .scheduler(clock.clone())
        .unmatched(UnmatchedStubPolicy::Error)
        .build();
    let target = Api::get("/missing").with_method(Method::DELETE);

    let recorder = deliver(&backend, &clock, &target);

    match recorder.single() {
        Err(Error::Underlying(inner)) => {
            let unstubbed = inner.downcast_ref::<UnstubbedRequest>().unwrap();
            assert_eq!(unstubbed.method, Method::DELETE);
            assert_eq!(unstubbed.url.as_str(), "https://api.github.com/missing");
        }
        other => panic!("expected Underlying(UnstubbedRequest), got {other:?}"),
    }
}

/// Test 4: Sample responses answer when no rule exists; rules win over samples.
#[test]
fn test_sample_response_fallback() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder().scheduler(clock.clone()).build();
    let mut target = Api::zen();
    target.sample = Some(StubResponse::network_response(200, "sample"));

    assert_eq!(body(&deliver(&backend, &clock, &target)), "sample");

    backend.stub(&target, StubResponse::network_response(200, "rule"));
    assert_eq!(body(&deliver(&backend, &clock, &target)), "rule");
}

/// Test 5: The default response answers when there is neither rule nor sample.
#[test]
fn test_default_response_fallback() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder()
        .scheduler(clock.clone())
        .default_response(StubResponse::network_response(204, ""))
        .build();

    let recorder = deliver(&backend, &clock, &Api::get("/anything"));
    assert_eq!(recorder.single().unwrap().status_code, 204);
}

/// Test 6: The last registration for a key wins and removal works per key.
#[test]
fn test_registration_and_removal() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder()
        .scheduler(clock.clone())
        .unmatched(UnmatchedStubPolicy::Error)
        .build();
    let zen = Api::zen();
    let octocat = Api::get("/octocat");

    backend.stub(&zen, StubResponse::network_response(200, "first"));
    backend.stub(&zen, StubResponse::network_response(200, ZEN));
    backend.stub(&octocat, StubResponse::network_response(200, "cat"));
    assert_eq!(backend.stub_count(), 2);
    assert_eq!(body(&deliver(&backend, &clock, &zen)), ZEN);

    assert!(backend.remove_stub(&zen));
    assert!(!backend.remove_stub(&zen));
    assert_eq!(backend.stub_count(), 1);
    assert!(matches!(
        deliver(&backend, &clock, &zen).single(),
        Err(Error::Underlying(_))
    ));

    backend.remove_all_stubs();
    assert_eq!(backend.stub_count(), 0);
}

/// Test 7: Rules are keyed by method as well as URL.
#[test]
fn test_method_is_part_of_key() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder().scheduler(clock.clone()).build();
    let get = Api::get("/users");
    let post = Api::get("/users").with_method(Method::POST);

    backend.stub(&get, StubResponse::network_response(200, "list"));
    backend.stub(&post, StubResponse::network_response(201, "created"));

    assert_eq!(body(&deliver(&backend, &clock, &get)), "list");
    assert_eq!(deliver(&backend, &clock, &post).single().unwrap().status_code, 201);
}

/// Test 8: Conditional rules see the endpoint, including middleware changes.
#[test]
fn test_conditional_rule() {
    let clock = VirtualScheduler::new();
    let backend = StubBackend::builder().scheduler(clock.clone()).build();
    let target = Api::get("/users");
    backend.stub_with(&target, |endpoint, target| {
        match endpoint.parameters().get("id") {
            Some(ParameterValue::Int(1)) => StubResponse::network_response(200, "alice"),
            _ => StubResponse::network_response(404, target.path().into_owned()),
        }
    });

    let mut endpoint = target.endpoint();
    endpoint.parameters_mut().insert("id".to_owned(), 1.into());
    let found = Recorder::default();
    let _token = backend.request(endpoint, found.completion());
    clock.run_pending();
    assert_eq!(body(&found), "alice");

    let missing = deliver(&backend, &clock, &target).single().unwrap();
    assert_eq!(missing.status_code, 404);
    assert_eq!(missing.map_string().unwrap(), "/users");
}

/// Test 9: Registration and lookup may run concurrently from many threads.
#[test]
fn test_concurrent_registration() {
    let clock = VirtualScheduler::new();
    let backend = Arc::new(StubBackend::builder().scheduler(clock.clone()).build());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let backend = backend.clone();
            thread::spawn(move || {
                for index in 0..50 {
                    let target = Api::get(&format!("/w{worker}/{index}"));
                    backend.stub(&target, StubResponse::network_response(200, "ok"));
                    let _token = backend.request(target.endpoint(), Recorder::default().completion());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(backend.stub_count(), 400);
    assert_eq!(backend.request_count(), 400);
    assert_eq!(clock.pending_count(), 400);
    clock.run_pending();
    assert_eq!(clock.pending_count(), 0);
}
