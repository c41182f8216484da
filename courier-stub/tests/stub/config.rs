//! Stub configuration parsing.

use std::time::Duration;

use courier_stub::{StubBackend, StubBehavior, StubConfig, UnmatchedStubPolicy};

/// Test 1: YAML configuration with a delayed default and the error policy.
#[test]
fn test_yaml_config() {
    let yaml = r#"
default_behavior:
  Delayed: 2s
unmatched: Error
"#;

    let config: StubConfig = serde_saphyr::from_str(yaml).expect("failed to deserialize");

    assert_eq!(
        config.default_behavior,
        StubBehavior::Delayed(Duration::from_secs(2))
    );
    assert_eq!(config.unmatched, UnmatchedStubPolicy::Error);
}

/// Test 2: Missing fields fall back to Immediate and Panic.
#[test]
fn test_yaml_defaults() {
    let config: StubConfig = serde_saphyr::from_str("{}").expect("failed to deserialize");

    assert_eq!(config, StubConfig::default());
    assert_eq!(config.default_behavior, StubBehavior::Immediate);
    assert_eq!(config.unmatched, UnmatchedStubPolicy::Panic);
}

/// Test 3: Behaviors serialize with humantime durations.
#[test]
fn test_behavior_json() {
    let delayed = StubBehavior::Delayed(Duration::from_millis(1500));

    assert_eq!(serde_json::to_string(&delayed).unwrap(), r#"{"Delayed":"1s 500ms"}"#);
    assert_eq!(
        serde_json::to_string(&StubBehavior::Immediate).unwrap(),
        r#""Immediate""#
    );
    assert_eq!(
        serde_json::from_str::<StubBehavior>(r#"{"Delayed":"250ms"}"#).unwrap(),
        StubBehavior::Delayed(Duration::from_millis(250))
    );
}

/// Test 4: A parsed configuration drives the backend.
#[test]
fn test_backend_from_config() {
    let config = StubConfig {
        default_behavior: StubBehavior::Delayed(Duration::from_millis(100)),
        unmatched: UnmatchedStubPolicy::Error,
    };

    let backend = StubBackend::builder().config(config).build();

    assert_eq!(backend.config(), &config);
}
