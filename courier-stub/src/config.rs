//! Stub backend configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// When a stubbed response is delivered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub enum StubBehavior {
    /// On the scheduler's next turn, never synchronously inside `request`.
    #[default]
    Immediate,
    /// After the given delay (e.g., "500ms", "2s").
    Delayed(#[serde(with = "humantime_serde")] Duration),
}

impl StubBehavior {
    /// Delay before delivery.
    pub fn delay(&self) -> Duration {
        match self {
            Self::Immediate => Duration::ZERO,
            Self::Delayed(delay) => *delay,
        }
    }
}

/// What happens to a request nothing answers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub enum UnmatchedStubPolicy {
    /// Panic inside `request`, naming the method and URL.
    #[default]
    Panic,
    /// Deliver [`UnstubbedRequest`](crate::UnstubbedRequest) as an underlying error.
    Error,
}

/// Stub backend configuration.
///
/// ```
/// use std::time::Duration;
/// use courier_stub::{StubBehavior, StubConfig, UnmatchedStubPolicy};
///
/// let config: StubConfig = serde_json::from_str(
///     r#"{"default_behavior": {"Delayed": "250ms"}, "unmatched": "Error"}"#,
/// ).unwrap();
/// assert_eq!(config.default_behavior, StubBehavior::Delayed(Duration::from_millis(250)));
/// assert_eq!(config.unmatched, UnmatchedStubPolicy::Error);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct StubConfig {
    /// Behavior of rules that do not set their own.
    #[serde(default)]
    pub default_behavior: StubBehavior,
    /// Policy for unmatched requests.
    #[serde(default)]
    pub unmatched: UnmatchedStubPolicy,
}
