//! reqwest backend configuration.

use std::time::Duration;

use courier_core::EncodingOptions;
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

fn default_timeout() -> Option<Duration> {
    Some(DEFAULT_TIMEOUT)
}

/// Configuration of a [`ReqwestBackend`](crate::ReqwestBackend).
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ReqwestBackendConfig {
    /// Total request timeout (e.g., "30s", "500ms"). Defaults to 60 seconds.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// `User-Agent` sent with every request.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Parameter encoding options.
    #[serde(default)]
    pub encoding: EncodingOptions,
}

impl Default for ReqwestBackendConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: None,
            encoding: EncodingOptions::default(),
        }
    }
}
