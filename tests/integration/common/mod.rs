//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for all integration tests including:
//! - Live API discovery and skip-or-fail handling
//! - An in-process fake of the API for hermetic runs
//! - Tracing setup

#![allow(dead_code)]

use std::env;
use std::time::Duration;

use ipm_harness::HarnessConfig;

pub mod fake_api;

/// Whether the live API is expected to be up (tests fail instead of skip).
/// True when IPM_REQUIRE_API is set, e.g. in the contract CI job.
pub fn require_api() -> bool {
    env::var("IPM_REQUIRE_API").is_ok()
}

/// Live API configuration from the environment
pub fn live_config() -> HarnessConfig {
    HarnessConfig::from_env().expect("Invalid IPM_API_* environment")
}

/// Any HTTP answer at the base URL counts as reachable
pub async fn api_available(config: &HarnessConfig) -> bool {
    let client = reqwest::Client::new();
    client
        .get(config.url("/"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .is_ok()
}

/// Skip or panic depending on whether the live API is expected
pub fn skip_or_panic(msg: &str) {
    if require_api() {
        panic!("Live API required but: {}", msg);
    }
    println!("⏭️ Skipping test: {}", msg);
}

/// Skip the test if the live API is not running
#[allow(unused_macros)]
macro_rules! skip_if_no_api {
    ($config:expr) => {
        if !$crate::common::api_available($config).await {
            $crate::common::skip_or_panic(&format!("API not reachable at {}", $config.base_url));
            return;
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_config_has_base_url() {
        let config = live_config();
        assert!(!config.base_url.is_empty());
        assert!(!config.base_url.ends_with('/'));
    }
}
