// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use object_store::{ClientOptions, RetryConfig};
use std::time::Duration;

use super::target::StorageTarget;
use crate::error::ProbeError;

/// Config keys consumed by [`build_client_options`] and [`build_retry_config`].
/// Backend builders skip these when walking the config map.
pub(crate) const CLIENT_OPTION_KEYS: &[&str] = &[
    "timeout",
    "connect_timeout",
    "pool_idle_timeout",
    "pool_max_idle_per_host",
    "max_retries",
    "retry_timeout",
    "insecureSkipTLSVerify",
];

pub(crate) fn is_client_option(key: &str) -> bool {
    CLIENT_OPTION_KEYS.contains(&key)
}

/// Build HTTP client options from the target config.
///
/// Invalid numbers are ignored and the `object_store` default is kept.
pub(crate) fn build_client_options(target: &StorageTarget) -> ClientOptions {
    let mut client_options = ClientOptions::default();
    if let Some(timeout_str) = target.get_option("timeout") {
        if timeout_str == "0" || timeout_str == "disabled" {
            client_options = client_options.with_timeout_disabled();
        } else if let Ok(sec) = timeout_str.parse::<u64>() {
            client_options = client_options.with_timeout(Duration::from_secs(sec));
        }
    }
    if let Some(connect_timeout_str) = target.get_option("connect_timeout") {
        if connect_timeout_str == "0" || connect_timeout_str == "disabled" {
            client_options = client_options.with_connect_timeout_disabled();
        } else if let Ok(sec) = connect_timeout_str.parse::<u64>() {
            client_options = client_options.with_connect_timeout(Duration::from_secs(sec));
        }
    }
    if let Some(pool_idle_timeout_str) = target.get_option("pool_idle_timeout") {
        if let Ok(sec) = pool_idle_timeout_str.parse::<u64>() {
            client_options = client_options.with_pool_idle_timeout(Duration::from_secs(sec));
        }
    }
    if let Some(pool_max_idle_per_host_str) = target.get_option("pool_max_idle_per_host") {
        if let Ok(max_idle) = pool_max_idle_per_host_str.parse::<usize>() {
            client_options = client_options.with_pool_max_idle_per_host(max_idle);
        }
    }
    if target
        .get_option("insecureSkipTLSVerify")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        client_options = client_options.with_allow_invalid_certificates(true);
    }
    client_options
}

/// Build the `object_store` request retry config.
///
/// Retries default to zero: a failed list or delete is reported to the
/// caller as-is. `max_retries` in the config map opts back in.
pub(crate) fn build_retry_config(target: &StorageTarget) -> RetryConfig {
    let default_retry_config = RetryConfig::default();
    let max_retries = target
        .get_option("max_retries")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);
    let retry_timeout = target
        .get_option("retry_timeout")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default_retry_config.retry_timeout);
    RetryConfig {
        backoff: Default::default(),
        max_retries,
        retry_timeout,
    }
}

/// Error for a backend builder that refused to produce a client.
///
/// Config keys are validated before `build()`, so what is left is the
/// credential material the builder consumes. Every backend reports it as an
/// `AuthenticationError`.
pub(crate) fn client_build_error(
    provider: &str,
    target: &StorageTarget,
    source: object_store::Error,
) -> ProbeError {
    ProbeError::AuthenticationError {
        provider: provider.to_string(),
        bucket: target.bucket.clone(),
        message: format!("failed to create {} client: {}", provider, source),
    }
}
