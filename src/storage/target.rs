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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::prefix::compose_prefix;
use crate::error::{ProbeError, ProbeResult};

/// Where a backup's artifacts are expected to live.
///
/// A target is supplied fresh by the caller for every verification call and
/// is never mutated by it. The `config` map carries provider-specific keys
/// (e.g. `storageAccount` for Azure, `s3Url` for S3-compatible endpoints)
/// along with client tuning options such as `timeout` or `max_retries`.
///
/// # Examples
///
/// ```
/// use bucket_probe::storage::StorageTarget;
///
/// let target = StorageTarget::new("aws", "velero-backups")
///     .with_prefix("cluster-a")
///     .with_region("us-east-1")
///     .with_credentials_file("/home/ci/.aws/credentials")
///     .with_option("s3ForcePathStyle", "true");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageTarget {
    /// Provider identifier, resolved by the selector on every call
    pub provider: String,

    /// Path to the credentials file, if credentials are not environment-sourced
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    #[serde(default)]
    pub region: Option<String>,

    /// Bucket (AWS, GCS) or container (Azure) name
    pub bucket: String,

    /// Listing prefix inside the bucket; may be empty
    #[serde(default)]
    pub prefix: String,

    /// Provider-specific configuration options
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl StorageTarget {
    pub fn new(provider: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            credentials_file: None,
            region: None,
            bucket: bucket.into(),
            prefix: String::new(),
            config: HashMap::new(),
        }
    }

    /// Load a target from a JSON document on disk.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or is not a valid target.
    pub fn from_json_file(path: &Path) -> ProbeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::ConfigError(format!(
                "Failed to read target file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ProbeError::ConfigError(format!(
                "Invalid target file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Add a configuration option, replacing any previous value for `key`.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.config.extend(options);
        self
    }

    /// Merge a `key1=value1,key2=value2` config string into the target.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any entry is not a `key=value` pair.
    pub fn with_config_str(self, config: &str) -> ProbeResult<Self> {
        Ok(self.with_options(parse_config_map(config)?))
    }

    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.config.get(key)
    }

    /// Copy of this target whose prefix is the composed listing prefix for
    /// `sub_prefix`.
    pub fn scoped(&self, sub_prefix: &str) -> Self {
        let mut scoped = self.clone();
        scoped.prefix = compose_prefix(&self.prefix, sub_prefix);
        scoped
    }
}

/// Parse a backup storage location config string such as
/// `region=us-east-1,s3ForcePathStyle=true` into a map.
///
/// Blank input yields an empty map. Whitespace around keys and values is
/// trimmed; values may themselves contain `=`.
///
/// # Errors
///
/// Returns a `ConfigError` naming the first entry that has no `=` or an empty key.
pub fn parse_config_map(config: &str) -> ProbeResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for entry in config.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            ProbeError::ConfigError(format!(
                "Config entry '{}' is not a key=value pair",
                entry
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ProbeError::ConfigError(format!(
                "Config entry '{}' has an empty key",
                entry
            )));
        }
        map.insert(key.to_string(), value.trim().to_string());
    }
    Ok(map)
}
