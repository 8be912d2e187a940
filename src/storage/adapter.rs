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

use async_trait::async_trait;
use futures::stream::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use tracing::{debug, info};

use super::target::StorageTarget;
use crate::error::{ProbeError, ProbeResult};

/// An object seen while scanning a prefix
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    /// Full object name inside the bucket
    pub path: String,

    /// Object size in bytes
    pub size: u64,

    pub last_modified: chrono::DateTime<chrono::Utc>,
}

/// Capability set shared by every storage backend.
///
/// Implementors only describe how to authenticate: [`build_store`] returns a
/// client for one call. Matching and deletion live in the provided methods
/// so every backend applies the same selection rule.
///
/// [`build_store`]: ObjectsInStorage::build_store
#[async_trait]
pub trait ObjectsInStorage: Send + Sync {
    /// Short provider name used in logs and errors.
    fn provider_name(&self) -> &'static str;

    /// Build an authenticated client for `target`.
    ///
    /// Called once per operation; the client is dropped when the operation
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for missing options and an
    /// `AuthenticationError` for unusable credentials.
    fn build_store(&self, target: &StorageTarget) -> ProbeResult<Arc<dyn ObjectStore>>;

    /// Check whether any object under `target.prefix` belongs to the
    /// `object_key` folder.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - a matching object was found
    /// * `Ok(false)` - the listing completed without a match
    ///
    /// # Errors
    ///
    /// Authentication and transport failures are returned, never mapped to
    /// `false`.
    async fn exists_under(&self, target: &StorageTarget, object_key: &str) -> ProbeResult<bool> {
        let store = self.build_store(target)?;
        let found = find_first_match(store.as_ref(), &target.prefix, object_key)
            .await
            .map_err(|e| {
                ProbeError::from_store(self.provider_name(), &target.bucket, &target.prefix, e)
            })?;

        match found {
            Some(entry) => {
                info!(
                    "Found object={} for key={} in bucket={}, provider={}",
                    entry.path,
                    object_key,
                    target.bucket,
                    self.provider_name()
                );
                Ok(true)
            }
            None => {
                info!(
                    "Key={} not found under prefix={} in bucket={}, provider={}",
                    object_key,
                    target.prefix,
                    target.bucket,
                    self.provider_name()
                );
                Ok(false)
            }
        }
    }

    /// Delete every object under `target.prefix` that belongs to the
    /// `object_key` folder. No match is not an error.
    ///
    /// # Errors
    ///
    /// Stops at the first failed delete. Objects removed before the failure
    /// stay removed.
    async fn delete_under(&self, target: &StorageTarget, object_key: &str) -> ProbeResult<()> {
        let store = self.build_store(target)?;
        let deleted = delete_matches(store.as_ref(), &target.prefix, object_key)
            .await
            .map_err(|(deleted, e)| {
                ProbeError::from_store(self.provider_name(), &target.bucket, &target.prefix, e)
                    .context(format!(
                        "deletion of '{}' stopped after removing {} object(s)",
                        object_key, deleted
                    ))
            })?;

        info!(
            "Deleted count={} objects for key={} under prefix={} in bucket={}, provider={}",
            deleted,
            object_key,
            target.prefix,
            target.bucket,
            self.provider_name()
        );
        Ok(())
    }
}

impl Debug for dyn ObjectsInStorage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ObjectsInStorage(provider={})", self.provider_name())
    }
}

/// Whether the object `name` belongs to the `object_key` folder under `prefix`.
///
/// This is a substring test for `prefix + object_key + "/"`, so backends that
/// report names with extra leading segments still match. It is deliberately
/// permissive: `other-backup-1/x` under the same prefix does not match
/// `backup-1`, but a name that embeds the whole needle deeper in its path
/// would.
pub fn matches_object(name: &str, prefix: &str, object_key: &str) -> bool {
    if is_prefix_entry(name, prefix) {
        return false;
    }
    let needle = format!("{}{}/", prefix, object_key);
    name.contains(&needle)
}

/// Flat listings may return the prefix itself as an entry.
fn is_prefix_entry(name: &str, prefix: &str) -> bool {
    name == prefix || name == prefix.trim_end_matches('/')
}

fn listing_path(prefix: &str) -> Option<ObjectPath> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(ObjectPath::from(trimmed))
    }
}

/// Scan `prefix` and return the first object that matches `object_key`.
///
/// An error from any page of the listing aborts the scan.
pub async fn find_first_match(
    store: &dyn ObjectStore,
    prefix: &str,
    object_key: &str,
) -> Result<Option<ObjectEntry>, object_store::Error> {
    let path = listing_path(prefix);
    let mut stream = store.list(path.as_ref());
    let mut scanned = 0usize;

    while let Some(meta) = stream.next().await {
        let meta = meta?;
        scanned += 1;
        let name = meta.location.to_string();
        if is_prefix_entry(&name, prefix) {
            debug!("Skipping prefix entry={}", name);
            continue;
        }
        if matches_object(&name, prefix, object_key) {
            return Ok(Some(ObjectEntry {
                path: name,
                size: meta.size,
                last_modified: meta.last_modified,
            }));
        }
    }

    debug!("Scanned count={} objects under prefix={}", scanned, prefix);
    Ok(None)
}

/// Delete every object under `prefix` that matches `object_key`.
///
/// Matches are collected before the first delete so the listing is not
/// mutated while it is being read. On failure the number of objects already
/// deleted is returned alongside the error.
pub async fn delete_matches(
    store: &dyn ObjectStore,
    prefix: &str,
    object_key: &str,
) -> Result<usize, (usize, object_store::Error)> {
    let path = listing_path(prefix);
    let mut stream = store.list(path.as_ref());
    let mut matched = Vec::new();

    while let Some(meta) = stream.next().await {
        let meta = meta.map_err(|e| (0, e))?;
        if matches_object(meta.location.as_ref(), prefix, object_key) {
            matched.push(meta.location);
        }
    }

    let mut deleted = 0usize;
    for location in matched {
        store.delete(&location).await.map_err(|e| (deleted, e))?;
        debug!("Deleted object={}", location);
        deleted += 1;
    }
    Ok(deleted)
}
