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

//! Presence and absence checks for backup artifacts.
//!
//! Every call resolves the provider, composes the listing prefix from the
//! target prefix and `sub_prefix` (e.g. `backups`), and builds a fresh
//! client. Nothing is shared between calls.

use tracing::info;

use crate::error::{ProbeError, ProbeResult};
use crate::storage::{select, ObjectsInStorage, StorageTarget};
use crate::util::retry::{poll_until, PollOutcome, RetryPolicy};

fn describe(target: &StorageTarget, object_key: &str) -> String {
    format!(
        "object '{}' in {} bucket '{}' under prefix '{}'",
        object_key, target.provider, target.bucket, target.prefix
    )
}

/// Report whether the `object_key` folder exists under `sub_prefix`.
///
/// # Errors
///
/// Returns `UnknownProvider` for an unsupported provider, and
/// authentication or transport failures wrapped with the object context.
pub async fn object_exists(
    target: &StorageTarget,
    sub_prefix: &str,
    object_key: &str,
) -> ProbeResult<bool> {
    let adapter = select(&target.provider)?;
    let scoped = target.scoped(sub_prefix);
    adapter
        .exists_under(&scoped, object_key)
        .await
        .map_err(|e| e.context(format!("Failed to look up {}", describe(&scoped, object_key))))
}

/// Fail unless the `object_key` folder exists under `sub_prefix`.
///
/// Checked once; presence is expected to hold already.
pub async fn must_exist(
    target: &StorageTarget,
    sub_prefix: &str,
    object_key: &str,
) -> ProbeResult<()> {
    let adapter = select(&target.provider)?;
    must_exist_with(&adapter, &target.scoped(sub_prefix), object_key).await
}

/// Fail unless the `object_key` folder disappears from `sub_prefix` within
/// `policy`.
///
/// Deletion on the backup side is asynchronous, so the bucket is polled
/// every `policy.interval` for at most `policy.max_attempts` checks.
/// Listing errors end the poll at once.
pub async fn must_not_exist(
    target: &StorageTarget,
    sub_prefix: &str,
    object_key: &str,
    policy: &RetryPolicy,
) -> ProbeResult<()> {
    let adapter = select(&target.provider)?;
    must_not_exist_with(&adapter, &target.scoped(sub_prefix), object_key, policy).await
}

/// Delete everything in the `object_key` folder under `sub_prefix`.
///
/// Used to remove a backup behind the backup application's back. Not
/// atomic: a failure part way leaves earlier deletions in place.
pub async fn delete_objects(
    target: &StorageTarget,
    sub_prefix: &str,
    object_key: &str,
) -> ProbeResult<()> {
    let adapter = select(&target.provider)?;
    let scoped = target.scoped(sub_prefix);
    adapter
        .delete_under(&scoped, object_key)
        .await
        .map_err(|e| e.context(format!("Failed to delete {}", describe(&scoped, object_key))))
}

/// [`must_exist`] against an already selected adapter and a target whose
/// prefix is the full listing prefix.
pub async fn must_exist_with(
    adapter: &dyn ObjectsInStorage,
    target: &StorageTarget,
    object_key: &str,
) -> ProbeResult<()> {
    let exists = adapter
        .exists_under(target, object_key)
        .await
        .map_err(|e| e.context(format!("Failed to look up {}", describe(target, object_key))))?;

    if !exists {
        return Err(ProbeError::VerificationError(format!(
            "{} does not exist, but it was expected to",
            describe(target, object_key)
        )));
    }

    info!(
        "Verified presence of key={} in bucket={}, prefix={}",
        object_key, target.bucket, target.prefix
    );
    Ok(())
}

/// [`must_not_exist`] against an already selected adapter and a target
/// whose prefix is the full listing prefix.
pub async fn must_not_exist_with(
    adapter: &dyn ObjectsInStorage,
    target: &StorageTarget,
    object_key: &str,
    policy: &RetryPolicy,
) -> ProbeResult<()> {
    if policy.max_attempts == 0 {
        return Err(ProbeError::ConfigError(
            "Absence check needs at least one attempt".to_string(),
        ));
    }

    let operation_name = format!("absence of {}", object_key);
    let outcome = poll_until(policy, &operation_name, move || async move {
        adapter.exists_under(target, object_key).await.map(|exists| !exists)
    })
    .await
    .map_err(|e| e.context(format!("Failed to look up {}", describe(target, object_key))))?;

    match outcome {
        PollOutcome::Settled { attempts } => {
            info!(
                "Verified absence of key={} in bucket={}, prefix={}, attempts={}",
                object_key, target.bucket, target.prefix, attempts
            );
            Ok(())
        }
        PollOutcome::Exhausted { attempts } => Err(ProbeError::VerificationError(format!(
            "{} still exists after {} attempt(s) {:?} apart",
            describe(target, object_key),
            attempts,
            policy.interval
        ))),
    }
}
