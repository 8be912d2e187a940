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

//! # Bucket Probe
//!
//! Test-harness helpers for backup/restore end-to-end suites.
//!
//! Two concerns are covered:
//!
//! - **Object verification**: check that a backup artifact exists in, or has
//!   disappeared from, an S3, Azure Blob or GCS bucket. Disappearance is
//!   polled at a fixed interval because garbage collection is asynchronous.
//! - **Command pipelines**: run `list | filter | extract` as three processes
//!   and collect the last stage's output lines, e.g. to map a pod to its
//!   persistent volume claims through `kubectl`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bucket_probe::{verify, RetryPolicy, StorageTarget};
//!
//! # async fn example() -> Result<(), bucket_probe::ProbeError> {
//! let target = StorageTarget::new("aws", "velero-backups")
//!     .with_prefix("cluster-a")
//!     .with_region("us-east-1")
//!     .with_credentials_file("/tmp/credentials-velero");
//!
//! verify::must_exist(&target, "backups", "backup-1").await?;
//! // ... delete the backup through the system under test ...
//! verify::must_not_exist(&target, "backups", "backup-1", &RetryPolicy::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`verify`] - Existence, absence and deletion checks against a bucket
//! - [`storage`] - Storage targets and provider backends
//! - [`pipeline`] - Three-stage process pipelines
//! - [`util`] - Polling helpers
//! - [`error`] - Error type shared by every module

pub mod error;
pub mod pipeline;
pub mod storage;
pub mod util;
pub mod verify;

// Re-export commonly used types
pub use error::{ProbeError, ProbeResult};
pub use pipeline::{run_pipeline, CommandLine, PipelineSpec};
pub use storage::{compose_prefix, select, ObjectsInStorage, ProviderAdapter, StorageTarget};
pub use util::retry::RetryPolicy;
