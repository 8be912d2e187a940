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

use object_store::ObjectStore;
use std::sync::Arc;

use super::adapter::ObjectsInStorage;
use super::aws::AwsStorage;
use super::azure::AzureStorage;
use super::gcs::GcsStorage;
use super::target::StorageTarget;
use crate::error::{ProbeError, ProbeResult};

/// Storage backend chosen for a provider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAdapter {
    Aws(AwsStorage),
    Azure(AzureStorage),
    Gcp(GcsStorage),
}

/// Resolve a provider identifier to its adapter.
///
/// `vsphere` clusters keep their backups in S3-compatible storage and share
/// the `aws` adapter. Identifiers are matched exactly.
///
/// # Errors
///
/// Returns `UnknownProvider` naming `kind` for anything else.
pub fn select(kind: &str) -> ProbeResult<ProviderAdapter> {
    match kind {
        "aws" | "vsphere" => Ok(ProviderAdapter::Aws(AwsStorage)),
        "azure" => Ok(ProviderAdapter::Azure(AzureStorage)),
        "gcp" => Ok(ProviderAdapter::Gcp(GcsStorage)),
        other => Err(ProbeError::UnknownProvider(other.to_string())),
    }
}

impl ProviderAdapter {
    fn inner(&self) -> &dyn ObjectsInStorage {
        match self {
            ProviderAdapter::Aws(s) => s as &dyn ObjectsInStorage,
            ProviderAdapter::Azure(s) => s as &dyn ObjectsInStorage,
            ProviderAdapter::Gcp(s) => s as &dyn ObjectsInStorage,
        }
    }
}

impl ObjectsInStorage for ProviderAdapter {
    fn provider_name(&self) -> &'static str {
        self.inner().provider_name()
    }

    fn build_store(&self, target: &StorageTarget) -> ProbeResult<Arc<dyn ObjectStore>> {
        self.inner().build_store(target)
    }
}
