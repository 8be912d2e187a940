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

use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::ObjectStore;
use std::sync::Arc;

use super::adapter::ObjectsInStorage;
use super::client::{
    build_client_options, build_retry_config, client_build_error, is_client_option,
};
use super::credentials::check_gcs_key_file;
use super::target::StorageTarget;
use crate::error::ProbeResult;

/// Google Cloud Storage, authenticated with a service account key file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcsStorage;

impl GcsStorage {
    fn builder(target: &StorageTarget) -> ProbeResult<GoogleCloudStorageBuilder> {
        let mut builder = match &target.credentials_file {
            Some(path) => {
                check_gcs_key_file(path, &target.bucket)?;
                GoogleCloudStorageBuilder::new().with_service_account_path(path.to_string_lossy())
            }
            None => GoogleCloudStorageBuilder::from_env(),
        };

        builder = builder
            .with_bucket_name(&target.bucket)
            .with_client_options(build_client_options(target))
            .with_retry(build_retry_config(target));

        for key in target.config.keys() {
            if !is_client_option(key) {
                tracing::warn!("Unknown GCS option: {}", key);
            }
        }

        Ok(builder)
    }
}

impl ObjectsInStorage for GcsStorage {
    fn provider_name(&self) -> &'static str {
        "gcp"
    }

    fn build_store(&self, target: &StorageTarget) -> ProbeResult<Arc<dyn ObjectStore>> {
        let store = Self::builder(target)?
            .build()
            .map_err(|e| client_build_error(self.provider_name(), target, e))?;
        Ok(Arc::new(store))
    }
}
