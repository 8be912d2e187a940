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

use object_store::azure::MicrosoftAzureBuilder;
use object_store::ObjectStore;
use std::sync::Arc;
use url::Url;

use super::adapter::ObjectsInStorage;
use super::client::{
    build_client_options, build_retry_config, client_build_error, is_client_option,
};
use super::credentials::{read_azure_account_key, AZURE_ACCOUNT_KEY_VAR};
use super::target::StorageTarget;
use crate::error::{ProbeError, ProbeResult};

/// Azure Blob Storage, authenticated with a storage account shared key.
///
/// The target bucket is the blob container; the account name comes from the
/// `storageAccount` config key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AzureStorage;

impl AzureStorage {
    fn builder(target: &StorageTarget) -> ProbeResult<MicrosoftAzureBuilder> {
        let account_name = target
            .get_option("storageAccount")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ProbeError::ConfigError(format!(
                    "Azure container '{}' requires the 'storageAccount' config option",
                    target.bucket
                ))
            })?;
        let key_var = target
            .get_option("storageAccountKeyEnvVar")
            .map(String::as_str)
            .unwrap_or(AZURE_ACCOUNT_KEY_VAR);
        let account_key =
            read_azure_account_key(target.credentials_file.as_deref(), key_var, &target.bucket)?;

        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(account_name)
            .with_access_key(account_key)
            .with_container_name(&target.bucket)
            .with_client_options(build_client_options(target))
            .with_retry(build_retry_config(target));

        for (key, value) in &target.config {
            match key.as_str() {
                "endpoint" => {
                    let endpoint = Url::parse(value).map_err(|e| {
                        ProbeError::ConfigError(format!(
                            "Invalid Azure endpoint '{}': {}",
                            value, e
                        ))
                    })?;
                    if endpoint.scheme() == "http" {
                        builder = builder.with_allow_http(true);
                    }
                    builder = builder.with_endpoint(value.trim_end_matches('/').to_string());
                }
                // Key lookup through the management API is not performed;
                // these are accepted so Velero location configs load as-is.
                "resourceGroup" | "subscriptionId" => {
                    tracing::debug!("Ignoring Azure management option: {}", key);
                }
                "storageAccount" | "storageAccountKeyEnvVar" => (),
                key if is_client_option(key) => (),
                _ => {
                    tracing::warn!("Unknown Azure option: {}", key);
                }
            }
        }

        Ok(builder)
    }
}

impl ObjectsInStorage for AzureStorage {
    fn provider_name(&self) -> &'static str {
        "azure"
    }

    fn build_store(&self, target: &StorageTarget) -> ProbeResult<Arc<dyn ObjectStore>> {
        let store = Self::builder(target)?
            .build()
            .map_err(|e| client_build_error(self.provider_name(), target, e))?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::azure::AzureConfigKey;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn credentials_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "AZURE_SUBSCRIPTION_ID=sub\nAZURE_RESOURCE_GROUP=rg\nAZURE_STORAGE_ACCOUNT_ACCESS_KEY=c2VjcmV0LWtleQ==\nALT_KEY=YWx0LWtleQ==\n"
        )
        .unwrap();
        file
    }

    fn target(file: &NamedTempFile) -> StorageTarget {
        StorageTarget::new("azure", "velero-container")
            .with_credentials_file(file.path())
            .with_option("storageAccount", "probeaccount")
            .with_option("resourceGroup", "rg")
    }

    #[test]
    fn test_builder_sets_account_and_container() {
        let file = credentials_file();
        let builder = AzureStorage::builder(&target(&file)).unwrap();
        assert_eq!(
            builder.get_config_value(&AzureConfigKey::AccountName).as_deref(),
            Some("probeaccount")
        );
        assert_eq!(
            builder.get_config_value(&AzureConfigKey::ContainerName).as_deref(),
            Some("velero-container")
        );
        assert_eq!(
            builder.get_config_value(&AzureConfigKey::AccessKey).as_deref(),
            Some("c2VjcmV0LWtleQ==")
        );
    }

    #[test]
    fn test_builder_custom_key_var() {
        let file = credentials_file();
        let target = target(&file).with_option("storageAccountKeyEnvVar", "ALT_KEY");
        let builder = AzureStorage::builder(&target).unwrap();
        assert_eq!(
            builder.get_config_value(&AzureConfigKey::AccessKey).as_deref(),
            Some("YWx0LWtleQ==")
        );
    }

    #[test]
    fn test_builder_requires_storage_account() {
        let file = credentials_file();
        let target = StorageTarget::new("azure", "c").with_credentials_file(file.path());
        match AzureStorage::builder(&target) {
            Err(ProbeError::ConfigError(msg)) => assert!(msg.contains("storageAccount")),
            other => panic!("Expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_missing_key() {
        let file = credentials_file();
        let target = target(&file)
            .with_option("storageAccountKeyEnvVar", "BUCKET_PROBE_TEST_UNSET_AZURE_KEY");
        assert!(matches!(
            AzureStorage::builder(&target),
            Err(ProbeError::AuthenticationError { .. })
        ));
    }

    #[test]
    fn test_builder_endpoint() {
        let file = credentials_file();
        let target = target(&file).with_option("endpoint", "http://127.0.0.1:10000/probeaccount/");
        let builder = AzureStorage::builder(&target).unwrap();
        assert_eq!(
            builder.get_config_value(&AzureConfigKey::Endpoint).as_deref(),
            Some("http://127.0.0.1:10000/probeaccount")
        );
    }

    #[test]
    fn test_undecodable_key_is_authentication_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "AZURE_STORAGE_ACCOUNT_ACCESS_KEY=not-base64!!\n").unwrap();
        let target = target(&file);
        match AzureStorage.build_store(&target) {
            Err(ProbeError::AuthenticationError { provider, bucket, .. }) => {
                assert_eq!(provider, "azure");
                assert_eq!(bucket, "velero-container");
            }
            other => panic!("Expected AuthenticationError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_build_store_offline() {
        let file = credentials_file();
        assert!(AzureStorage.build_store(&target(&file)).is_ok());
        assert_eq!(AzureStorage.provider_name(), "azure");
    }
}
