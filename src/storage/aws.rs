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

use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use std::sync::Arc;
use url::Url;

use super::adapter::ObjectsInStorage;
use super::client::{
    build_client_options, build_retry_config, client_build_error, is_client_option,
};
use super::credentials::read_aws_credentials;
use super::target::StorageTarget;
use crate::error::{ProbeError, ProbeResult};

/// S3 and S3-compatible storage (AWS, MinIO behind vSphere setups)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AwsStorage;

impl AwsStorage {
    /// Translate a target into an S3 builder.
    ///
    /// With a credentials file the key pair comes from the shared credentials
    /// profile named by `profile` (default `default`). Without one, the
    /// standard `AWS_*` environment variables are used.
    fn builder(target: &StorageTarget) -> ProbeResult<AmazonS3Builder> {
        let mut builder = match &target.credentials_file {
            Some(path) => {
                let profile = target
                    .get_option("profile")
                    .map(String::as_str)
                    .unwrap_or("default");
                let creds = read_aws_credentials(path, profile, &target.bucket)?;
                let builder = AmazonS3Builder::new()
                    .with_access_key_id(creds.access_key_id)
                    .with_secret_access_key(creds.secret_access_key);
                match creds.session_token {
                    Some(token) => builder.with_token(token),
                    None => builder,
                }
            }
            None => AmazonS3Builder::from_env(),
        };

        builder = builder
            .with_bucket_name(&target.bucket)
            .with_client_options(build_client_options(target))
            .with_retry(build_retry_config(target));

        if let Some(region) = target.region.as_ref().or(target.get_option("region")) {
            builder = builder.with_region(region);
        }

        for (key, value) in &target.config {
            match key.as_str() {
                "s3Url" => {
                    let endpoint = Url::parse(value).map_err(|e| {
                        ProbeError::ConfigError(format!("Invalid s3Url '{}': {}", value, e))
                    })?;
                    if endpoint.scheme() == "http" {
                        builder = builder.with_allow_http(true);
                    }
                    builder = builder.with_endpoint(value.trim_end_matches('/'));
                }
                "s3ForcePathStyle" => {
                    let force_path_style = value.eq_ignore_ascii_case("true");
                    builder = builder.with_virtual_hosted_style_request(!force_path_style);
                }
                // Consumed above
                "region" | "profile" => (),
                key if is_client_option(key) => (),
                _ => {
                    tracing::warn!("Unknown AWS S3 option: {}", key);
                }
            }
        }

        Ok(builder)
    }
}

impl ObjectsInStorage for AwsStorage {
    fn provider_name(&self) -> &'static str {
        "aws"
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
    use object_store::aws::AmazonS3ConfigKey;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn credentials_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[default]\naws_access_key_id=AKIDTEST\naws_secret_access_key=secret\n\n[ci]\naws_access_key_id=AKIDCI\naws_secret_access_key=secret-ci\naws_session_token=tok\n"
        )
        .unwrap();
        file
    }

    fn target(file: &NamedTempFile) -> StorageTarget {
        StorageTarget::new("aws", "velero-bucket")
            .with_region("us-west-2")
            .with_credentials_file(file.path())
    }

    #[test]
    fn test_builder_reads_credentials_and_region() {
        let file = credentials_file();
        let builder = AwsStorage::builder(&target(&file)).unwrap();

        assert_eq!(
            builder.get_config_value(&AmazonS3ConfigKey::Bucket).as_deref(),
            Some("velero-bucket")
        );
        assert_eq!(
            builder.get_config_value(&AmazonS3ConfigKey::Region).as_deref(),
            Some("us-west-2")
        );
        assert_eq!(
            builder.get_config_value(&AmazonS3ConfigKey::AccessKeyId).as_deref(),
            Some("AKIDTEST")
        );
        assert!(builder.get_config_value(&AmazonS3ConfigKey::Token).is_none());
    }

    #[test]
    fn test_builder_named_profile() {
        let file = credentials_file();
        let builder = AwsStorage::builder(&target(&file).with_option("profile", "ci")).unwrap();
        assert_eq!(
            builder.get_config_value(&AmazonS3ConfigKey::AccessKeyId).as_deref(),
            Some("AKIDCI")
        );
        assert_eq!(
            builder.get_config_value(&AmazonS3ConfigKey::Token).as_deref(),
            Some("tok")
        );
    }

    #[test]
    fn test_builder_region_from_config() {
        let file = credentials_file();
        let target = StorageTarget::new("aws", "b")
            .with_credentials_file(file.path())
            .with_option("region", "eu-central-1");
        let builder = AwsStorage::builder(&target).unwrap();
        assert_eq!(
            builder.get_config_value(&AmazonS3ConfigKey::Region).as_deref(),
            Some("eu-central-1")
        );
    }

    #[test]
    fn test_builder_s3_url() {
        let file = credentials_file();
        let target = target(&file)
            .with_option("s3Url", "http://minio.velero.svc:9000/")
            .with_option("s3ForcePathStyle", "true");
        let builder = AwsStorage::builder(&target).unwrap();
        assert_eq!(
            builder.get_config_value(&AmazonS3ConfigKey::Endpoint).as_deref(),
            Some("http://minio.velero.svc:9000")
        );
        assert_eq!(
            builder
                .get_config_value(&AmazonS3ConfigKey::VirtualHostedStyleRequest)
                .as_deref(),
            Some("false")
        );
    }

    #[test]
    fn test_builder_invalid_s3_url() {
        let file = credentials_file();
        let target = target(&file).with_option("s3Url", "not a url");
        match AwsStorage::builder(&target) {
            Err(ProbeError::ConfigError(msg)) => assert!(msg.contains("s3Url")),
            other => panic!("Expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_build_store_missing_credentials_file() {
        let target = StorageTarget::new("aws", "b").with_credentials_file("/nonexistent/creds");
        assert!(matches!(
            AwsStorage.build_store(&target),
            Err(ProbeError::AuthenticationError { .. })
        ));
    }

    #[test]
    fn test_build_store_offline() {
        let file = credentials_file();
        assert!(AwsStorage.build_store(&target(&file)).is_ok());
        assert_eq!(AwsStorage.provider_name(), "aws");
    }
}
