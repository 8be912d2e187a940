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

//! Readers for the credential files each backend consumes.
//!
//! Credentials are only ever read here, never created or refreshed.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ProbeError, ProbeResult};

/// Default variable holding the Azure storage account key.
pub const AZURE_ACCOUNT_KEY_VAR: &str = "AZURE_STORAGE_ACCOUNT_ACCESS_KEY";

/// Static key pair from an AWS shared credentials file.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

fn auth_error(provider: &str, bucket: &str, message: String) -> ProbeError {
    ProbeError::AuthenticationError {
        provider: provider.to_string(),
        bucket: bucket.to_string(),
        message,
    }
}

/// Read `profile` from an AWS shared credentials (INI) file.
///
/// # Errors
///
/// Returns an `AuthenticationError` if the file cannot be read, the profile
/// is missing, or it lacks `aws_access_key_id` / `aws_secret_access_key`.
pub fn read_aws_credentials(
    path: &Path,
    profile: &str,
    bucket: &str,
) -> ProbeResult<AwsCredentials> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        auth_error(
            "aws",
            bucket,
            format!("failed to read credentials file '{}': {}", path.display(), e),
        )
    })?;

    let sections = parse_ini_sections(&content);
    let section = sections.get(profile).ok_or_else(|| {
        auth_error(
            "aws",
            bucket,
            format!(
                "profile '{}' not found in credentials file '{}'",
                profile,
                path.display()
            ),
        )
    })?;

    let required = |key: &str| {
        section.get(key).cloned().ok_or_else(|| {
            auth_error(
                "aws",
                bucket,
                format!("profile '{}' has no '{}'", profile, key),
            )
        })
    };

    Ok(AwsCredentials {
        access_key_id: required("aws_access_key_id")?,
        secret_access_key: required("aws_secret_access_key")?,
        session_token: section.get("aws_session_token").cloned(),
    })
}

fn parse_ini_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            // ~/.aws/config style headers
            let name = name.strip_prefix("profile ").unwrap_or(name).trim();
            sections.entry(name.to_string()).or_default();
            current = Some(name.to_string());
            continue;
        }
        if let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('=')) {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    sections
}

/// Resolve the Azure storage account key.
///
/// The credentials file is read as a dotenv file and `key_var` is looked up
/// in it first, then in the process environment.
///
/// # Errors
///
/// Returns an `AuthenticationError` if the file is unreadable or no key is found.
pub fn read_azure_account_key(
    path: Option<&Path>,
    key_var: &str,
    bucket: &str,
) -> ProbeResult<String> {
    if let Some(path) = path {
        let entries = dotenv::from_path_iter(path).map_err(|e| {
            auth_error(
                "azure",
                bucket,
                format!("failed to load credentials file '{}': {}", path.display(), e),
            )
        })?;
        for entry in entries {
            let (key, value) = entry.map_err(|e| {
                auth_error(
                    "azure",
                    bucket,
                    format!("malformed credentials file '{}': {}", path.display(), e),
                )
            })?;
            if key == key_var && !value.is_empty() {
                return Ok(value);
            }
        }
    }

    match std::env::var(key_var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(auth_error(
            "azure",
            bucket,
            format!(
                "no storage account key found in '{}' (checked credentials file and environment)",
                key_var
            ),
        )),
    }
}

/// Check that a GCP service account key file is present and readable.
///
/// # Errors
///
/// Returns an `AuthenticationError` if the file cannot be opened.
pub fn check_gcs_key_file(path: &Path, bucket: &str) -> ProbeResult<()> {
    std::fs::File::open(path).map(|_| ()).map_err(|e| {
        auth_error(
            "gcp",
            bucket,
            format!(
                "failed to open service account file '{}': {}",
                path.display(),
                e
            ),
        )
    })
}
