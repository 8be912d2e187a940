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

use thiserror::Error;

/// Errors that can occur while probing buckets or running pipelines
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Unknown provider '{0}' (expected one of: aws, vsphere, azure, gcp)")]
    UnknownProvider(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication error for {provider} bucket '{bucket}': {message}")]
    AuthenticationError {
        provider: String,
        bucket: String,
        message: String,
    },

    #[error("Transport error for {provider} bucket '{bucket}' under prefix '{prefix}': {source}")]
    TransportError {
        provider: String,
        bucket: String,
        prefix: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Verification failed: {0}")]
    VerificationError(String),

    #[error("Pipeline stage {stage} ({command}) failed: {message}")]
    PipelineStageError {
        stage: usize,
        command: String,
        message: String,
    },

    #[error("Pipeline output could not be parsed: {0}")]
    OutputParseError(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ProbeError>,
    },
}

impl ProbeError {
    /// Wrap this error with a human readable description of the call that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        ProbeError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping any `Context` layers.
    pub fn root(&self) -> &ProbeError {
        match self {
            ProbeError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Build the error for a failed `object_store` call, separating rejected
    /// credentials from every other backend failure.
    pub(crate) fn from_store(
        provider: &str,
        bucket: &str,
        prefix: &str,
        source: object_store::Error,
    ) -> Self {
        match source {
            object_store::Error::Unauthenticated { .. }
            | object_store::Error::PermissionDenied { .. } => ProbeError::AuthenticationError {
                provider: provider.to_string(),
                bucket: bucket.to_string(),
                message: source.to_string(),
            },
            source => ProbeError::TransportError {
                provider: provider.to_string(),
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                source,
            },
        }
    }
}

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;
