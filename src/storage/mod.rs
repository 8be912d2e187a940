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

//! Cloud storage abstraction layer
//!
//! A [`StorageTarget`] describes one bucket and the path prefix backups live
//! under. [`select`] maps a provider identifier to a backend implementing
//! [`ObjectsInStorage`]; every backend is built on the `object_store` crate
//! and shares the same listing and matching logic.

pub mod adapter;
pub mod aws;
pub mod azure;
pub(crate) mod client;
pub mod credentials;
pub mod gcs;
pub mod prefix;
pub mod selector;
pub mod target;

// Public exports
pub use adapter::{ObjectEntry, ObjectsInStorage};
pub use aws::AwsStorage;
pub use azure::AzureStorage;
pub use gcs::GcsStorage;
pub use prefix::compose_prefix;
pub use selector::{select, ProviderAdapter};
pub use target::{parse_config_map, StorageTarget};
