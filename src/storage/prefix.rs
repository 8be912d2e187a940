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

/// Build the listing prefix for `sub_prefix` under `base_prefix`.
///
/// The result always ends with exactly one `/` so that listing `backup-1`
/// never picks up a neighbouring `backup-10`.
///
/// * empty `base_prefix` → `sub_prefix + "/"`
/// * otherwise → `trim(base_prefix, "/") + "/" + trim(sub_prefix, "/") + "/"`
///
/// A base made only of slashes counts as empty, and the result never starts
/// with `/`.
pub fn compose_prefix(base_prefix: &str, sub_prefix: &str) -> String {
    let base = base_prefix.trim_matches('/');
    let sub = sub_prefix.trim_matches('/');
    if base.is_empty() {
        format!("{}/", sub)
    } else {
        format!("{}/{}/", base, sub)
    }
}
