/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! Directory capability for resolving group memberships.

use crate::authz::AuthzError;
use std::collections::HashSet;

/// Resolves the group memberships of a principal.
#[async_trait::async_trait]
pub trait GroupResolver: Send + Sync {
    /// Return the upper case names of all groups `username` is a member of.
    ///
    /// A principal that is unknown to the directory or has no memberships
    /// yields an empty set.
    async fn groups_for_user(&self, username: &str) -> Result<HashSet<String>, AuthzError>;
}
