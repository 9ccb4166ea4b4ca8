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

//! Description of how to reach the directory service.

use std::time::Duration;

/// Identity the connector uses for searching other entries.
#[derive(Clone)]
pub struct ServiceIdentity {
    name: String,
    secret: String,
}

impl ServiceIdentity {
    /// Return a new instance.
    pub fn new(name: &str, secret: &str) -> Self {
        Self {
            name: name.to_owned(),
            secret: secret.to_owned(),
        }
    }

    /// Common name of the service account.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Credential of the service account.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for ServiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceIdentity")
            .field("name", &self.name)
            .field("secret", &"*redacted*")
            .finish()
    }
}

/**
Immutable description of the directory service.

Use [Self::for_authentication] when only end-user credentials need to be
verified and [Self::with_service_identity] when group memberships of other
principals will be searched for, since an end-user typically cannot search
other entries.
*/
#[derive(Debug, Clone)]
pub struct DirectorySpec {
    service_url: String,
    base_naming_context: String,
    search_base: String,
    service_identity: Option<ServiceIdentity>,
    search_time_limit: Duration,
}

impl DirectorySpec {
    /// Searches will be aborted after this duration unless overridden.
    pub const DEFAULT_SEARCH_TIME_LIMIT: Duration = Duration::from_millis(10_000);

    /// Return a new instance without a service identity.
    pub fn for_authentication(
        service_url: &str,
        base_naming_context: &str,
        search_base: &str,
    ) -> Self {
        let ret = Self {
            service_url: service_url.to_owned(),
            base_naming_context: base_naming_context.to_owned(),
            search_base: search_base.to_owned(),
            service_identity: None,
            search_time_limit: Self::DEFAULT_SEARCH_TIME_LIMIT,
        };
        log::info!(
            "Directory url: '{service_url}', base: '{base_naming_context}', search base: '{search_base}'."
        );
        ret
    }

    /// Return a new instance with a service identity for group searches.
    pub fn with_service_identity(
        service_url: &str,
        base_naming_context: &str,
        search_base: &str,
        service_identity: ServiceIdentity,
    ) -> Self {
        log::info!(
            "Directory url: '{service_url}', base: '{base_naming_context}', search base: '{search_base}', service identity: '{}'.",
            service_identity.name()
        );
        Self {
            service_url: service_url.to_owned(),
            base_naming_context: base_naming_context.to_owned(),
            search_base: search_base.to_owned(),
            service_identity: Some(service_identity),
            search_time_limit: Self::DEFAULT_SEARCH_TIME_LIMIT,
        }
    }

    /// Return a copy with a different search time limit.
    pub fn search_time_limit_override(mut self, search_time_limit: Duration) -> Self {
        self.search_time_limit = search_time_limit;
        self
    }

    /// Location of the directory service. E.g. `ldaps://ldap.example.com:636`.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// The base naming context. E.g. `dc=example,dc=com`.
    pub fn base_naming_context(&self) -> &str {
        &self.base_naming_context
    }

    /// Search base relative to the base naming context. E.g.
    /// `OU=Service Accounts`.
    pub fn search_base(&self) -> &str {
        &self.search_base
    }

    /// The service identity, if any.
    pub fn service_identity(&self) -> Option<&ServiceIdentity> {
        self.service_identity.as_ref()
    }

    /// Maximum duration of a directory search.
    pub fn search_time_limit(&self) -> Duration {
        self.search_time_limit
    }

    /// Absolute DN where subtree searches are rooted.
    pub fn search_root(&self) -> String {
        Self::join_dn(&[&self.search_base, &self.base_naming_context])
    }

    /// Build the DN of a principal from its already escaped common name.
    ///
    /// Template: `CN=<escaped common name>,<search base>,<base naming context>`
    pub fn user_dn(&self, escaped_common_name: &str) -> String {
        Self::join_dn(&[
            &format!("CN={escaped_common_name}"),
            &self.search_base,
            &self.base_naming_context,
        ])
    }

    /// Join non-empty DN fragments.
    fn join_dn(fragments: &[&str]) -> String {
        fragments
            .iter()
            .map(|fragment| fragment.trim())
            .filter(|fragment| !fragment.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}
