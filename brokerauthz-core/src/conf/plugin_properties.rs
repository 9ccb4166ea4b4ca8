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

use brokerauthz_dp::authz::AuthzError;
use std::collections::HashMap;
use std::time::Duration;

/**
Key-value properties handed to the plugins by the broker.

| Property                           | Required                    |
|------------------------------------|-----------------------------|
| `ldap.url`                         | yes                         |
| `ldap.base.dn`                     | yes                         |
| `ldap.search.base`                 | yes                         |
| `ldap.user`                        | for authorization           |
| `ldap.password`                    | for authorization           |
| `ldap.auth.cache.validity.millis`  | yes                         |
| `ldap.search.timelimit.millis`     | no (default 10000)          |
*/
pub struct PluginProperties<'a> {
    properties: &'a HashMap<String, String>,
}

impl<'a> PluginProperties<'a> {
    /// Directory service URL.
    pub const LDAP_URL: &'static str = "ldap.url";
    /// Base naming context.
    pub const LDAP_BASE_DN: &'static str = "ldap.base.dn";
    /// Search base relative to the base naming context.
    pub const LDAP_SEARCH_BASE: &'static str = "ldap.search.base";
    /// Common name of the service identity.
    pub const LDAP_USER: &'static str = "ldap.user";
    /// Secret of the service identity.
    pub const LDAP_PASSWORD: &'static str = "ldap.password";
    /// Validity of cached results in milliseconds.
    pub const CACHE_VALIDITY_MILLIS: &'static str = "ldap.auth.cache.validity.millis";
    /// Search time limit in milliseconds.
    pub const SEARCH_TIME_LIMIT_MILLIS: &'static str = "ldap.search.timelimit.millis";

    /// Return a new instance.
    pub fn new(properties: &'a HashMap<String, String>) -> Self {
        Self { properties }
    }

    /// Return the value as-is or fail when the property is missing or blank.
    pub fn required(&self, name: &str) -> Result<&'a str, AuthzError> {
        super::require_non_blank(
            self.properties.get(name).map(String::as_str).unwrap_or_default(),
            name,
        )
    }

    /// Return the value as-is if present and not blank.
    pub fn optional(&self, name: &str) -> Option<&'a str> {
        self.properties
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Return a required number of milliseconds.
    pub fn required_millis(&self, name: &str) -> Result<Duration, AuthzError> {
        super::parse_millis(self.required(name)?, name)
    }

    /// Return an optional number of milliseconds.
    pub fn optional_millis(&self, name: &str) -> Result<Option<Duration>, AuthzError> {
        self.optional(name)
            .map(|value| super::parse_millis(value, name))
            .transpose()
    }
}
