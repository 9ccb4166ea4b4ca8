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

use super::AppConfigDefaults;
use super::PluginProperties;
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::directory::DirectorySpec;
use brokerauthz_dp::directory::ServiceIdentity;
use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;

/// Directory service location and the service identity used for searches.
#[derive(Deserialize)]
pub struct LdapConfig {
    url: String,
    basedn: String,
    searchbase: String,
    user: String,
    password: String,
    searchtimelimitmillis: String,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("url", &self.url)
            .field("basedn", &self.basedn)
            .field("searchbase", &self.searchbase)
            .field("user", &self.user)
            .field("password", &"*redacted*")
            .field("searchtimelimitmillis", &self.searchtimelimitmillis)
            .finish()
    }
}

impl AppConfigDefaults for LdapConfig {
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder
            .set_default(prefix.to_string() + "." + "url", "")?
            .set_default(prefix.to_string() + "." + "basedn", "")?
            .set_default(prefix.to_string() + "." + "searchbase", "")?
            .set_default(prefix.to_string() + "." + "user", "")?
            .set_default(prefix.to_string() + "." + "password", "")?
            .set_default(
                prefix.to_string() + "." + "searchtimelimitmillis",
                DirectorySpec::DEFAULT_SEARCH_TIME_LIMIT.as_millis().to_string(),
            )
    }
}

impl LdapConfig {
    /// Parse plugin properties. The service identity is only required when
    /// `require_service_identity` is `true`.
    pub(super) fn from_plugin_properties(
        properties: &PluginProperties,
        require_service_identity: bool,
    ) -> Result<Self, AuthzError> {
        let url = properties.required(PluginProperties::LDAP_URL)?;
        let basedn = properties.required(PluginProperties::LDAP_BASE_DN)?;
        let searchbase = properties.required(PluginProperties::LDAP_SEARCH_BASE)?;
        let (user, password) = if require_service_identity {
            (
                properties.required(PluginProperties::LDAP_USER)?,
                properties.required(PluginProperties::LDAP_PASSWORD)?,
            )
        } else {
            (
                properties
                    .optional(PluginProperties::LDAP_USER)
                    .unwrap_or_default(),
                properties
                    .optional(PluginProperties::LDAP_PASSWORD)
                    .unwrap_or_default(),
            )
        };
        let search_time_limit = properties
            .optional_millis(PluginProperties::SEARCH_TIME_LIMIT_MILLIS)?
            .unwrap_or(DirectorySpec::DEFAULT_SEARCH_TIME_LIMIT);
        // Secrets are used exactly as provided
        Ok(Self {
            url: url.trim().to_owned(),
            basedn: basedn.trim().to_owned(),
            searchbase: searchbase.trim().to_owned(),
            user: user.trim().to_owned(),
            password: password.to_owned(),
            searchtimelimitmillis: search_time_limit.as_millis().to_string(),
        })
    }

    /** Return a description of the directory service.

    A service identity is only included when `user` is configured and then the
    `password` is required as well.
    */
    pub fn directory_spec(&self) -> Result<DirectorySpec, AuthzError> {
        let url = super::require_non_blank(&self.url, "ldap.url")?.trim();
        let basedn = super::require_non_blank(&self.basedn, "ldap.basedn")?.trim();
        let searchbase = super::require_non_blank(&self.searchbase, "ldap.searchbase")?.trim();
        let search_time_limit =
            super::parse_millis(&self.searchtimelimitmillis, "ldap.searchtimelimitmillis")?;
        let directory_spec = if self.user.trim().is_empty() {
            DirectorySpec::for_authentication(url, basedn, searchbase)
        } else {
            let password = super::require_non_blank(&self.password, "ldap.password")?;
            DirectorySpec::with_service_identity(
                url,
                basedn,
                searchbase,
                ServiceIdentity::new(self.user.trim(), password),
            )
        };
        Ok(directory_spec.search_time_limit_override(search_time_limit))
    }
}
