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
use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;
use std::time::Duration;

/// Validity of cached authentications and group memberships.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    validitymillis: String,
}

impl AppConfigDefaults for CacheConfig {
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        // 5 minutes
        config_builder.set_default(prefix.to_string() + "." + "validitymillis", "300000")
    }
}

impl CacheConfig {
    pub(super) fn from_plugin_properties(
        properties: &PluginProperties,
    ) -> Result<Self, AuthzError> {
        let validity = properties.required_millis(PluginProperties::CACHE_VALIDITY_MILLIS)?;
        Ok(Self {
            validitymillis: validity.as_millis().to_string(),
        })
    }

    /// How long a successful authentication or a resolved set of groups is
    /// trusted.
    pub fn validity(&self) -> Result<Duration, AuthzError> {
        super::parse_millis(&self.validitymillis, "cache.validitymillis")
    }
}
