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
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::authz::AuthzErrorKind;
use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;

/// Available directory provider implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendImplementation {
    /// Directory service reached over LDAP.
    Ldap,
    /// Ephemeral in-memory directory for development.
    Mem,
}

/// Directory provider selection.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    implementation: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            implementation: "ldap".to_string(),
        }
    }
}

impl AppConfigDefaults for BackendConfig {
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder.set_default(prefix.to_string() + "." + "implementation", "ldap")
    }
}

impl BackendConfig {
    /// Selected directory provider implementation.
    pub fn implementation(&self) -> Result<BackendImplementation, AuthzError> {
        match self.implementation.trim().to_lowercase().as_str() {
            "ldap" => Ok(BackendImplementation::Ldap),
            "mem" => Ok(BackendImplementation::Mem),
            other => Err(AuthzErrorKind::ConfigurationError.error_with_msg(format!(
                "Invalid configuration property \"backend.implementation\". Unknown implementation '{other}'."
            ))),
        }
    }
}
