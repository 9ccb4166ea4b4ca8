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

//! Parsing of application configuration.

mod backend_config;
mod cache_config;
mod ldap_config;
mod plugin_properties;

use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::authz::AuthzErrorKind;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::builder::BuilderState;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub use self::backend_config::BackendConfig;
pub use self::backend_config::BackendImplementation;
pub use self::cache_config::CacheConfig;
pub use self::ldap_config::LdapConfig;
pub use self::plugin_properties::PluginProperties;

/// Package version reported by Cargo at build time.
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Static trait for tracking implementations.
trait AppConfigDefaults {
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError>;
}

/// Parse a setting holding a number of milliseconds.
fn parse_millis(value: &str, setting_name: &str) -> Result<Duration, AuthzError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| {
            log::debug!("Failed to parse '{setting_name}': {e}");
            AuthzErrorKind::ConfigurationError
                .error_with_msg(format!("Invalid configuration property \"{setting_name}\"."))
        })
}

/// Return the value unmodified or fail when blank.
fn require_non_blank<'a>(value: &'a str, setting_name: &str) -> Result<&'a str, AuthzError> {
    if value.trim().is_empty() {
        Err(AuthzErrorKind::ConfigurationError.error_with_msg(format!(
            "Missing required configuration property \"{setting_name}\"."
        )))
    } else {
        Ok(value)
    }
}

/**
Application configration root.

The application name defaults to the Rust package name, but can be overridden
with the environment variable `APP_NAME`.

When running stand-alone, configuration will be loaded from

1. the file `{application name}.json` in the current working directory.
2. environment variable overrides in the form
   `{APPLICATION_NAME}_MODULE_CONFIGKEYWITHOUTSPACES`

When embedded in a broker, configuration is instead parsed from the plugin
properties. See [PluginProperties].
 */
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Directory service location and service identity.
    pub ldap: LdapConfig,
    /// Validity of cached authentications and group memberships.
    pub cache: CacheConfig,
    /// Directory provider implementation.
    pub backend: BackendConfig,

    /// Lower case application name. Ignored when loading configuration.
    #[serde(skip_deserializing)]
    app_name: String,
}

impl AppConfig {
    /// The application name defaults to the Rust package name, but can be
    /// overridden with the environment variable `APP_NAME`.
    fn read_app_name_lowercase(cargo_pkg_name: &str) -> String {
        std::env::var("APP_NAME")
            .map_err(|e| {
                log::debug!(
                    "Environment variable APP_NAME: {e:?} -> Default app name '{cargo_pkg_name}' will be used."
                );
            })
            .ok()
            .map(|value| value.to_lowercase())
            .unwrap_or(cargo_pkg_name.to_owned())
    }

    /// Lower case application name.
    pub fn app_name_lowercase(&self) -> &str {
        &self.app_name
    }

    /// SemVer application version derived fromt the Rust package version.
    pub fn app_version(&self) -> &'static str {
        CARGO_PKG_VERSION
    }

    /** Creates a new instance pre-populated with defaults, an optional
    configurations file and environment variable overrides.

    Use `env!("CARGO_PKG_NAME")` as `cargo_pkg_name`.
    */
    pub fn new(cargo_pkg_name: &str) -> Result<Self, AuthzError> {
        let app_name = Self::read_app_name_lowercase(cargo_pkg_name);
        let config_filename = app_name.to_owned() + ".json";
        let config_env_prefix = &app_name.to_uppercase();
        let conf_file = std::env::current_dir()
            .map_err(|e| {
                AuthzErrorKind::ConfigurationError
                    .error_with_msg(format!("Unable to resolve working directory: {e}"))
            })?
            .join(config_filename);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Will load '{}' configuration if present.",
                conf_file.display()
            );
        }
        let mut app_config: AppConfig = Self::build(&conf_file, config_env_prefix)
            .map_err(|e| {
                AuthzErrorKind::ConfigurationError
                    .error_with_msg(format!("Unable to load configuration: {e}"))
            })?;
        app_config.app_name = app_name;
        app_config.validate()?;
        log::info!("Running with configuration: {app_config:?}");
        Ok(app_config)
    }

    fn build(conf_file: &std::path::Path, config_env_prefix: &str) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder();
        config_builder = LdapConfig::set_defaults(config_builder, "ldap")?;
        config_builder = CacheConfig::set_defaults(config_builder, "cache")?;
        config_builder = BackendConfig::set_defaults(config_builder, "backend")?;
        config_builder
            .add_source(File::from(conf_file).required(false))
            .add_source(
                Environment::with_prefix(config_env_prefix)
                    .separator("_")
                    .list_separator(","),
            )
            .build()?
            .try_deserialize()
    }

    /** Creates a new instance for group based authorization from broker
    plugin properties.

    Every directory setting is required, including the service identity used
    to search for group memberships.
    */
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, AuthzError> {
        let properties = PluginProperties::new(properties);
        let app_config = Self {
            ldap: LdapConfig::from_plugin_properties(&properties, true)?,
            cache: CacheConfig::from_plugin_properties(&properties)?,
            backend: BackendConfig::default(),
            app_name: String::default(),
        };
        app_config.validate()?;
        log::info!("Running with configuration: {app_config:?}");
        Ok(app_config)
    }

    /** Creates a new instance for authentication from broker plugin
    properties.

    The service identity is not required since only the credentials of the
    end-user are verified.
    */
    pub fn from_authentication_properties(
        properties: &HashMap<String, String>,
    ) -> Result<Self, AuthzError> {
        let properties = PluginProperties::new(properties);
        let app_config = Self {
            ldap: LdapConfig::from_plugin_properties(&properties, false)?,
            cache: CacheConfig::from_plugin_properties(&properties)?,
            backend: BackendConfig::default(),
            app_name: String::default(),
        };
        app_config.validate()?;
        log::info!("Running with configuration: {app_config:?}");
        Ok(app_config)
    }

    /// Fail with [AuthzErrorKind::ConfigurationError] naming the first
    /// invalid setting.
    fn validate(&self) -> Result<(), AuthzError> {
        let implementation = self.backend.implementation()?;
        if implementation == BackendImplementation::Ldap {
            self.ldap.directory_spec()?;
        }
        self.cache.validity()?;
        Ok(())
    }
}
