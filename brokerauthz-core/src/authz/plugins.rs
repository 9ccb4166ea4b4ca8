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

//! Entry points for embedding in a message broker.

use super::AccessControl;
use crate::conf::AppConfig;
use brokerauthz_dp::authz::AclBinding;
use brokerauthz_dp::authz::AuthorizationAction;
use brokerauthz_dp::authz::AuthorizationResult;
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::authz::AuthzErrorKind;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

/// Creates the [AccessControl] from the parsed plugin properties.
pub type AccessControlFactory =
    Box<dyn Fn(&AppConfig) -> Result<Arc<AccessControl>, AuthzError> + Send + Sync>;

/// Shared state of the plugins: a factory and what it created once
/// configured.
struct ConfigurableAccessControl {
    factory: AccessControlFactory,
    access_control: OnceLock<Arc<AccessControl>>,
}

impl ConfigurableAccessControl {
    fn new(factory: AccessControlFactory) -> Self {
        Self {
            factory,
            access_control: OnceLock::new(),
        }
    }

    fn configure(&self, app_config: &AppConfig) -> Result<(), AuthzError> {
        let access_control = (self.factory)(app_config)?;
        self.access_control.set(access_control).map_err(|_| {
            AuthzErrorKind::IllegalState.error_with_msg("Plugin has already been configured.")
        })
    }

    fn get(&self) -> Result<&Arc<AccessControl>, AuthzError> {
        self.access_control.get().ok_or_else(|| {
            AuthzErrorKind::IllegalState.error_with_msg("Plugin has not been configured.")
        })
    }
}

/**
Verifies SASL `PLAIN` credentials against the directory.

[Self::configure] must be invoked once before any call to [Self::handle].
*/
pub struct LdapAuthenticationPlugin {
    inner: ConfigurableAccessControl,
}

impl Default for LdapAuthenticationPlugin {
    fn default() -> Self {
        Self::with_factory(Box::new(AccessControl::new))
    }
}

impl LdapAuthenticationPlugin {
    /// The only supported SASL mechanism.
    pub const SASL_MECHANISM: &'static str = "PLAIN";

    /// Return a new instance that will use `factory` when configured.
    pub fn with_factory(factory: AccessControlFactory) -> Self {
        Self {
            inner: ConfigurableAccessControl::new(factory),
        }
    }

    /// Configure the plugin from broker properties.
    ///
    /// Fails with [AuthzErrorKind::ConfigurationError] unless `sasl_mechanism`
    /// is `PLAIN` and the required properties are present.
    pub fn configure(
        &self,
        properties: &HashMap<String, String>,
        sasl_mechanism: &str,
    ) -> Result<(), AuthzError> {
        if sasl_mechanism != Self::SASL_MECHANISM {
            return Err(AuthzErrorKind::ConfigurationError.error_with_msg(format!(
                "Unsupported SASL mechanism '{sasl_mechanism}'. Only '{}' is supported.",
                Self::SASL_MECHANISM
            )));
        }
        let app_config = AppConfig::from_authentication_properties(properties)?;
        self.inner.configure(&app_config)?;
        log::info!("Authentication plugin configured.");
        Ok(())
    }

    /// Return `true` if the credentials are accepted.
    ///
    /// Fails with [AuthzErrorKind::IllegalState] when the plugin is not
    /// configured or the broker did not supply both the username and the
    /// password.
    pub async fn handle(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<bool, AuthzError> {
        let access_control = self.inner.get()?;
        let (Some(username), Some(password)) = (username, password) else {
            return Err(AuthzErrorKind::IllegalState
                .error_with_msg("Both the username and the password must be provided."));
        };
        access_control.authenticate(username, password).await
    }
}

/**
Authorizes broker requests from the directory groups of the principal.

[Self::configure] must be invoked once before any other call.
*/
pub struct LdapAuthorizerPlugin {
    inner: ConfigurableAccessControl,
}

impl Default for LdapAuthorizerPlugin {
    fn default() -> Self {
        Self::with_factory(Box::new(AccessControl::new))
    }
}

impl LdapAuthorizerPlugin {
    /// Return a new instance that will use `factory` when configured.
    pub fn with_factory(factory: AccessControlFactory) -> Self {
        Self {
            inner: ConfigurableAccessControl::new(factory),
        }
    }

    /// Configure the plugin from broker properties.
    pub fn configure(&self, properties: &HashMap<String, String>) -> Result<(), AuthzError> {
        let app_config = AppConfig::from_properties(properties)?;
        self.inner.configure(&app_config)?;
        log::info!("Authorizer plugin configured.");
        Ok(())
    }

    /// See [AccessControl::authorize].
    pub async fn authorize(
        &self,
        principal: &str,
        actions: &[AuthorizationAction],
    ) -> Result<Vec<AuthorizationResult>, AuthzError> {
        self.inner.get()?.authorize(principal, actions).await
    }

    /// See [AccessControl::create_acls].
    pub async fn create_acls(&self, acl_bindings: &[AclBinding]) -> Result<(), AuthzError> {
        self.inner.get()?.create_acls(acl_bindings).await
    }

    /// See [AccessControl::delete_acls].
    pub async fn delete_acls(&self, acl_bindings: &[AclBinding]) -> Result<(), AuthzError> {
        self.inner.get()?.delete_acls(acl_bindings).await
    }

    /// See [AccessControl::acls].
    pub async fn acls(&self, filter: &AclBinding) -> Result<Vec<AclBinding>, AuthzError> {
        self.inner.get()?.acls(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::PolicyTable;
    use crate::authz::SharedCaches;
    use brokerauthz_dp::authz::AclOperation;
    use brokerauthz_dp::authz::ResourceType;
    use brokerauthz_dp_mem::InMemoryDirectoryProvider;

    pub fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    fn properties() -> HashMap<String, String> {
        [
            ("ldap.url", "ldap://ldap.example.com:389"),
            ("ldap.base.dn", "DC=example,DC=com"),
            ("ldap.search.base", "OU=Users"),
            ("ldap.user", "kafka_service"),
            ("ldap.password", "service#secret"),
            ("ldap.auth.cache.validity.millis", "60000"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    fn in_mem_factory(directory: &Arc<InMemoryDirectoryProvider>) -> AccessControlFactory {
        let directory = Arc::clone(directory);
        Box::new(move |app_config: &AppConfig| {
            Ok(AccessControl::with_directory_provider(
                &directory.as_directory_provider(),
                &SharedCaches::default(),
                app_config.cache.validity()?,
                PolicyTable::default(),
            ))
        })
    }

    fn directory() -> Arc<InMemoryDirectoryProvider> {
        let directory = InMemoryDirectoryProvider::with_service_identity(
            "kafka_service",
            "service#secret",
        );
        directory.add_user("kafka_service", "service#secret", &[]);
        directory.add_user(
            "kafka_user",
            "secret?",
            &["CN=KAFKA-READ_GRP,OU=Groups,DC=example,DC=com"],
        );
        directory
    }

    #[tokio::test]
    async fn test_authentication_plugin() {
        init_logger();
        let directory = directory();
        let plugin = LdapAuthenticationPlugin::with_factory(in_mem_factory(&directory));
        let e = plugin
            .handle(Some("kafka_user"), Some("secret?"))
            .await
            .unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::IllegalState);
        let e = plugin.configure(&properties(), "GSSAPI").unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::ConfigurationError);
        plugin.configure(&properties(), "PLAIN").unwrap();
        assert!(
            !plugin
                .handle(Some("kafka_user"), Some("wrong"))
                .await
                .unwrap()
        );
        assert!(
            plugin
                .handle(Some("kafka_user"), Some("secret?"))
                .await
                .unwrap()
        );
        assert_eq!(directory.authenticate_count(), 2);
        // A valid cached success accepts the username regardless of password
        assert!(
            plugin
                .handle(Some("kafka_user"), Some("wrong"))
                .await
                .unwrap()
        );
        assert_eq!(directory.authenticate_count(), 2);
        let e = plugin.handle(Some("kafka_user"), None).await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::IllegalState);
        let e = plugin.configure(&properties(), "PLAIN").unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::IllegalState);
    }

    #[tokio::test]
    async fn test_authorizer_plugin() {
        init_logger();
        let directory = directory();
        let plugin = LdapAuthorizerPlugin::with_factory(in_mem_factory(&directory));
        let actions = [
            AuthorizationAction::with_resource_name(
                ResourceType::Topic,
                AclOperation::Read,
                "orders",
            ),
            AuthorizationAction::with_resource_name(
                ResourceType::Topic,
                AclOperation::Write,
                "orders",
            ),
        ];
        let e = plugin.authorize("kafka_user", &actions).await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::IllegalState);
        let mut incomplete = properties();
        incomplete.remove("ldap.password");
        let e = plugin.configure(&incomplete).unwrap_err();
        assert_eq!(
            e.msg(),
            Some("Missing required configuration property \"ldap.password\".")
        );
        plugin.configure(&properties()).unwrap();
        let results = plugin.authorize("kafka_user", &actions).await.unwrap();
        assert_eq!(
            results,
            vec![AuthorizationResult::Allowed, AuthorizationResult::Denied]
        );
        let binding = AclBinding {
            principal: "kafka_user".to_string(),
            action: actions[0].clone(),
        };
        let e = plugin.acls(&binding).await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::UnsupportedOperation);
    }
}
