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

//! Directory group based authentication and authorization.

mod authentication_gate;
mod authorization_engine;
mod plugins;
mod policy_table;
mod ttl_cache;

pub use self::authentication_gate::*;
pub use self::authorization_engine::*;
pub use self::plugins::*;
pub use self::policy_table::*;
pub use self::ttl_cache::*;

use crate::conf::AppConfig;
use crate::conf::BackendImplementation;
use brokerauthz_dp::authz::AclBinding;
use brokerauthz_dp::authz::AuthorizationAction;
use brokerauthz_dp::authz::AuthorizationResult;
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::directory::DirectoryProvider;
use brokerauthz_dp_ldap::LdapConnector;
use brokerauthz_dp_mem::InMemoryDirectoryProvider;
use std::sync::Arc;
use std::time::Duration;

/// Caches that outlive a single [AccessControl] instance.
///
/// Cloning shares the same underlying caches.
#[derive(Clone)]
pub struct SharedCaches {
    authentications: Arc<TtlCache<()>>,
    groups: Arc<GroupCache>,
}

impl Default for SharedCaches {
    fn default() -> Self {
        Self {
            authentications: TtlCache::new(),
            groups: GroupCache::new(),
        }
    }
}

impl SharedCaches {
    /// Usernames with a recent successful authentication.
    pub fn authentications(&self) -> &Arc<TtlCache<()>> {
        &self.authentications
    }

    /// Recently resolved groups per principal.
    pub fn groups(&self) -> &Arc<GroupCache> {
        &self.groups
    }
}

/// Access controller.
pub struct AccessControl {
    authentication_gate: Arc<AuthenticationGate>,
    authorization_engine: Arc<AuthorizationEngine>,
}

impl AccessControl {
    /// Return a new instance using the configured directory provider and the
    /// built-in [PolicyTable].
    pub fn new(app_config: &AppConfig) -> Result<Arc<Self>, AuthzError> {
        let directory_provider = match app_config.backend.implementation()? {
            BackendImplementation::Ldap => {
                LdapConnector::new(app_config.ldap.directory_spec()?).as_directory_provider()
            }
            BackendImplementation::Mem => {
                log::warn!("Using ephemeral in-memory directory. Every principal will be denied.");
                InMemoryDirectoryProvider::new().as_directory_provider()
            }
        };
        Ok(Self::with_directory_provider(
            &directory_provider,
            &SharedCaches::default(),
            app_config.cache.validity()?,
            PolicyTable::default(),
        ))
    }

    /// Return a new instance using the provided directory and caches.
    pub fn with_directory_provider(
        directory_provider: &DirectoryProvider,
        caches: &SharedCaches,
        validity: Duration,
        policy_table: PolicyTable,
    ) -> Arc<Self> {
        Arc::new(Self {
            authentication_gate: AuthenticationGate::new(
                directory_provider.authenticator(),
                caches.authentications(),
                validity,
            ),
            authorization_engine: AuthorizationEngine::new(
                directory_provider.group_resolver(),
                caches.groups(),
                validity,
                policy_table,
            ),
        })
    }

    /// Usernames with a recent successful authentication.
    pub fn authentication_cache(&self) -> &Arc<TtlCache<()>> {
        self.authentication_gate.cache()
    }

    /// Recently resolved groups per principal.
    pub fn group_cache(&self) -> &Arc<GroupCache> {
        self.authorization_engine.cache()
    }

    /// See [AuthenticationGate::is_authenticated].
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool, AuthzError> {
        self.authentication_gate
            .is_authenticated(username, password)
            .await
    }

    /// See [AuthorizationEngine::authorize].
    pub async fn authorize(
        &self,
        principal: &str,
        actions: &[AuthorizationAction],
    ) -> Result<Vec<AuthorizationResult>, AuthzError> {
        self.authorization_engine.authorize(principal, actions).await
    }

    /// See [AuthorizationEngine::create_acls].
    pub async fn create_acls(&self, acl_bindings: &[AclBinding]) -> Result<(), AuthzError> {
        self.authorization_engine.create_acls(acl_bindings).await
    }

    /// See [AuthorizationEngine::delete_acls].
    pub async fn delete_acls(&self, acl_bindings: &[AclBinding]) -> Result<(), AuthzError> {
        self.authorization_engine.delete_acls(acl_bindings).await
    }

    /// See [AuthorizationEngine::acls].
    pub async fn acls(&self, filter: &AclBinding) -> Result<Vec<AclBinding>, AuthzError> {
        self.authorization_engine.acls(filter).await
    }
}
