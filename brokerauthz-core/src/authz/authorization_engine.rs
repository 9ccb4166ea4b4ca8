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

//! Group based authorization of broker actions.

use super::PolicyTable;
use super::TtlCache;
use crate::util::LogScopeDuration;
use brokerauthz_dp::authz::AclBinding;
use brokerauthz_dp::authz::AuthorizationAction;
use brokerauthz_dp::authz::AuthorizationResult;
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::authz::AuthzErrorKind;
use brokerauthz_dp::directory::capabilities::GroupResolver;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Cached directory groups of a principal.
pub type GroupCache = TtlCache<Arc<HashSet<String>>>;

/**
Decides which actions a principal may perform from its directory groups.

The groups of a principal are resolved once per validity period and expanded
through the [PolicyTable]. A principal without groups is denied everything.
*/
pub struct AuthorizationEngine {
    group_resolver: Arc<dyn GroupResolver>,
    cache: Arc<GroupCache>,
    validity: Duration,
    policy_table: Arc<PolicyTable>,
}

impl AuthorizationEngine {
    /// Return a new instance.
    pub fn new(
        group_resolver: Arc<dyn GroupResolver>,
        cache: &Arc<GroupCache>,
        validity: Duration,
        policy_table: PolicyTable,
    ) -> Arc<Self> {
        Arc::new(Self {
            group_resolver,
            cache: Arc::clone(cache),
            validity,
            policy_table: Arc::new(policy_table),
        })
    }

    /// Cache of resolved groups per principal.
    pub fn cache(&self) -> &Arc<GroupCache> {
        &self.cache
    }

    /// Return one verdict per requested action in the same order.
    pub async fn authorize(
        &self,
        principal: &str,
        actions: &[AuthorizationAction],
    ) -> Result<Vec<AuthorizationResult>, AuthzError> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }
        let group_names = self.groups_for(principal).await?;
        if group_names.is_empty() {
            log::info!(
                "Principal '{principal}' is not a member of any group. Denying {} action(s).",
                actions.len()
            );
            return Ok(vec![AuthorizationResult::Denied; actions.len()]);
        }
        let permitted = self.policy_table.permitted_actions(group_names.iter());
        let results = actions
            .iter()
            .map(|action| {
                let result = AuthorizationResult::from_allowed(
                    permitted.iter().any(|grant| grant.permits(action)),
                );
                if log::log_enabled!(log::Level::Debug) {
                    log::debug!("Principal '{principal}' requested '{action}': {result}");
                }
                result
            })
            .collect();
        Ok(results)
    }

    /// Return the groups of `principal` from the cache or the directory.
    pub async fn groups_for(&self, principal: &str) -> Result<Arc<HashSet<String>>, AuthzError> {
        if let Some(group_names) = self.cache.get_if_valid(principal) {
            return Ok(group_names);
        }
        let group_names = {
            let _scope = LogScopeDuration::new(
                log::Level::Debug,
                module_path!(),
                "groups_for_user",
                Duration::from_millis(100),
            );
            self.group_resolver
                .groups_for_user(principal)
                .await
                .inspect_err(|e| {
                    log::warn!("Unable to resolve groups of '{principal}': {e}");
                })?
        };
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Principal '{principal}' is a member of {group_names:?}.");
        }
        let group_names = Arc::new(group_names);
        self.cache
            .put(principal, Arc::clone(&group_names), Some(self.validity));
        Ok(group_names)
    }

    /// Explicit access control entries are not supported.
    pub async fn create_acls(&self, _acl_bindings: &[AclBinding]) -> Result<(), AuthzError> {
        Err(Self::unsupported("create_acls"))
    }

    /// Explicit access control entries are not supported.
    pub async fn delete_acls(&self, _acl_bindings: &[AclBinding]) -> Result<(), AuthzError> {
        Err(Self::unsupported("delete_acls"))
    }

    /// Explicit access control entries are not supported.
    pub async fn acls(&self, _filter: &AclBinding) -> Result<Vec<AclBinding>, AuthzError> {
        Err(Self::unsupported("acls"))
    }

    fn unsupported(operation: &str) -> AuthzError {
        AuthzErrorKind::UnsupportedOperation.error_with_msg(format!(
            "'{operation}' is not supported. Permissions are derived from directory groups."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerauthz_dp::authz::AclOperation;
    use brokerauthz_dp::authz::ResourceType;
    use brokerauthz_dp_mem::InMemoryDirectoryProvider;

    pub fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    fn directory() -> Arc<InMemoryDirectoryProvider> {
        let directory = InMemoryDirectoryProvider::new();
        directory.add_user(
            "admin",
            "secret",
            &["CN=KAFKA-ADMIN_GRP,OU=Groups,DC=example,DC=com"],
        );
        directory.add_user(
            "reader",
            "secret",
            &["CN=KAFKA-READ_GRP,OU=Groups,DC=example,DC=com"],
        );
        directory.add_user(
            "producer",
            "secret",
            &[
                "CN=Domain Users,CN=Users,DC=example,DC=com",
                "CN=KAFKA-WRITE_GRP,OU=Groups,DC=example,DC=com",
                "CN=KAFKA-READ_GRP,OU=Groups,DC=example,DC=com",
            ],
        );
        directory.add_user(
            "outsider",
            "secret",
            &["CN=Domain Users,CN=Users,DC=example,DC=com"],
        );
        directory
    }

    fn engine_for(
        directory: &Arc<InMemoryDirectoryProvider>,
        validity: Duration,
    ) -> Arc<AuthorizationEngine> {
        AuthorizationEngine::new(
            directory.as_directory_provider().group_resolver(),
            &GroupCache::new(),
            validity,
            PolicyTable::default(),
        )
    }

    fn action(resource_type: ResourceType, operation: AclOperation) -> AuthorizationAction {
        AuthorizationAction::new(resource_type, operation)
    }

    #[tokio::test]
    async fn test_results_match_requested_actions() {
        init_logger();
        let directory = directory();
        let engine = engine_for(&directory, Duration::from_secs(60));
        let actions = [
            action(ResourceType::Topic, AclOperation::Write),
            action(ResourceType::Topic, AclOperation::Read),
            action(ResourceType::Topic, AclOperation::Write),
            action(ResourceType::Group, AclOperation::Delete),
        ];
        let results = engine.authorize("reader", &actions).await.unwrap();
        assert_eq!(
            results,
            vec![
                AuthorizationResult::Denied,
                AuthorizationResult::Allowed,
                AuthorizationResult::Denied,
                AuthorizationResult::Allowed,
            ]
        );
        assert!(engine.authorize("reader", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_groups_denies_everything() {
        init_logger();
        let directory = directory();
        let engine = engine_for(&directory, Duration::from_secs(60));
        let actions = [
            action(ResourceType::Topic, AclOperation::Read),
            action(ResourceType::Cluster, AclOperation::Describe),
        ];
        for principal in ["outsider", "unknown"] {
            let results = engine.authorize(principal, &actions).await.unwrap();
            assert_eq!(results, vec![AuthorizationResult::Denied; 2]);
        }
    }

    #[tokio::test]
    async fn test_admin_is_allowed_everything() {
        init_logger();
        let directory = directory();
        let engine = engine_for(&directory, Duration::from_secs(60));
        let actions = ResourceType::values()
            .iter()
            .flat_map(|resource_type| {
                AclOperation::values()
                    .iter()
                    .map(|operation| action(*resource_type, *operation))
            })
            .collect::<Vec<_>>();
        let results = engine.authorize("admin", &actions).await.unwrap();
        assert_eq!(results.len(), actions.len());
        assert!(results.iter().all(AuthorizationResult::is_allowed));
    }

    #[tokio::test]
    async fn test_groups_are_combined() {
        init_logger();
        let directory = directory();
        let engine = engine_for(&directory, Duration::from_secs(60));
        let actions = [
            action(ResourceType::Topic, AclOperation::Read),
            action(ResourceType::Topic, AclOperation::Write),
            action(ResourceType::TransactionalId, AclOperation::Write),
            action(ResourceType::Group, AclOperation::Read),
            action(ResourceType::Cluster, AclOperation::Alter),
        ];
        let results = engine.authorize("producer", &actions).await.unwrap();
        assert_eq!(
            results,
            vec![
                AuthorizationResult::Allowed,
                AuthorizationResult::Allowed,
                AuthorizationResult::Allowed,
                AuthorizationResult::Allowed,
                AuthorizationResult::Denied,
            ]
        );
    }

    #[tokio::test]
    async fn test_cached_groups_avoid_directory() {
        init_logger();
        let directory = directory();
        let engine = engine_for(&directory, Duration::from_secs(60));
        let actions = [action(ResourceType::Topic, AclOperation::Read)];
        engine.authorize("reader", &actions).await.unwrap();
        directory.set_available(false);
        let results = engine.authorize("reader", &actions).await.unwrap();
        assert_eq!(results, vec![AuthorizationResult::Allowed]);
        assert_eq!(directory.groups_for_user_count(), 1);
        // Empty group sets are cached as well
        directory.set_available(true);
        engine.authorize("outsider", &actions).await.unwrap();
        engine.authorize("outsider", &actions).await.unwrap();
        assert_eq!(directory.groups_for_user_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_groups_are_resolved_again() {
        init_logger();
        let directory = directory();
        let engine = engine_for(&directory, Duration::from_millis(10));
        let actions = [action(ResourceType::Topic, AclOperation::Read)];
        engine.authorize("reader", &actions).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        directory.set_available(false);
        let e = engine.authorize("reader", &actions).await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::DirectoryError);
        assert_eq!(directory.groups_for_user_count(), 2);
    }

    #[tokio::test]
    async fn test_explicit_acls_are_unsupported() {
        init_logger();
        let directory = directory();
        let engine = engine_for(&directory, Duration::from_secs(60));
        let binding = AclBinding {
            principal: "reader".to_string(),
            action: action(ResourceType::Topic, AclOperation::Read),
        };
        let e = engine
            .create_acls(std::slice::from_ref(&binding))
            .await
            .unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::UnsupportedOperation);
        let e = engine.delete_acls(&[binding.clone()]).await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::UnsupportedOperation);
        let e = engine.acls(&binding).await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::UnsupportedOperation);
    }
}
