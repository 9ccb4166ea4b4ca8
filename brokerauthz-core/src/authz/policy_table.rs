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

//! Static mapping from directory group to permitted actions.

use brokerauthz_dp::authz::AclOperation;
use brokerauthz_dp::authz::AuthorizationAction;
use brokerauthz_dp::authz::ResourceType;
use std::collections::HashMap;
use std::collections::HashSet;

/// An operation on a type of resource that membership of a group permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupAction {
    resource_type: ResourceType,
    operation: AclOperation,
}

impl GroupAction {
    /// Return a new instance.
    pub const fn new(resource_type: ResourceType, operation: AclOperation) -> Self {
        Self {
            resource_type,
            operation,
        }
    }

    /// Permitted resource type. [ResourceType::Any] matches every type.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Permitted operation. [AclOperation::All] and [AclOperation::Any] match
    /// every operation.
    pub fn operation(&self) -> AclOperation {
        self.operation
    }

    /// Return `true` if this grant covers the requested `action`.
    pub fn permits(&self, action: &AuthorizationAction) -> bool {
        (self.resource_type == ResourceType::Any || self.resource_type == action.resource_type())
            && (self.operation.is_wildcard() || self.operation == action.operation())
    }
}

/// The actions granted to members of a named directory group.
#[derive(Debug, Clone)]
pub struct GroupActionPolicy {
    group_name: String,
    actions: Vec<GroupAction>,
}

impl GroupActionPolicy {
    /// Return a new instance.
    pub fn new(group_name: &str, actions: &[GroupAction]) -> Self {
        Self {
            group_name: group_name.to_owned(),
            actions: actions.to_vec(),
        }
    }
}

/**
Immutable mapping from directory group name to permitted actions.

Group names are matched in upper case, the same way the directory providers
normalize them. Groups without a policy contribute no permissions, since a
principal commonly is a member of many groups unrelated to the broker.
*/
#[derive(Debug)]
pub struct PolicyTable {
    policies: HashMap<String, Vec<GroupAction>>,
}

impl Default for PolicyTable {
    /// The built-in table.
    fn default() -> Self {
        use AclOperation as Op;
        use ResourceType as Res;
        Self::new(&[
            GroupActionPolicy::new(
                Self::READ_GROUP,
                &[
                    GroupAction::new(Res::Topic, Op::Describe),
                    GroupAction::new(Res::Topic, Op::Read),
                    GroupAction::new(Res::Group, Op::All),
                ],
            ),
            GroupActionPolicy::new(
                Self::WRITE_GROUP,
                &[
                    GroupAction::new(Res::Topic, Op::Describe),
                    GroupAction::new(Res::Topic, Op::Write),
                    GroupAction::new(Res::Topic, Op::IdempotentWrite),
                    GroupAction::new(Res::TransactionalId, Op::Describe),
                    GroupAction::new(Res::TransactionalId, Op::Write),
                    GroupAction::new(Res::Cluster, Op::IdempotentWrite),
                ],
            ),
            GroupActionPolicy::new(Self::ADMIN_GROUP, &[GroupAction::new(Res::Any, Op::All)]),
            GroupActionPolicy::new(
                Self::SUPER_USER_GROUP,
                &[
                    GroupAction::new(Res::Cluster, Op::Describe),
                    GroupAction::new(Res::Cluster, Op::DescribeConfigs),
                    GroupAction::new(Res::Topic, Op::All),
                    GroupAction::new(Res::Group, Op::All),
                    GroupAction::new(Res::TransactionalId, Op::All),
                    GroupAction::new(Res::Cluster, Op::IdempotentWrite),
                ],
            ),
        ])
    }
}

impl PolicyTable {
    /// Consumers: describe and read topics, use consumer groups.
    pub const READ_GROUP: &'static str = "KAFKA-READ_GRP";
    /// Producers: describe and write topics, including transactions.
    pub const WRITE_GROUP: &'static str = "KAFKA-WRITE_GRP";
    /// Everything on every resource.
    pub const ADMIN_GROUP: &'static str = "KAFKA-ADMIN_GRP";
    /// Everything on topics, groups and transactions. Cluster inspection.
    pub const SUPER_USER_GROUP: &'static str = "KAFKA-SUPERUSER_GRP";

    /// Return a new instance. Policies for the same group are merged.
    pub fn new(policies: &[GroupActionPolicy]) -> Self {
        let mut ret = HashMap::<String, Vec<GroupAction>>::new();
        for policy in policies {
            let actions = ret.entry(policy.group_name.to_uppercase()).or_default();
            for action in &policy.actions {
                if !actions.contains(action) {
                    actions.push(*action);
                }
            }
        }
        Self { policies: ret }
    }

    /// Actions permitted by membership of `group_name`. Empty for unknown
    /// groups.
    pub fn actions_for(&self, group_name: &str) -> &[GroupAction] {
        self.policies
            .get(group_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Union of the actions permitted by all `group_names`.
    pub fn permitted_actions<'a, I>(&self, group_names: I) -> HashSet<GroupAction>
    where
        I: IntoIterator<Item = &'a String>,
    {
        group_names
            .into_iter()
            .flat_map(|group_name| self.actions_for(group_name))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_admin_grant_is_any_resource_all_operations() {
        let table = PolicyTable::default();
        assert_eq!(
            table.actions_for(PolicyTable::ADMIN_GROUP),
            &[GroupAction::new(ResourceType::Any, AclOperation::All)]
        );
        assert_eq!(table.actions_for(PolicyTable::READ_GROUP).len(), 3);
        assert_eq!(table.actions_for(PolicyTable::WRITE_GROUP).len(), 6);
        assert_eq!(table.actions_for(PolicyTable::SUPER_USER_GROUP).len(), 6);
    }

    #[test]
    fn test_unknown_group_has_no_actions() {
        let table = PolicyTable::default();
        assert!(table.actions_for("DOMAIN USERS").is_empty());
        assert_eq!(table.actions_for(PolicyTable::ADMIN_GROUP).len(), 1);
    }

    #[test]
    fn test_permits_wildcards() {
        let read_topic = AuthorizationAction::new(ResourceType::Topic, AclOperation::Read);
        let write_topic = AuthorizationAction::new(ResourceType::Topic, AclOperation::Write);
        let alter_cluster = AuthorizationAction::new(ResourceType::Cluster, AclOperation::Alter);
        let grant = GroupAction::new(ResourceType::Topic, AclOperation::Read);
        assert!(grant.permits(&read_topic));
        assert!(!grant.permits(&write_topic));
        let grant = GroupAction::new(ResourceType::Topic, AclOperation::Any);
        assert!(grant.permits(&write_topic));
        assert!(!grant.permits(&alter_cluster));
        let grant = GroupAction::new(ResourceType::Any, AclOperation::All);
        assert!(grant.permits(&alter_cluster));
        // A wildcard in the request is not a wildcard grant
        let any_resource = AuthorizationAction::new(ResourceType::Any, AclOperation::Read);
        assert!(!GroupAction::new(ResourceType::Topic, AclOperation::Read).permits(&any_resource));
    }

    #[test]
    fn test_custom_table_merges_and_normalizes() {
        let table = PolicyTable::new(&[
            GroupActionPolicy::new(
                "ops_grp",
                &[GroupAction::new(ResourceType::Cluster, AclOperation::Describe)],
            ),
            GroupActionPolicy::new(
                "OPS_GRP",
                &[
                    GroupAction::new(ResourceType::Cluster, AclOperation::Describe),
                    GroupAction::new(ResourceType::Cluster, AclOperation::Alter),
                ],
            ),
        ]);
        assert_eq!(table.actions_for("OPS_GRP").len(), 2);
        let permitted = table.permitted_actions(&[
            "OPS_GRP".to_string(),
            "UNRELATED".to_string(),
        ]);
        assert_eq!(permitted.len(), 2);
    }
}
