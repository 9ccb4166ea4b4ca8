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

//! Broker resource types.

use std::fmt;
use std::str::FromStr;

/// Type of broker resource an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    /// Unrecognized resource type.
    Unknown,
    /// Wildcard that matches any resource type when granted.
    Any,
    /// A topic.
    Topic,
    /// A consumer group.
    Group,
    /// The cluster itself.
    Cluster,
    /// A transactional producer identifier.
    TransactionalId,
    /// A delegation token.
    DelegationToken,
    /// A user principal.
    User,
}

impl ResourceType {
    const ALL_VALUES: [Self; 8] = [
        Self::Unknown,
        Self::Any,
        Self::Topic,
        Self::Group,
        Self::Cluster,
        Self::TransactionalId,
        Self::DelegationToken,
        Self::User,
    ];

    /// Return all resource types.
    pub fn values() -> &'static [Self] {
        &Self::ALL_VALUES
    }

    /// Snake case name of the resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Any => "any",
            Self::Topic => "topic",
            Self::Group => "group",
            Self::Cluster => "cluster",
            Self::TransactionalId => "transactional_id",
            Self::DelegationToken => "delegation_token",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL_VALUES
            .iter()
            .find(|value| value.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown resource type '{s}'."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_type() {
        assert_eq!(
            "transactional_id".parse::<ResourceType>(),
            Ok(ResourceType::TransactionalId)
        );
        assert_eq!("TOPIC".parse::<ResourceType>(), Ok(ResourceType::Topic));
        assert_eq!(
            "delegation-token".parse::<ResourceType>(),
            Ok(ResourceType::DelegationToken)
        );
        assert!("queue".parse::<ResourceType>().is_err());
    }
}
