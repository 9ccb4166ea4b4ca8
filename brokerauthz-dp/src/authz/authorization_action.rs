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

//! Requested actions and their verdicts.

use super::AclOperation;
use super::ResourceType;
use std::fmt;
use std::str::FromStr;

/// The atomic unit being checked: an operation on a type of resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorizationAction {
    resource_type: ResourceType,
    operation: AclOperation,
    /// Name of the targeted resource. Only used for logging.
    resource_name: Option<String>,
}

impl AuthorizationAction {
    /// Return a new instance.
    pub fn new(resource_type: ResourceType, operation: AclOperation) -> Self {
        Self {
            resource_type,
            operation,
            resource_name: None,
        }
    }

    /// Return a new instance targeting a named resource.
    pub fn with_resource_name(
        resource_type: ResourceType,
        operation: AclOperation,
        resource_name: &str,
    ) -> Self {
        Self {
            resource_type,
            operation,
            resource_name: Some(resource_name.to_owned()),
        }
    }

    /// Type of the targeted resource.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Requested operation.
    pub fn operation(&self) -> AclOperation {
        self.operation
    }

    /// Name of the targeted resource, if known.
    pub fn resource_name(&self) -> Option<&str> {
        self.resource_name.as_deref()
    }
}

impl fmt::Display for AuthorizationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(resource_name) = &self.resource_name {
            write!(
                f,
                "{}:{}:{resource_name}",
                self.resource_type, self.operation
            )
        } else {
            write!(f, "{}:{}", self.resource_type, self.operation)
        }
    }
}

impl FromStr for AuthorizationAction {
    type Err = String;

    /// Parse `resource_type:operation` with an optional `:resource_name`
    /// suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let resource_type = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| {
                format!("Action '{s}' is missing resource type. (Format: 'type:operation')")
            })?
            .parse::<ResourceType>()?;
        let operation = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| {
                format!("Action '{s}' is missing operation. (Format: 'type:operation')")
            })?
            .parse::<AclOperation>()?;
        Ok(Self {
            resource_type,
            operation,
            resource_name: parts.next().map(str::to_string),
        })
    }
}

/// Verdict for a single [AuthorizationAction].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationResult {
    /// The action is allowed.
    Allowed,
    /// The action is denied.
    Denied,
}

impl AuthorizationResult {
    /// Map `true` to [Self::Allowed] and `false` to [Self::Denied].
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }

    /// Return `true` for [Self::Allowed].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for AuthorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "ALLOWED"),
            Self::Denied => write!(f, "DENIED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        let action = "topic:read".parse::<AuthorizationAction>().unwrap();
        assert_eq!(action.resource_type(), ResourceType::Topic);
        assert_eq!(action.operation(), AclOperation::Read);
        assert_eq!(action.resource_name(), None);
        let action = "cluster:idempotent_write:broker01:9092"
            .parse::<AuthorizationAction>()
            .unwrap();
        assert_eq!(action.operation(), AclOperation::IdempotentWrite);
        assert_eq!(action.resource_name(), Some("broker01:9092"));
        assert!("topic".parse::<AuthorizationAction>().is_err());
        assert!("topic:".parse::<AuthorizationAction>().is_err());
        assert!("topic:fly".parse::<AuthorizationAction>().is_err());
    }
}
