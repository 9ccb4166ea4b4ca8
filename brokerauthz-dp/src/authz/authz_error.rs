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

//! Failures of authentication and authorization decisions.

use std::error::Error;
use std::fmt;

/// Why a decision could not be made.
///
/// Rejected credentials and principals without any groups are answers, not
/// failures, and never show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzErrorKind {
    /// A directory or cache setting is missing or not a number.
    ConfigurationError,
    /// The directory could not be reached, timed out or answered with
    /// something other than an invalid credentials result.
    DirectoryError,
    /// Explicit ACL management was requested. Permissions only come from
    /// directory groups.
    UnsupportedOperation,
    /// A plugin was used before it was configured or without the input the
    /// broker must provide.
    IllegalState,
}

impl AuthzErrorKind {
    /// Create a new instance with an error message.
    pub fn error_with_msg<S: AsRef<str>>(self, msg: S) -> AuthzError {
        AuthzError {
            kind: self,
            msg: Some(msg.as_ref().to_string()),
        }
    }

    /// Create a new instance without an error message.
    pub fn error(self) -> AuthzError {
        AuthzError {
            kind: self,
            msg: None,
        }
    }

    /// Return `true` if retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DirectoryError)
    }
}

impl fmt::Display for AuthzErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/** Failure to reach an authentication or authorization decision.

The broker should treat every error as a denial of the request. Create a new
instance via [AuthzErrorKind].
*/
#[derive(Debug)]
pub struct AuthzError {
    kind: AuthzErrorKind,
    msg: Option<String>,
}

impl AuthzError {
    /// Return the type of failure.
    pub fn kind(&self) -> &AuthzErrorKind {
        &self.kind
    }

    /// Return the error message if any. Never contains credentials.
    pub fn msg(&self) -> Option<&str> {
        self.msg.as_deref()
    }
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(msg) = &self.msg {
            write!(f, "{} {}", self.kind, msg)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl Error for AuthzError {}
