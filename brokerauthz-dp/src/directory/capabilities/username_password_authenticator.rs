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

//! Directory capability for verifying a principal's own credentials.

use crate::authz::AuthzError;

/// Outcome of a credential check that reached a verdict.
///
/// Rejected credentials are an expected outcome and never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    /// The directory accepted the credentials.
    Authenticated,
    /// The directory rejected the credentials or they were blank.
    Denied,
}

impl AuthenticationOutcome {
    /// Return `true` for [Self::Authenticated].
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Verifies username and password pairs.
#[async_trait::async_trait]
pub trait UsernamePasswordAuthenticator: Send + Sync {
    /// Verify the credentials of `username`.
    ///
    /// Blank `username` or `password` must yield
    /// [AuthenticationOutcome::Denied] without contacting the directory.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationOutcome, AuthzError>;
}
