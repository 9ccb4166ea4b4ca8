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

//! Directory Provider abstraction

pub mod capabilities;
mod directory_spec;
mod distinguished_name;

pub use self::directory_spec::*;
pub use self::distinguished_name::*;

use self::capabilities::*;
use std::sync::Arc;

/// The Directory Provider.
///
/// Implementation logic is split into narrow capabilities, so that callers
/// only depend on what they need. A single connector type usually implements
/// all of them.
pub struct DirectoryProvider {
    authenticator: Arc<dyn UsernamePasswordAuthenticator>,
    group_resolver: Arc<dyn GroupResolver>,
}

impl DirectoryProvider {
    /// Return a new instance backed by a connector implementing every
    /// capability.
    pub fn new<T>(connector: &Arc<T>) -> Self
    where
        T: UsernamePasswordAuthenticator + GroupResolver + 'static,
    {
        Self {
            authenticator: Arc::clone(connector) as Arc<dyn UsernamePasswordAuthenticator>,
            group_resolver: Arc::clone(connector) as Arc<dyn GroupResolver>,
        }
    }

    /// Return a new instance from separate capability implementations.
    pub fn from_capabilities(
        authenticator: Arc<dyn UsernamePasswordAuthenticator>,
        group_resolver: Arc<dyn GroupResolver>,
    ) -> Self {
        Self {
            authenticator,
            group_resolver,
        }
    }

    /// See [UsernamePasswordAuthenticator].
    pub fn authenticator(&self) -> Arc<dyn UsernamePasswordAuthenticator> {
        Arc::clone(&self.authenticator)
    }

    /// See [GroupResolver].
    pub fn group_resolver(&self) -> Arc<dyn GroupResolver> {
        Arc::clone(&self.group_resolver)
    }
}
