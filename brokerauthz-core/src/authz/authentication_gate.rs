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

//! Cached username and password authentication.

use super::TtlCache;
use crate::util::LogScopeDuration;
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::directory::capabilities::AuthenticationOutcome;
use brokerauthz_dp::directory::capabilities::UsernamePasswordAuthenticator;
use std::sync::Arc;
use std::time::Duration;

/**
Decides whether a username and password pair is accepted by the directory.

Only successful authentications are remembered. A valid cache entry for a
username accepts any password until the entry expires.
*/
pub struct AuthenticationGate {
    authenticator: Arc<dyn UsernamePasswordAuthenticator>,
    cache: Arc<TtlCache<()>>,
    validity: Duration,
}

impl AuthenticationGate {
    /// Return a new instance.
    pub fn new(
        authenticator: Arc<dyn UsernamePasswordAuthenticator>,
        cache: &Arc<TtlCache<()>>,
        validity: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            authenticator,
            cache: Arc::clone(cache),
            validity,
        })
    }

    /// Cache of successfully authenticated usernames.
    pub fn cache(&self) -> &Arc<TtlCache<()>> {
        &self.cache
    }

    /// Return `true` if the directory accepts the credentials or a previous
    /// success for `username` is still valid.
    pub async fn is_authenticated(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthzError> {
        if self.cache.is_valid(username) {
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("Authentication of '{username}' served from cache.");
            }
            return Ok(true);
        }
        let outcome = {
            let _scope = LogScopeDuration::new(
                log::Level::Debug,
                module_path!(),
                "authenticate",
                Duration::from_millis(100),
            );
            self.authenticator
                .authenticate(username, password)
                .await
                .inspect_err(|e| {
                    log::warn!("Unable to authenticate '{username}': {e}");
                })?
        };
        match outcome {
            AuthenticationOutcome::Authenticated => {
                self.cache.put(username, (), Some(self.validity));
                log::debug!("Authenticated '{username}'.");
                Ok(true)
            }
            AuthenticationOutcome::Denied => {
                log::info!("Authentication of '{username}' was denied.");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerauthz_dp::authz::AuthzErrorKind;
    use brokerauthz_dp_mem::InMemoryDirectoryProvider;

    pub fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    fn gate_for(
        directory: &Arc<InMemoryDirectoryProvider>,
        validity: Duration,
    ) -> Arc<AuthenticationGate> {
        AuthenticationGate::new(
            directory.as_directory_provider().authenticator(),
            &TtlCache::new(),
            validity,
        )
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        init_logger();
        let directory = InMemoryDirectoryProvider::new();
        directory.add_user("alice", "secret", &[]);
        let gate = gate_for(&directory, Duration::from_secs(60));
        assert!(gate.is_authenticated("alice", "secret").await.unwrap());
        assert!(gate.cache().is_valid("alice"));
        directory.set_available(false);
        // Served from cache without contacting the directory
        assert!(gate.is_authenticated("alice", "secret").await.unwrap());
        assert_eq!(directory.authenticate_count(), 1);
    }

    #[tokio::test]
    async fn test_denial_is_not_cached() {
        init_logger();
        let directory = InMemoryDirectoryProvider::new();
        directory.add_user("bob", "secret", &[]);
        let gate = gate_for(&directory, Duration::from_secs(60));
        assert!(!gate.is_authenticated("bob", "wrong").await.unwrap());
        assert!(gate.cache().is_empty());
        assert!(!gate.is_authenticated("bob", "wrong").await.unwrap());
        assert_eq!(directory.authenticate_count(), 2);
        assert!(gate.is_authenticated("bob", "secret").await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_credentials_are_denied() {
        init_logger();
        let directory = InMemoryDirectoryProvider::new();
        directory.add_user("carol", "secret", &[]);
        let gate = gate_for(&directory, Duration::from_secs(60));
        assert!(!gate.is_authenticated("carol", "").await.unwrap());
        assert!(!gate.is_authenticated("", "secret").await.unwrap());
        assert_eq!(directory.authenticate_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_success_requires_directory() {
        init_logger();
        let directory = InMemoryDirectoryProvider::new();
        directory.add_user("dave", "secret", &[]);
        let gate = gate_for(&directory, Duration::from_millis(10));
        assert!(gate.is_authenticated("dave", "secret").await.unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        directory.set_available(false);
        let e = gate.is_authenticated("dave", "secret").await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::DirectoryError);
    }
}
