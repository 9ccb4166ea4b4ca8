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

//! Ephemeral in-memory implementation of [DirectoryProvider].

mod inmem_user;

use self::inmem_user::InMemUser;
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::authz::AuthzErrorKind;
use brokerauthz_dp::directory::DirectoryProvider;
use brokerauthz_dp::directory::capabilities::AuthenticationOutcome;
use brokerauthz_dp::directory::capabilities::GroupResolver;
use brokerauthz_dp::directory::capabilities::UsernamePasswordAuthenticator;
use brokerauthz_dp::directory::group_names_from_member_of;
use crossbeam_skiplist::SkipMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Ephemeral in-memory implementation of [DirectoryProvider].
///
/// Common names are matched case insensitively like in a real directory.
pub struct InMemoryDirectoryProvider {
    users: SkipMap<String, InMemUser>,
    /// Service account used for group searches.
    service_identity: Option<(String, String)>,
    available: AtomicBool,
    authenticate_count: AtomicUsize,
    groups_for_user_count: AtomicUsize,
}

impl InMemoryDirectoryProvider {
    /// Return a new instance where any caller may search for groups.
    pub fn new() -> Arc<Self> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Using in-mem directory provider.");
        }
        Arc::new(Self {
            users: SkipMap::default(),
            service_identity: None,
            available: AtomicBool::new(true),
            authenticate_count: AtomicUsize::default(),
            groups_for_user_count: AtomicUsize::default(),
        })
    }

    /// Return a new instance where group searches require binding as the
    /// service identity `name` with `secret`.
    pub fn with_service_identity(name: &str, secret: &str) -> Arc<Self> {
        Arc::new(Self {
            users: SkipMap::default(),
            service_identity: Some((name.to_owned(), secret.to_owned())),
            available: AtomicBool::new(true),
            authenticate_count: AtomicUsize::default(),
            groups_for_user_count: AtomicUsize::default(),
        })
    }

    /// Get [DirectoryProvider] instance.
    pub fn as_directory_provider(self: &Arc<Self>) -> DirectoryProvider {
        DirectoryProvider::new(self)
    }

    fn as_key(username: &str) -> String {
        username.to_lowercase()
    }

    /// Add or replace a user with the full DNs of the groups it is a member
    /// of.
    pub fn add_user(&self, username: &str, password: &str, member_of: &[&str]) {
        self.users
            .insert(Self::as_key(username), InMemUser::new(password, member_of));
    }

    /// Remove a user.
    pub fn remove_user(&self, username: &str) {
        self.users.remove(&Self::as_key(username));
    }

    /// Simulate directory outage when `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Number of times the directory was contacted for authentication.
    pub fn authenticate_count(&self) -> usize {
        self.authenticate_count.load(Ordering::Relaxed)
    }

    /// Number of times the directory was contacted for group resolution.
    pub fn groups_for_user_count(&self) -> usize {
        self.groups_for_user_count.load(Ordering::Relaxed)
    }

    fn assert_available(&self) -> Result<(), AuthzError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(AuthzErrorKind::DirectoryError.error_with_msg("In-mem directory is unavailable."))
        }
    }

    fn is_password(&self, username: &str, password: &str) -> bool {
        self.users
            .get(&Self::as_key(username))
            .is_some_and(|entry| entry.value().is_password(password))
    }
}

#[async_trait::async_trait]
impl UsernamePasswordAuthenticator for InMemoryDirectoryProvider {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationOutcome, AuthzError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Ok(AuthenticationOutcome::Denied);
        }
        self.authenticate_count.fetch_add(1, Ordering::Relaxed);
        self.assert_available()?;
        if self.is_password(username, password) {
            Ok(AuthenticationOutcome::Authenticated)
        } else {
            log::info!("Authentication failure for user: '{username}'");
            Ok(AuthenticationOutcome::Denied)
        }
    }
}

#[async_trait::async_trait]
impl GroupResolver for InMemoryDirectoryProvider {
    async fn groups_for_user(&self, username: &str) -> Result<HashSet<String>, AuthzError> {
        self.groups_for_user_count.fetch_add(1, Ordering::Relaxed);
        self.assert_available()?;
        if let Some((name, secret)) = &self.service_identity
            && !self.is_password(name, secret)
        {
            log::info!("Authentication failure for bind user: '{name}'");
            return Ok(HashSet::new());
        }
        Ok(self
            .users
            .get(&Self::as_key(username))
            .map(|entry| group_names_from_member_of(entry.value().member_of()))
            .unwrap_or_default())
    }
}
