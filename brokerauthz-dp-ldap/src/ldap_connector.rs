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

//! LDAP implementation of the directory capabilities.

mod ldap_session;

use self::ldap_session::LdapSession;
use brokerauthz_dp::authz::AuthzError;
use brokerauthz_dp::authz::AuthzErrorKind;
use brokerauthz_dp::directory::DirectoryProvider;
use brokerauthz_dp::directory::DirectorySpec;
use brokerauthz_dp::directory::capabilities::AuthenticationOutcome;
use brokerauthz_dp::directory::capabilities::GroupResolver;
use brokerauthz_dp::directory::capabilities::UsernamePasswordAuthenticator;
use brokerauthz_dp::directory::group_names_from_member_of;
use ldap3::LdapError;
use std::collections::HashSet;
use std::sync::Arc;

/**
LDAP implementation of [UsernamePasswordAuthenticator] and [GroupResolver].

Each call uses a session of its own, so the connector can be used by any
number of concurrent tasks.
*/
pub struct LdapConnector {
    spec: DirectorySpec,
}

impl LdapConnector {
    /// Multi-valued attribute holding the DNs of a principal's groups.
    const MEMBER_OF: &'static str = "memberOf";

    /// Return a new instance.
    pub fn new(spec: DirectorySpec) -> Arc<Self> {
        log::info!("Using user DN format: '{}'", spec.user_dn("%s"));
        Arc::new(Self { spec })
    }

    /// Get [DirectoryProvider] instance.
    pub fn as_directory_provider(self: &Arc<Self>) -> DirectoryProvider {
        DirectoryProvider::new(self)
    }

    /// DN of `username` with characters that have syntactic meaning in a DN
    /// escaped.
    fn user_dn(&self, username: &str) -> String {
        self.spec.user_dn(&ldap3::dn_escape(username))
    }

    /// Search filter matching the common name `username` with filter special
    /// characters escaped.
    fn user_filter(username: &str) -> String {
        format!("(CN={})", ldap3::ldap_escape(username))
    }

    /// Map failures that are not authentication failures.
    fn as_directory_error(e: LdapError, context: &str) -> AuthzError {
        let msg = format!("{context}: {e}");
        log::warn!("{msg}");
        AuthzErrorKind::DirectoryError.error_with_msg(msg)
    }

    /// Open a session, bind as `bind_dn` and close the session again.
    async fn bind_once(
        &self,
        bind_dn: &str,
        password: &str,
    ) -> Result<AuthenticationOutcome, LdapError> {
        let mut session =
            LdapSession::open(self.spec.service_url(), self.spec.search_time_limit()).await?;
        let res = session.simple_bind(bind_dn, password).await;
        session.close().await;
        res
    }

    /// Bind as the service identity and search for the `memberOf` values of
    /// `username`.
    ///
    /// `Ok(None)` is returned when the service identity was rejected.
    async fn search_member_of(
        &self,
        session: &mut LdapSession,
        service_dn: &str,
        service_secret: &str,
        username: &str,
    ) -> Result<Option<Vec<String>>, LdapError> {
        if !session
            .simple_bind(service_dn, service_secret)
            .await?
            .is_authenticated()
        {
            return Ok(None);
        }
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Authenticated bind user: '{service_dn}'");
        }
        let filter = Self::user_filter(username);
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Getting groups for user: {filter}");
        }
        session
            .search_attribute_values(
                &self.spec.search_root(),
                &filter,
                Self::MEMBER_OF,
            )
            .await
            .map(Some)
    }
}

#[async_trait::async_trait]
impl UsernamePasswordAuthenticator for LdapConnector {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationOutcome, AuthzError> {
        // Never attempt an unauthenticated bind
        if username.trim().is_empty() || password.trim().is_empty() {
            return Ok(AuthenticationOutcome::Denied);
        }
        let user_dn = self.user_dn(username);
        let outcome = self
            .bind_once(&user_dn, password)
            .await
            .map_err(|e| Self::as_directory_error(e, &format!("Bind as '{user_dn}' failed")))?;
        if !outcome.is_authenticated() {
            log::info!("Authentication failure for user: '{username}'");
        }
        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl GroupResolver for LdapConnector {
    async fn groups_for_user(&self, username: &str) -> Result<HashSet<String>, AuthzError> {
        let service_identity = self.spec.service_identity().ok_or_else(|| {
            AuthzErrorKind::IllegalState
                .error_with_msg("Group search requires a configured service identity.")
        })?;
        if service_identity.secret().trim().is_empty() {
            log::warn!(
                "Refusing unauthenticated bind as '{}'. User '{username}' is not in any groups.",
                service_identity.name()
            );
            return Ok(HashSet::new());
        }
        let service_dn = self.user_dn(service_identity.name());
        let mut session =
            LdapSession::open(self.spec.service_url(), self.spec.search_time_limit())
                .await
                .map_err(|e| {
                    Self::as_directory_error(
                        e,
                        &format!("Unable to connect to '{}'", self.spec.service_url()),
                    )
                })?;
        let res = self
            .search_member_of(&mut session, &service_dn, service_identity.secret(), username)
            .await;
        session.close().await;
        let member_of_values = res.map_err(|e| {
            Self::as_directory_error(e, &format!("Group search for '{username}' failed"))
        })?;
        match member_of_values {
            None => {
                log::info!(
                    "Authentication failure for bind user: '{}'. User '{username}' is not in any groups.",
                    service_identity.name()
                );
                Ok(HashSet::new())
            }
            Some(member_of_values) => {
                let groups = group_names_from_member_of(member_of_values);
                if groups.is_empty() {
                    log::info!("User '{username}' is not in any groups.");
                } else if log::log_enabled!(log::Level::Debug) {
                    log::debug!("User '{username}' is in {groups:?}");
                }
                Ok(groups)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerauthz_dp::directory::ServiceIdentity;
    use brokerauthz_dp::directory::split_rdns;
    use std::time::Duration;

    /// Nothing listens on this port, so any contact attempt fails fast.
    const UNREACHABLE_URL: &str = "ldap://127.0.0.1:1";

    fn initialize_env_logger() {
        env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init()
            .map_err(|e| {
                log::trace!("Env logger for testing was probably already initialized: {e:?}")
            })
            .ok();
    }

    fn connector(with_service_identity: bool) -> Arc<LdapConnector> {
        let spec = if with_service_identity {
            DirectorySpec::with_service_identity(
                UNREACHABLE_URL,
                "dc=example,dc=com",
                "OU=Service Accounts",
                ServiceIdentity::new("kafka_admin", "admin#secret"),
            )
        } else {
            DirectorySpec::for_authentication(
                UNREACHABLE_URL,
                "dc=example,dc=com",
                "OU=Service Accounts",
            )
        };
        LdapConnector::new(spec)
    }

    #[test]
    fn test_user_dn_escapes_injection() {
        initialize_env_logger();
        let connector = connector(false);
        assert_eq!(
            connector.user_dn("kafka_user"),
            "CN=kafka_user,OU=Service Accounts,dc=example,dc=com"
        );
        let dn = connector.user_dn("evil,CN=kafka_admin");
        let rdns = split_rdns(&dn);
        // Still a single entry below the search base
        assert_eq!(rdns.len(), 4);
        assert!(rdns[0].starts_with("CN=evil\\"));
        let value = &rdns[0]["CN=".len()..];
        assert!(
            value
                .char_indices()
                .filter(|(_, c)| *c == '=')
                .all(|(pos, _)| value[..pos].ends_with('\\'))
        );
        assert_eq!(rdns[1], "OU=Service Accounts");
    }

    #[test]
    fn test_user_filter_escapes_injection() {
        assert_eq!(LdapConnector::user_filter("kafka_user"), "(CN=kafka_user)");
        let filter = LdapConnector::user_filter("*)(objectClass=*");
        assert!(!filter.contains('*'));
        assert_eq!(filter.matches('(').count(), 1);
        assert_eq!(filter.matches(')').count(), 1);
    }

    #[tokio::test]
    async fn test_blank_credentials_do_not_contact_directory() {
        initialize_env_logger();
        let connector = connector(false);
        assert_eq!(
            connector.authenticate("", "x").await.unwrap(),
            AuthenticationOutcome::Denied
        );
        assert_eq!(
            connector.authenticate("x", "").await.unwrap(),
            AuthenticationOutcome::Denied
        );
        assert_eq!(
            connector.authenticate("  ", "x").await.unwrap(),
            AuthenticationOutcome::Denied
        );
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_an_error() {
        initialize_env_logger();
        let connector = connector(true);
        let e = connector.authenticate("kafka_user", "secret?").await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::DirectoryError);
        let e = connector.groups_for_user("kafka_user").await.unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::DirectoryError);
    }

    #[tokio::test]
    async fn test_unresponsive_directory_times_out() {
        initialize_env_logger();
        // Connections complete in the accept backlog, but nothing ever replies
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ldap://{}", listener.local_addr().unwrap());
        let connector = LdapConnector::new(
            DirectorySpec::with_service_identity(
                &url,
                "dc=example,dc=com",
                "OU=Service Accounts",
                ServiceIdentity::new("kafka_admin", "admin#secret"),
            )
            .search_time_limit_override(Duration::from_millis(200)),
        );
        let e = tokio::time::timeout(
            Duration::from_secs(3),
            connector.authenticate("kafka_user", "secret?"),
        )
        .await
        .expect("authentication was not bounded by the time limit")
        .unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::DirectoryError);
        let e = tokio::time::timeout(
            Duration::from_secs(3),
            connector.groups_for_user("kafka_user"),
        )
        .await
        .expect("group resolution was not bounded by the time limit")
        .unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::DirectoryError);
        drop(listener);
    }

    #[tokio::test]
    async fn test_group_search_requires_service_identity() {
        initialize_env_logger();
        let e = connector(false)
            .groups_for_user("kafka_user")
            .await
            .unwrap_err();
        assert_eq!(e.kind(), &AuthzErrorKind::IllegalState);
    }
}
