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

//! Short-lived session (connection) to the LDAP server.

use brokerauthz_dp::directory::capabilities::AuthenticationOutcome;
use ldap3::Ldap;
use ldap3::LdapConnAsync;
use ldap3::LdapConnSettings;
use ldap3::LdapError;
use ldap3::LdapResult;
use ldap3::Scope;
use ldap3::SearchEntry;
use ldap3::SearchOptions;
use std::time::Duration;

/// Short-lived session (connection) to the LDAP server.
///
/// Never shared between concurrent operations. Always finish with
/// [Self::close]. Every request, including connecting, is bounded by the
/// time limit of the session.
pub struct LdapSession {
    ldap: Ldap,
    url: String,
    time_limit: Duration,
}

impl LdapSession {
    /// LDAP result code for rejected credentials.
    const RC_INVALID_CREDENTIALS: u32 = 49;

    /// Connect to the LDAP server.
    pub async fn open(url: &str, time_limit: Duration) -> Result<Self, LdapError> {
        let settings = LdapConnSettings::new().set_conn_timeout(time_limit);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, url).await?;
        let url_clone = url.to_owned();
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                log::warn!("Connection to '{url_clone}' failed: {e}");
            }
        });
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Opened session to '{url}'.");
        }
        Ok(Self {
            ldap,
            url: url.to_owned(),
            time_limit,
        })
    }

    /// Perform a simple bind.
    ///
    /// Rejected credentials yield [AuthenticationOutcome::Denied], any other
    /// failure is an error. No response within the time limit of the session
    /// is [LdapError::Timeout].
    pub async fn simple_bind(
        &mut self,
        bind_dn: &str,
        password: &str,
    ) -> Result<AuthenticationOutcome, LdapError> {
        match self
            .ldap
            .with_timeout(self.time_limit)
            .simple_bind(bind_dn, password)
            .await
            .and_then(LdapResult::success)
        {
            Ok(_) => Ok(AuthenticationOutcome::Authenticated),
            Err(LdapError::LdapResult { result })
                if result.rc == Self::RC_INVALID_CREDENTIALS =>
            {
                log::info!("Bind rejected for '{bind_dn}': {}", result.text);
                Ok(AuthenticationOutcome::Denied)
            }
            Err(e) => Err(e),
        }
    }

    /// Subtree search that returns all values of `attribute` from all matching
    /// entries.
    ///
    /// The search is bounded both server side and client side by the time
    /// limit of the session.
    pub async fn search_attribute_values(
        &mut self,
        search_root: &str,
        filter: &str,
        attribute: &str,
    ) -> Result<Vec<String>, LdapError> {
        let (result_entries, _result) = self
            .ldap
            .with_search_options(SearchOptions::new().timelimit(self.server_time_limit_secs()))
            .with_timeout(self.time_limit)
            .search(search_root, Scope::Subtree, filter, vec![attribute])
            .await?
            .success()?;
        let mut values = Vec::new();
        for result_entry in result_entries {
            let mut search_entry = SearchEntry::construct(result_entry);
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("Search for '{filter}' matched '{}'.", search_entry.dn);
            }
            // Attribute names are case insensitive
            let key = search_entry
                .attrs
                .keys()
                .find(|key| key.eq_ignore_ascii_case(attribute))
                .cloned();
            if let Some(mut attribute_values) =
                key.and_then(|key| search_entry.attrs.remove(&key))
            {
                values.append(&mut attribute_values);
            }
        }
        Ok(values)
    }

    /// Server side time limit in whole seconds, rounded up and at least one
    /// second since zero means no limit.
    fn server_time_limit_secs(&self) -> i32 {
        Self::as_server_time_limit_secs(self.time_limit)
    }

    fn as_server_time_limit_secs(time_limit: Duration) -> i32 {
        i32::try_from(time_limit.as_millis().div_ceil(1000).max(1)).unwrap_or(i32::MAX)
    }

    /// Release the session. Failures are logged and otherwise ignored.
    pub async fn close(mut self) {
        match tokio::time::timeout(self.time_limit, self.ldap.unbind()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("Ignoring failure when closing session to '{}': {e}", self.url);
            }
            Err(_elapsed) => {
                log::warn!("Ignoring timeout when closing session to '{}'.", self.url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_time_limit_is_rounded_up() {
        let as_secs = LdapSession::as_server_time_limit_secs;
        assert_eq!(as_secs(Duration::from_millis(1500)), 2);
        assert_eq!(as_secs(Duration::from_millis(10_000)), 10);
        assert_eq!(as_secs(Duration::from_millis(10_001)), 11);
        assert_eq!(as_secs(Duration::from_millis(200)), 1);
        assert_eq!(as_secs(Duration::ZERO), 1);
        assert_eq!(as_secs(Duration::MAX), i32::MAX);
    }
}
