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

//! Ephemeral in-memory directory entry.

/// Ephemeral in-memory directory entry.
pub struct InMemUser {
    password: String,
    member_of: Vec<String>,
}

impl InMemUser {
    /// Return a new instance.
    pub fn new(password: &str, member_of: &[&str]) -> Self {
        Self {
            password: password.to_owned(),
            member_of: member_of.iter().map(|dn| dn.to_string()).collect(),
        }
    }

    /// Return `true` if `password` matches.
    pub fn is_password(&self, password: &str) -> bool {
        self.password == password
    }

    /// Full DNs of the groups the user is a member of.
    pub fn member_of(&self) -> &[String] {
        &self.member_of
    }
}
