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

//! Distinguished name parsing.

use std::collections::HashSet;

/// Split a distinguished name into its trimmed relative names on every comma
/// that isn't escaped with a backslash.
pub fn split_rdns(dn: &str) -> Vec<&str> {
    let mut ret = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (pos, c) in dn.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ',' => {
                ret.push(dn[start..pos].trim());
                start = pos + c.len_utf8();
            }
            _ => {}
        }
    }
    ret.push(dn[start..].trim());
    ret
}

/// Remove RFC 4514 escaping from an attribute value.
///
/// Both `\,` style escapes and `\2c` style hex pairs are decoded. A trailing
/// lone backslash is kept as-is.
pub fn unescape_attribute_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut ret = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'\\' || pos + 1 == bytes.len() {
            ret.push(bytes[pos]);
            pos += 1;
            continue;
        }
        let hex_pair = bytes
            .get(pos + 1..pos + 3)
            .filter(|pair| pair.iter().all(u8::is_ascii_hexdigit))
            .and_then(|pair| std::str::from_utf8(pair).ok())
            .and_then(|pair| u8::from_str_radix(pair, 16).ok());
        if let Some(byte) = hex_pair {
            ret.push(byte);
            pos += 3;
        } else {
            // Escaped character. Multi-byte characters are copied as-is.
            ret.push(bytes[pos + 1]);
            pos += 2;
        }
    }
    String::from_utf8_lossy(&ret).into_owned()
}

/**
Extract the group name from a full group DN of a `memberOf` value.

The first relative name with the common name (`CN`) attribute type and a
non-empty value is unescaped and upper cased. Relative names without a value,
like a bare leading `CN` marker, are skipped.
*/
pub fn group_name_from_member_of(member_of: &str) -> Option<String> {
    split_rdns(member_of).into_iter().find_map(|rdn| {
        let (attribute_type, value) = rdn.split_once('=')?;
        let value = value.trim();
        (attribute_type.trim().eq_ignore_ascii_case("CN") && !value.is_empty())
            .then(|| unescape_attribute_value(value).to_uppercase())
    })
}

/// Extract group names from all `memberOf` values. Values without a common
/// name are ignored.
pub fn group_names_from_member_of<I, S>(member_of_values: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups = HashSet::new();
    for member_of in member_of_values {
        let member_of = member_of.as_ref();
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("memberOf from directory: '{member_of}'");
        }
        if let Some(group_name) = group_name_from_member_of(member_of) {
            groups.insert(group_name);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rdns_respects_escapes() {
        assert_eq!(
            split_rdns("CN=kafka_user,OU=Service Accounts, dc=example,dc=com"),
            vec!["CN=kafka_user", "OU=Service Accounts", "dc=example", "dc=com"]
        );
        assert_eq!(
            split_rdns(r"CN=Doe\, John,OU=People"),
            vec![r"CN=Doe\, John", "OU=People"]
        );
        assert_eq!(
            split_rdns(r"CN=back\\,OU=People"),
            vec![r"CN=back\\", "OU=People"]
        );
    }

    #[test]
    fn test_group_name_from_member_of() {
        assert_eq!(
            group_name_from_member_of("CN=Kafka-Read_Grp,OU=Groups,DC=example,DC=com"),
            Some("KAFKA-READ_GRP".to_string())
        );
        assert_eq!(
            group_name_from_member_of("cn=kafka-admin_grp,ou=groups,dc=example,dc=com"),
            Some("KAFKA-ADMIN_GRP".to_string())
        );
        // Leading bare marker is skipped
        assert_eq!(
            group_name_from_member_of("CN,CN=KAFKA-WRITE_GRP,OU=Groups"),
            Some("KAFKA-WRITE_GRP".to_string())
        );
        // Attribute types that only start with "CN" don't count
        assert_eq!(
            group_name_from_member_of("CNAME=alias,CN=KAFKA-SUPERUSER_GRP"),
            Some("KAFKA-SUPERUSER_GRP".to_string())
        );
        // Only the first common name counts
        assert_eq!(
            group_name_from_member_of("CN=first,CN=second,OU=Groups"),
            Some("FIRST".to_string())
        );
        assert_eq!(group_name_from_member_of("OU=Groups,DC=example"), None);
        assert_eq!(group_name_from_member_of(""), None);
    }

    #[test]
    fn test_escaped_group_name_is_decoded() {
        assert_eq!(
            group_name_from_member_of(r"CN=Doe\, John,OU=People,DC=example,DC=com"),
            Some("DOE, JOHN".to_string())
        );
        assert_eq!(
            group_name_from_member_of(r"CN=KAFKA\2dREAD_GRP,OU=Groups"),
            Some("KAFKA-READ_GRP".to_string())
        );
        assert_eq!(unescape_attribute_value(r"a\=b\\c\+d"), r"a=b\c+d");
        assert_eq!(unescape_attribute_value(r"caf\c3\a9"), "café");
        assert_eq!(unescape_attribute_value(r"\\"), r"\");
        assert_eq!(unescape_attribute_value("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_group_names_collapse_duplicates() {
        let groups = group_names_from_member_of([
            "CN=KAFKA-READ_GRP,OU=Groups,DC=example,DC=com",
            "CN=kafka-read_grp,OU=Other,DC=example,DC=com",
            "OU=NoCommonName,DC=example,DC=com",
            "CN=Domain Users,OU=Groups,DC=example,DC=com",
        ]);
        assert_eq!(groups.len(), 2);
        assert!(groups.contains("KAFKA-READ_GRP"));
        assert!(groups.contains("DOMAIN USERS"));
    }
}
