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

//! Time-to-live cache of successful directory lookups.

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// Cached value with its own creation time and validity window.
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    validity: Duration,
}

impl<V> CacheEntry<V> {
    /// Return `true` if `now` is before `created_at + validity`.
    ///
    /// A validity that overflows the clock never expires.
    fn is_valid_at(&self, now: Instant) -> bool {
        self.created_at
            .checked_add(self.validity)
            .is_none_or(|expires_at| now < expires_at)
    }
}

/**
Lock-less key to value store where each value expires individually.

Each `put` atomically replaces the entry of the key, so readers never observe a
partially written entry. There is no background eviction: expired entries
remain until they are overwritten by a later `put` for the same key or the
cache is dropped.
*/
pub struct TtlCache<V> {
    entries: SkipMap<String, CacheEntry<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + 'static,
{
    /// Validity of entries when none is specified.
    pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Return a new instance.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: SkipMap::default(),
        })
    }

    /// Store `value` under `key` with the current time as creation time.
    ///
    /// `validity` defaults to [Self::DEFAULT_VALIDITY].
    pub fn put(&self, key: &str, value: V, validity: Option<Duration>) {
        let validity = validity.unwrap_or(Self::DEFAULT_VALIDITY);
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Caching '{key}' for {} ms.", validity.as_millis());
        }
        self.entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                created_at: Instant::now(),
                validity,
            },
        );
    }

    /// Return the last stored value for `key` regardless of expiry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().value.clone())
    }

    /// Return `true` if there is an unexpired entry for `key`.
    pub fn is_valid(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.value().is_valid_at(Instant::now()))
    }

    /// Return the value for `key` if it has not expired.
    pub fn get_if_valid(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        let valid = entry.value().is_valid_at(Instant::now());
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Cached value for '{key}' valid: {valid}");
        }
        valid.then(|| entry.value().value.clone())
    }

    /// Number of entries including expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if nothing was ever stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_get_if_valid_returns_unexpired_value() {
        let cache = TtlCache::<String>::new();
        cache.put("hello", "world!!!".to_string(), None);
        assert!(cache.is_valid("hello"));
        assert_eq!(cache.get_if_valid("hello").as_deref(), Some("world!!!"));
        assert_eq!(cache.get_if_valid("unknown"), None);
        assert!(!cache.is_valid("unknown"));
    }

    #[test]
    fn test_get_if_valid_ignores_expired_value() {
        let cache = TtlCache::<String>::new();
        cache.put("hello", "world!!!".to_string(), Some(Duration::from_millis(10)));
        sleep(Duration::from_millis(15));
        assert!(!cache.is_valid("hello"));
        assert_eq!(cache.get_if_valid("hello"), None);
        // Still physically present
        assert_eq!(cache.get("hello").as_deref(), Some("world!!!"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_validity_is_never_valid() {
        let cache = TtlCache::<u32>::new();
        cache.put("key", 1, Some(Duration::ZERO));
        assert!(!cache.is_valid("key"));
        assert_eq!(cache.get("key"), Some(1));
    }

    #[test]
    fn test_put_overwrites_and_renews() {
        let cache = TtlCache::<u32>::new();
        cache.put("key", 1, Some(Duration::from_millis(10)));
        sleep(Duration::from_millis(15));
        assert_eq!(cache.get_if_valid("key"), None);
        cache.put("key", 2, None);
        assert_eq!(cache.get_if_valid("key"), Some(2));
        assert_eq!(cache.get("key"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_default_validity_is_one_day() {
        assert_eq!(
            TtlCache::<()>::DEFAULT_VALIDITY,
            Duration::from_secs(86_400)
        );
        let cache = TtlCache::<()>::new();
        cache.put("key", (), None);
        let entry = cache.entries.get("key").unwrap();
        assert_eq!(entry.value().validity, Duration::from_secs(86_400));
        assert!(cache.is_valid("key"));
    }

    #[test]
    fn test_concurrent_put_and_get() {
        let cache = TtlCache::<(usize, usize)>::new();
        std::thread::scope(|scope| {
            for writer in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..1_000 {
                        cache.put(&format!("key{}", i % 16), (writer, i), None);
                        if let Some((w, v)) = cache.get_if_valid(&format!("key{}", i % 16)) {
                            // Entries are never observed half written
                            assert!(w < 8);
                            assert_eq!(v % 16, i % 16);
                        }
                    }
                });
            }
        });
        assert_eq!(cache.len(), 16);
    }
}
