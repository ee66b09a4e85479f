use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// How long a cached entitlement answer stays valid.
const TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct Entry {
    has_pro: bool,
    inserted_at: Instant,
}

/// Process-wide cache of per-user Pro entitlement answers.
///
/// Entries expire after five minutes; webhook reconciliation and subscription
/// cancelation call `invalidate` so a state change is visible on the next
/// request rather than after TTL expiry.
#[derive(Debug, Clone, Default)]
pub struct ProCache {
    entries: Arc<DashMap<Uuid, Entry>>,
}

impl ProCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached answer. `now` is passed in so tests can control time.
    #[must_use]
    pub fn get(&self, user_id: Uuid, now: Instant) -> Option<bool> {
        let entry = self.entries.get(&user_id)?;
        if now.duration_since(entry.inserted_at) >= TTL {
            drop(entry);
            self.entries.remove(&user_id);
            return None;
        }
        Some(entry.has_pro)
    }

    pub fn insert(&self, user_id: Uuid, has_pro: bool, now: Instant) {
        self.entries.insert(
            user_id,
            Entry {
                has_pro,
                inserted_at: now,
            },
        );
    }

    /// Drop a single user's entry, forcing the next check to hit the database.
    pub fn invalidate(&self, user_id: Uuid) {
        self.entries.remove(&user_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_within_ttl() {
        let cache = ProCache::new();
        let user = Uuid::new_v4();
        let now = Instant::now();

        assert_eq!(cache.get(user, now), None);
        cache.insert(user, true, now);
        assert_eq!(cache.get(user, now), Some(true));
        assert_eq!(cache.get(user, now + Duration::from_secs(299)), Some(true));
    }

    #[test]
    fn expires_after_ttl() {
        let cache = ProCache::new();
        let user = Uuid::new_v4();
        let now = Instant::now();

        cache.insert(user, true, now);
        assert_eq!(cache.get(user, now + Duration::from_secs(300)), None);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ProCache::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let now = Instant::now();

        cache.insert(user, true, now);
        cache.insert(other, false, now);
        cache.invalidate(user);

        assert_eq!(cache.get(user, now), None);
        assert_eq!(cache.get(other, now), Some(false));

        cache.clear();
        assert_eq!(cache.get(other, now), None);
    }
}
