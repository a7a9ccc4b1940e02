// ============================================================================
// Tala Infrastructure - Slug Cache
// File: crates/tala-infrastructure/src/cache/slug_cache.rs
// ============================================================================

use std::time::{Duration, Instant};

use dashmap::DashMap;

use tala_core::domain::Organization;

/// In-process cache for slug-to-organization resolution.
///
/// Tenant resolution runs on every request, so hits are cached for `ttl`.
/// Unknown slugs are cached too (for the shorter `negative_ttl`) so a bad
/// hostname cannot turn into a database query per request.
pub struct SlugCache {
    entries: DashMap<String, CachedLookup>,
    ttl: Duration,
    negative_ttl: Duration,
}

struct CachedLookup {
    organization: Option<Organization>,
    cached_at: Instant,
}

impl SlugCache {
    pub fn new(ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            negative_ttl,
        }
    }

    /// `None` means the slug is not cached; `Some(None)` is a cached miss.
    pub fn get(&self, slug: &str) -> Option<Option<Organization>> {
        let entry = self.entries.get(slug)?;
        let ttl = if entry.organization.is_some() {
            self.ttl
        } else {
            self.negative_ttl
        };
        if entry.cached_at.elapsed() >= ttl {
            // Guard must be released before touching the shard again.
            drop(entry);
            self.entries.remove(slug);
            return None;
        }
        Some(entry.organization.clone())
    }

    pub fn insert(&self, slug: &str, organization: Option<Organization>) {
        self.entries.insert(
            slug.to_string(),
            CachedLookup {
                organization,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drops the entry so the next resolution reloads from the database.
    /// Called when an organization's slug or active flag changes.
    pub fn invalidate(&self, slug: &str) {
        self.entries.remove(slug);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tala_core::domain::OrgKind;

    fn org(slug: &str) -> Organization {
        Organization::new(
            "Acme Consulting".to_string(),
            OrgKind::Company,
            Some(slug.to_string()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_hit_roundtrip() {
        let cache = SlugCache::new(Duration::from_secs(60), Duration::from_secs(10));
        cache.insert("acme", Some(org("acme")));

        let cached = cache.get("acme").expect("entry present");
        assert_eq!(cached.unwrap().slug, "acme");
        assert!(cache.get("unknown").is_none());
    }

    #[test]
    fn test_negative_entry_is_distinct_from_uncached() {
        let cache = SlugCache::new(Duration::from_secs(60), Duration::from_secs(10));
        cache.insert("ghost", None);

        let cached = cache.get("ghost").expect("negative entry present");
        assert!(cached.is_none());
        assert!(cache.get("never-seen").is_none());
    }

    #[test]
    fn test_positive_entry_expires() {
        let cache = SlugCache::new(Duration::from_millis(20), Duration::from_millis(20));
        cache.insert("acme", Some(org("acme")));

        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("acme").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_negative_entry_expires_faster_than_hits() {
        let cache = SlugCache::new(Duration::from_secs(60), Duration::from_millis(20));
        cache.insert("acme", Some(org("acme")));
        cache.insert("ghost", None);

        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("acme").is_some());
        assert!(cache.get("ghost").is_none());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = SlugCache::new(Duration::from_secs(60), Duration::from_secs(10));
        cache.insert("acme", Some(org("acme")));
        cache.invalidate("acme");

        assert!(cache.get("acme").is_none());
        assert_eq!(cache.len(), 0);
    }
}
