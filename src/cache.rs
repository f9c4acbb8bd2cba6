//! Caching for derived comment data.
//!
//! Three kinds of values are memoized: per-comment spam-check results,
//! per-IP comment counts, and aggregate status counts for the dashboard.
//! Each carries its own TTL, so a single moka cache with a per-entry expiry
//! policy backs all of them.
//!
//! The store sits behind the [`CacheStore`] trait so the classifier and the
//! state machine can be tested against an in-memory fake. Implementations
//! fail open: an unreachable store reads as a miss and writes are
//! best-effort, so a cache outage degrades to recomputation instead of
//! blocking moderation.
//!
//! Invalidation is explicit. The persisting caller invokes the matching
//! `on_comment_*` hook after a successful commit; nothing is wired into the
//! entities themselves. There is a narrow window between commit and hook in
//! which a concurrent reader can observe a stale value; the TTLs bound it.

use crate::orm::comments::{self, CommentStatus};
use moka::sync::Cache;
use moka::Expiry;
use sea_orm::Iterable;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached derived value
#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue {
    Flag(bool),
    Count(i64),
}

impl CachedValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            CachedValue::Flag(flag) => Some(*flag),
            CachedValue::Count(_) => None,
        }
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            CachedValue::Count(count) => Some(*count),
            CachedValue::Flag(_) => None,
        }
    }
}

/// Keyed store with per-entry TTL. Misses and storage failures are
/// indistinguishable; `set` and `delete` are best-effort.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedValue>;
    fn set(&self, key: &str, value: CachedValue, ttl: Duration);
    fn delete(&self, key: &str);
}

#[derive(Clone)]
struct Entry {
    value: CachedValue,
    ttl: Duration,
}

struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _now: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory store backed by moka, with LRU eviction at the capacity bound.
pub struct MokaStore {
    cache: Cache<String, Entry>,
}

impl MokaStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .expire_after(EntryExpiry)
                .build(),
        }
    }
}

impl CacheStore for MokaStore {
    fn get(&self, key: &str) -> Option<CachedValue> {
        self.cache.get(key).map(|entry| entry.value)
    }

    fn set(&self, key: &str, value: CachedValue, ttl: Duration) {
        self.cache.insert(key.to_string(), Entry { value, ttl });
    }

    fn delete(&self, key: &str) {
        self.cache.invalidate(key);
    }
}

/// TTLs for each category of cached value.
///
/// Pending counts feed the live moderation queue and expire faster than the
/// other status counts.
#[derive(Clone, Debug)]
pub struct CacheTtl {
    pub spam_result: Duration,
    pub ip_count: Duration,
    pub status_count: Duration,
    pub pending_count: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            spam_result: Duration::from_secs(300),
            ip_count: Duration::from_secs(600),
            status_count: Duration::from_secs(900),
            pending_count: Duration::from_secs(300),
        }
    }
}

/// Typed facade over a [`CacheStore`]: key construction, TTL selection, and
/// the lifecycle invalidation hooks.
pub struct CommentCache {
    store: Arc<dyn CacheStore>,
    ttl: CacheTtl,
}

impl CommentCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: CacheTtl) -> Self {
        Self { store, ttl }
    }

    /// Build a moka-backed cache sized and timed from the global config.
    pub fn from_config() -> Self {
        Self::new(
            Arc::new(MokaStore::new(crate::app_config::cache_capacity())),
            crate::app_config::cache_ttl(),
        )
    }

    fn spam_key(comment_id: i32) -> String {
        format!("comment.spam.{}", comment_id)
    }

    fn ip_count_key(ip: &str) -> String {
        format!("comment.ip_count.{}", ip)
    }

    fn status_count_key(status: &CommentStatus) -> String {
        format!("comment.count.{}", status.as_str())
    }

    pub fn spam_flag(&self, comment_id: i32) -> Option<bool> {
        self.store
            .get(&Self::spam_key(comment_id))
            .and_then(|v| v.as_flag())
    }

    pub fn set_spam_flag(&self, comment_id: i32, flag: bool) {
        self.store.set(
            &Self::spam_key(comment_id),
            CachedValue::Flag(flag),
            self.ttl.spam_result,
        );
    }

    pub fn ip_count(&self, ip: &str) -> Option<i64> {
        self.store
            .get(&Self::ip_count_key(ip))
            .and_then(|v| v.as_count())
    }

    pub fn set_ip_count(&self, ip: &str, count: i64) {
        self.store.set(
            &Self::ip_count_key(ip),
            CachedValue::Count(count),
            self.ttl.ip_count,
        );
    }

    pub fn status_count(&self, status: &CommentStatus) -> Option<i64> {
        self.store
            .get(&Self::status_count_key(status))
            .and_then(|v| v.as_count())
    }

    pub fn set_status_count(&self, status: &CommentStatus, count: i64) {
        let ttl = if status.is_pending() {
            self.ttl.pending_count
        } else {
            self.ttl.status_count
        };
        self.store
            .set(&Self::status_count_key(status), CachedValue::Count(count), ttl);
    }

    fn clear_status_counts(&self) {
        for status in CommentStatus::iter() {
            self.store.delete(&Self::status_count_key(&status));
        }
    }

    fn clear_ip_count(&self, ip: Option<&str>) {
        if let Some(ip) = ip {
            self.store.delete(&Self::ip_count_key(ip));
        }
    }

    /// Post-commit hook for a newly inserted comment.
    pub fn on_comment_created(&self, comment: &comments::Model) {
        log::debug!("cache: invalidating for created comment {}", comment.id);
        self.clear_status_counts();
        self.clear_ip_count(comment.ip_address.as_deref());
    }

    /// Post-commit hook for an updated comment. When the IP address changed,
    /// both the old and the new address lose their frequency entries.
    pub fn on_comment_updated(&self, before: &comments::Model, after: &comments::Model) {
        log::debug!("cache: invalidating for updated comment {}", after.id);
        self.clear_status_counts();
        self.store.delete(&Self::spam_key(after.id));
        if before.ip_address != after.ip_address {
            self.clear_ip_count(before.ip_address.as_deref());
            self.clear_ip_count(after.ip_address.as_deref());
        }
    }

    /// Post-commit hook for a deleted comment, soft or permanent.
    pub fn on_comment_deleted(&self, comment: &comments::Model) {
        log::debug!("cache: invalidating for deleted comment {}", comment.id);
        self.clear_status_counts();
        self.store.delete(&Self::spam_key(comment.id));
        self.clear_ip_count(comment.ip_address.as_deref());
    }

    /// Post-commit hook for a restored comment. A restored row re-enters
    /// every derived count, so the clears mirror deletion.
    pub fn on_comment_restored(&self, comment: &comments::Model) {
        log::debug!("cache: invalidating for restored comment {}", comment.id);
        self.clear_status_counts();
        self.store.delete(&Self::spam_key(comment.id));
        self.clear_ip_count(comment.ip_address.as_deref());
    }
}
