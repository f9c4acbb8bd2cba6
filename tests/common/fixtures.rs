//! Test fixtures for creating test data
#![allow(dead_code)]

use broadsheet::cache::{CacheStore, CacheTtl, CachedValue, CommentCache, MokaStore};
use broadsheet::comment::{create_comment, NewComment};
use broadsheet::orm::{comments, posts, users};
use chrono::Utc;
use dashmap::DashMap;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use std::sync::Arc;
use std::time::Duration;

/// A moka-backed cache with default TTLs, fresh per test
pub fn test_cache() -> CommentCache {
    CommentCache::new(Arc::new(MokaStore::new(1_000)), CacheTtl::default())
}

/// Create a test user
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    is_admin: bool,
) -> Result<users::Model, DbErr> {
    let user = users::ActiveModel {
        name: Set(name.to_string()),
        email: Set(Some(format!("{}@example.com", name))),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    user.insert(db).await
}

/// Create a test post
pub async fn create_test_post(
    db: &DatabaseConnection,
    author_id: i32,
    title: &str,
) -> Result<posts::Model, DbErr> {
    let post = posts::ActiveModel {
        author_id: Set(author_id),
        title: Set(title.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    post.insert(db).await
}

/// Create a comment through the production creation path, so the cache
/// invalidation hooks fire like they would behind the web layer.
pub async fn create_test_comment(
    db: &DatabaseConnection,
    cache: &CommentCache,
    author_id: i32,
    post_id: i32,
    content: &str,
    ip: Option<&str>,
) -> Result<comments::Model, DbErr> {
    create_comment(
        db,
        cache,
        NewComment {
            author_id,
            post_id,
            content: content.to_string(),
            ip_address: ip.map(str::to_string),
            user_agent: Some("Mozilla/5.0 (test)".to_string()),
        },
    )
    .await
}

/// Cache store fake that records deletions, for invalidation assertions.
#[derive(Default)]
pub struct RecordingStore {
    entries: DashMap<String, CachedValue>,
    deletions: DashMap<String, u32>,
}

impl RecordingStore {
    pub fn was_deleted(&self, key: &str) -> bool {
        self.deletions.contains_key(key)
    }

    pub fn deletion_count(&self, key: &str) -> u32 {
        self.deletions.get(key).map(|n| *n).unwrap_or(0)
    }
}

impl CacheStore for RecordingStore {
    fn get(&self, key: &str) -> Option<CachedValue> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: CachedValue, _ttl: Duration) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
        *self.deletions.entry(key.to_string()).or_insert(0) += 1;
    }
}
