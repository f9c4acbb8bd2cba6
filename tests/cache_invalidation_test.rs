//! Integration tests for the comment cache invalidation protocol
//! Uses a recording fake store to assert which entries each lifecycle event
//! clears, plus end-to-end freshness checks over the real cache.
mod common;

use common::{database::*, fixtures::*};

use broadsheet::cache::{CacheTtl, CommentCache};
use broadsheet::comment::{restore, soft_delete, update_content};
use broadsheet::spam::comments_from_same_ip_count;
use std::sync::Arc;

fn recording_cache() -> (Arc<RecordingStore>, CommentCache) {
    let store = Arc::new(RecordingStore::default());
    let cache = CommentCache::new(store.clone(), CacheTtl::default());
    (store, cache)
}

const STATUS_KEYS: [&str; 3] = [
    "comment.count.pending",
    "comment.count.approved",
    "comment.count.rejected",
];

#[tokio::test]
async fn test_create_clears_counts_and_ip_entry() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (store, cache) = recording_cache();

    let user = create_test_user(&db, "alice", false).await.expect("user");
    let post = create_test_post(&db, user.id, "First Post").await.expect("post");

    create_test_comment(&db, &cache, user.id, post.id, "fresh comment", Some("10.0.0.1"))
        .await
        .expect("comment");

    for key in STATUS_KEYS {
        assert!(store.was_deleted(key), "expected {} cleared on create", key);
    }
    assert!(store.was_deleted("comment.ip_count.10.0.0.1"));
}

#[tokio::test]
async fn test_update_with_ip_change_clears_both_addresses() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (store, cache) = recording_cache();

    let user = create_test_user(&db, "alice", false).await.expect("user");
    let post = create_test_post(&db, user.id, "First Post").await.expect("post");
    let mut comment =
        create_test_comment(&db, &cache, user.id, post.id, "original text", Some("10.0.0.1"))
            .await
            .expect("comment");

    let created_clears = store.deletion_count("comment.ip_count.10.0.0.1");

    update_content(
        &db,
        &cache,
        &mut comment,
        "revised text".to_string(),
        Some("10.0.0.2".to_string()),
    )
    .await
    .expect("update");

    assert_eq!(comment.content, "revised text");
    assert_eq!(comment.ip_address.as_deref(), Some("10.0.0.2"));

    assert!(store.deletion_count("comment.ip_count.10.0.0.1") > created_clears);
    assert!(store.was_deleted("comment.ip_count.10.0.0.2"));
    assert!(store.was_deleted(&format!("comment.spam.{}", comment.id)));
    for key in STATUS_KEYS {
        assert!(store.was_deleted(key), "expected {} cleared on update", key);
    }
}

#[tokio::test]
async fn test_update_without_ip_change_spares_frequency_entry() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (store, cache) = recording_cache();

    let user = create_test_user(&db, "alice", false).await.expect("user");
    let post = create_test_post(&db, user.id, "First Post").await.expect("post");
    let mut comment =
        create_test_comment(&db, &cache, user.id, post.id, "original text", Some("10.0.0.1"))
            .await
            .expect("comment");

    let created_clears = store.deletion_count("comment.ip_count.10.0.0.1");

    update_content(
        &db,
        &cache,
        &mut comment,
        "revised text".to_string(),
        Some("10.0.0.1".to_string()),
    )
    .await
    .expect("update");

    // Same address: the frequency entry is untouched by the update hook
    assert_eq!(
        store.deletion_count("comment.ip_count.10.0.0.1"),
        created_clears
    );
    assert!(store.was_deleted(&format!("comment.spam.{}", comment.id)));
}

#[tokio::test]
async fn test_delete_and_restore_clear_derived_entries() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (store, cache) = recording_cache();

    let user = create_test_user(&db, "alice", false).await.expect("user");
    let post = create_test_post(&db, user.id, "First Post").await.expect("post");
    let mut comment =
        create_test_comment(&db, &cache, user.id, post.id, "here today", Some("10.0.0.3"))
            .await
            .expect("comment");

    let spam_key = format!("comment.spam.{}", comment.id);
    let ip_key = "comment.ip_count.10.0.0.3";

    let clears_before = store.deletion_count(ip_key);
    assert!(soft_delete(&db, &cache, &mut comment).await.expect("soft delete"));
    assert!(comment.deleted_at.is_some());
    assert!(store.was_deleted(&spam_key));
    assert!(store.deletion_count(ip_key) > clears_before);

    // Idempotent: a second delete fires no hook
    let clears_after_delete = store.deletion_count(ip_key);
    assert!(!soft_delete(&db, &cache, &mut comment).await.expect("soft delete again"));
    assert_eq!(store.deletion_count(ip_key), clears_after_delete);

    // Restore clears the same set
    assert!(restore(&db, &cache, &mut comment).await.expect("restore"));
    assert!(comment.deleted_at.is_none());
    assert!(store.deletion_count(ip_key) > clears_after_delete);

    assert!(!restore(&db, &cache, &mut comment).await.expect("restore again"));
}

#[tokio::test]
async fn test_transitions_invalidate_status_counts() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (store, cache) = recording_cache();

    let user = create_test_user(&db, "alice", false).await.expect("user");
    let admin = create_test_user(&db, "admin", true).await.expect("admin");
    let post = create_test_post(&db, user.id, "First Post").await.expect("post");
    let mut comment = create_test_comment(&db, &cache, user.id, post.id, "pending text", None)
        .await
        .expect("comment");

    let pending_clears = store.deletion_count("comment.count.pending");
    let spam_key = format!("comment.spam.{}", comment.id);

    broadsheet::moderation::approve(&db, &cache, &mut comment, Some(&admin))
        .await
        .expect("approve");

    assert!(store.deletion_count("comment.count.pending") > pending_clears);
    assert!(store.was_deleted(&spam_key));
}

/// Freshness end-to-end: the IP frequency count follows creations because
/// the create hook drops the cached total.
#[tokio::test]
async fn test_ip_count_stays_fresh_across_creates() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let cache = test_cache();

    let user = create_test_user(&db, "alice", false).await.expect("user");
    let post = create_test_post(&db, user.id, "First Post").await.expect("post");
    let ip = "10.9.9.9";

    let first = create_test_comment(&db, &cache, user.id, post.id, "first of several", Some(ip))
        .await
        .expect("comment");
    create_test_comment(&db, &cache, user.id, post.id, "second of several", Some(ip))
        .await
        .expect("comment");

    assert_eq!(
        comments_from_same_ip_count(&db, &cache, &first).await.expect("count"),
        1
    );

    // The cached total would now say 2; a new arrival clears it
    create_test_comment(&db, &cache, user.id, post.id, "third of several", Some(ip))
        .await
        .expect("comment");

    assert_eq!(
        comments_from_same_ip_count(&db, &cache, &first).await.expect("count"),
        2
    );
}
