//! Comment status state machine and moderation queue
//!
//! The pending/approved/rejected transitions with their approval audit
//! trail, the auto-reject screening run on fresh comments, and the cached
//! aggregate counts the admin dashboard shows.
//!
//! All transitions are idempotent and report whether a change occurred.
//! The idempotency check is read-then-write, not compare-and-swap: two
//! concurrent approvals can both pass it, and the last writer wins on the
//! audit fields. Both end in `Approved`, so the race is accepted.

use crate::cache::CommentCache;
use crate::orm::{comments, comments::CommentStatus, users};
use crate::scopes::{self, CommentScopes};
use crate::spam;
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Approve a comment, recording who approved it and when.
///
/// The approver is optional; audit data is best-effort. A later approval
/// overwrites the audit pair. Returns `false` with no side effect when the
/// comment is already approved.
pub async fn approve(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
    approver: Option<&users::Model>,
) -> Result<bool, DbErr> {
    if comment.status.is_approved() {
        return Ok(false);
    }

    let before = comment.clone();
    let now = Utc::now().naive_utc();

    let mut active: comments::ActiveModel = comment.clone().into();
    active.status = Set(CommentStatus::Approved);
    active.approved_at = Set(Some(now));
    if let Some(approver) = approver {
        active.approved_by = Set(Some(approver.id));
    }
    active.updated_at = Set(now);

    let updated = active.update(db).await?;
    cache.on_comment_updated(&before, &updated);
    *comment = updated;
    Ok(true)
}

/// Reject a comment. Leaves any prior approval audit fields in place;
/// history is cumulative. Idempotent.
pub async fn reject(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
) -> Result<bool, DbErr> {
    if comment.status.is_rejected() {
        return Ok(false);
    }

    transition(db, cache, comment, CommentStatus::Rejected).await
}

/// Return a comment to the moderation queue, e.g. after an edit. Idempotent.
pub async fn mark_pending(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
) -> Result<bool, DbErr> {
    if comment.status.is_pending() {
        return Ok(false);
    }

    transition(db, cache, comment, CommentStatus::Pending).await
}

async fn transition(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
    status: CommentStatus,
) -> Result<bool, DbErr> {
    let before = comment.clone();

    let mut active: comments::ActiveModel = comment.clone().into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().naive_utc());

    let updated = active.update(db).await?;
    cache.on_comment_updated(&before, &updated);
    *comment = updated;
    Ok(true)
}

/// Run the classifier on a freshly created comment and reject it on a
/// positive result. Returns whether the comment was auto-rejected.
pub async fn screen_new_comment(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
) -> Result<bool, DbErr> {
    if !spam::is_potential_spam(db, cache, comment).await? {
        return Ok(false);
    }

    log::warn!(
        "comment {} by user {} auto-rejected as potential spam",
        comment.id,
        comment.author_id
    );
    reject(db, cache, comment).await?;
    Ok(true)
}

/// Aggregate status counts for the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Count active comments with the given status, cached.
pub async fn count_with_status(
    db: &DatabaseConnection,
    cache: &CommentCache,
    status: CommentStatus,
) -> Result<i64, DbErr> {
    if let Some(count) = cache.status_count(&status) {
        return Ok(count);
    }

    let count = scopes::visible()
        .with_status(Some(status.clone()))
        .count(db)
        .await? as i64;
    cache.set_status_count(&status, count);
    Ok(count)
}

/// All three status counts; the queries are independent and run concurrently.
pub async fn status_counts(
    db: &DatabaseConnection,
    cache: &CommentCache,
) -> Result<StatusCounts, DbErr> {
    let (pending, approved, rejected) = futures::join!(
        count_with_status(db, cache, CommentStatus::Pending),
        count_with_status(db, cache, CommentStatus::Approved),
        count_with_status(db, cache, CommentStatus::Rejected),
    );

    Ok(StatusCounts {
        pending: pending?,
        approved: approved?,
        rejected: rejected?,
    })
}

/// The moderation queue: pending, non-deleted comments, oldest first.
pub async fn moderation_queue(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<comments::Model>, DbErr> {
    scopes::visible()
        .with_status(Some(CommentStatus::Pending))
        .oldest_first()
        .limit(limit)
        .all(db)
        .await
}
