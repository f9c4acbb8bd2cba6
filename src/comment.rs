//! Comment lifecycle and presentation
//!
//! Creation, editing, and soft deletion, each followed by the matching
//! cache invalidation hook, plus the display accessors the templates use.
//! Permanent erasure is owned by the admin layer; it calls
//! `CommentCache::on_comment_deleted` after its own delete.

use crate::cache::CommentCache;
use crate::ip::mask_ip;
use crate::orm::{comments, users};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Longest user-agent string we persist
const USER_AGENT_MAX_CHARS: usize = 500;

/// Inputs collected by the web layer for a new comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: i32,
    pub post_id: i32,
    pub content: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Insert a new comment in `Pending` status.
pub async fn create_comment(
    db: &DatabaseConnection,
    cache: &CommentCache,
    new: NewComment,
) -> Result<comments::Model, DbErr> {
    let now = Utc::now().naive_utc();

    let user_agent = new.user_agent.map(|ua| {
        if ua.chars().count() > USER_AGENT_MAX_CHARS {
            ua.chars().take(USER_AGENT_MAX_CHARS).collect()
        } else {
            ua
        }
    });

    let comment = comments::ActiveModel {
        author_id: Set(new.author_id),
        post_id: Set(new.post_id),
        content: Set(new.content),
        status: Set(comments::CommentStatus::Pending),
        ip_address: Set(new.ip_address),
        user_agent: Set(user_agent),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = comment.insert(db).await?;
    cache.on_comment_created(&model);
    Ok(model)
}

/// Edit a comment's content, and optionally its recorded IP address.
///
/// Does not reset the status; re-review after an edit is the caller's
/// decision via `moderation::mark_pending`.
pub async fn update_content(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
    content: String,
    ip_address: Option<String>,
) -> Result<(), DbErr> {
    let before = comment.clone();

    let mut active: comments::ActiveModel = comment.clone().into();
    active.content = Set(content);
    active.ip_address = Set(ip_address);
    active.updated_at = Set(Utc::now().naive_utc());

    let updated = active.update(db).await?;
    cache.on_comment_updated(&before, &updated);
    *comment = updated;
    Ok(())
}

/// Soft-delete a comment. Idempotent; returns whether a change occurred.
pub async fn soft_delete(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
) -> Result<bool, DbErr> {
    if comment.deleted_at.is_some() {
        return Ok(false);
    }

    let now = Utc::now().naive_utc();
    let mut active: comments::ActiveModel = comment.clone().into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);

    let updated = active.update(db).await?;
    cache.on_comment_deleted(&updated);
    *comment = updated;
    Ok(true)
}

/// Restore a soft-deleted comment. Idempotent.
pub async fn restore(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &mut comments::Model,
) -> Result<bool, DbErr> {
    if comment.deleted_at.is_none() {
        return Ok(false);
    }

    let mut active: comments::ActiveModel = comment.clone().into();
    active.deleted_at = Set(None);
    active.updated_at = Set(Utc::now().naive_utc());

    let updated = active.update(db).await?;
    cache.on_comment_restored(&updated);
    *comment = updated;
    Ok(true)
}

impl comments::Model {
    /// Display-safe IP address; the stored value is never exposed.
    pub fn masked_ip(&self) -> Option<String> {
        self.ip_address.as_deref().map(mask_ip)
    }

    /// Human-relative creation time, e.g. "5 minutes ago".
    pub fn formatted_date(&self) -> String {
        relative_from(self.created_at, Utc::now().naive_utc())
    }

    pub fn can_be_edited_by(&self, user: &users::Model) -> bool {
        user.is_admin || user.id == self.author_id
    }

    pub fn can_be_deleted_by(&self, user: &users::Model) -> bool {
        user.is_admin || user.id == self.author_id
    }
}

fn relative_from(then: NaiveDateTime, now: NaiveDateTime) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return unit_ago(minutes, "minute");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return unit_ago(hours, "hour");
    }

    let days = hours / 24;
    if days < 30 {
        return unit_ago(days, "day");
    }
    if days < 365 {
        return unit_ago(days / 30, "month");
    }
    unit_ago(days / 365, "year")
}

fn unit_ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
