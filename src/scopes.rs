//! Composable query scopes for the comments table
//!
//! The sole intended read path for filtered comment collections. Deletion
//! visibility is chosen at the entry point; the composable filters each
//! align with one of the table's indexes.

use crate::orm::comments::{self, CommentStatus};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, Select};

/// Active comments only (`deleted_at IS NULL`). The default entry point.
pub fn visible() -> Select<comments::Entity> {
    comments::Entity::find().filter(comments::Column::DeletedAt.is_null())
}

/// All comments, soft-deleted included. For audit and recovery reads.
pub fn with_deleted() -> Select<comments::Entity> {
    comments::Entity::find()
}

/// Soft-deleted comments only. For trash views.
pub fn only_deleted() -> Select<comments::Entity> {
    comments::Entity::find().filter(comments::Column::DeletedAt.is_not_null())
}

/// Filter and ordering predicates over a comment selection. Compose freely,
/// e.g. `visible().for_post(id).with_status(Some(Approved)).newest_first()`.
pub trait CommentScopes {
    /// Filter by status; `None` matches any status. Uses `(status, created_at)`.
    fn with_status(self, status: Option<CommentStatus>) -> Self;
    /// Comments on one post. Uses `(post_id, status)`.
    fn for_post(self, post_id: i32) -> Self;
    /// Comments by one author. Uses `(author_id, created_at)`.
    fn by_author(self, author_id: i32) -> Self;
    /// Comments from one IP address. Uses `(ip_address)`.
    fn from_ip(self, ip: &str) -> Self;
    fn oldest_first(self) -> Self;
    fn newest_first(self) -> Self;
    /// The `limit` newest comments.
    fn most_recent(self, limit: u64) -> Self;
    /// Approved in the given window, inclusive start; an absent end means
    /// "now". Uses `(approved_at)`.
    fn approved_between(self, from: NaiveDateTime, until: Option<NaiveDateTime>) -> Self;
}

impl CommentScopes for Select<comments::Entity> {
    fn with_status(self, status: Option<CommentStatus>) -> Self {
        match status {
            Some(status) => self.filter(comments::Column::Status.eq(status)),
            None => self,
        }
    }

    fn for_post(self, post_id: i32) -> Self {
        self.filter(comments::Column::PostId.eq(post_id))
    }

    fn by_author(self, author_id: i32) -> Self {
        self.filter(comments::Column::AuthorId.eq(author_id))
    }

    fn from_ip(self, ip: &str) -> Self {
        self.filter(comments::Column::IpAddress.eq(ip))
    }

    fn oldest_first(self) -> Self {
        self.order_by_asc(comments::Column::CreatedAt)
    }

    fn newest_first(self) -> Self {
        self.order_by_desc(comments::Column::CreatedAt)
    }

    fn most_recent(self, limit: u64) -> Self {
        self.newest_first().limit(limit)
    }

    fn approved_between(self, from: NaiveDateTime, until: Option<NaiveDateTime>) -> Self {
        let until = until.unwrap_or_else(|| Utc::now().naive_utc());
        self.filter(comments::Column::ApprovedAt.gte(from))
            .filter(comments::Column::ApprovedAt.lte(until))
    }
}
