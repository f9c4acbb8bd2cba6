//! SeaORM Entity for comments table
//!
//! The status column is a string-backed enum; parsing and serialization
//! happen at the persistence boundary only. Rows are soft-deleted by
//! setting `deleted_at`; default reads go through `crate::scopes::visible`.

use sea_orm::entity::prelude::*;

/// Moderation status of a comment
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[derive(Default)]
pub enum CommentStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl CommentStatus {
    /// Returns true if the comment is awaiting review
    pub fn is_pending(&self) -> bool {
        matches!(self, CommentStatus::Pending)
    }

    /// Returns true if the comment was approved for display
    pub fn is_approved(&self) -> bool {
        matches!(self, CommentStatus::Approved)
    }

    /// Returns true if the comment was rejected
    pub fn is_rejected(&self) -> bool {
        matches!(self, CommentStatus::Rejected)
    }

    /// The stored string form, also used in cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub author_id: i32,
    pub post_id: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub status: CommentStatus,
    /// Stored unmasked; masked only at the presentation boundary.
    #[sea_orm(column_type = "String(Some(45))", nullable)]
    pub ip_address: Option<String>,
    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub user_agent: Option<String>,
    /// Audit pair with `approved_by`. Reflects the last approval and is
    /// never cleared by a later reject or mark-pending transition.
    pub approved_at: Option<DateTime>,
    pub approved_by: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::posts::Entity",
        from = "Column::PostId",
        to = "super::posts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ApprovedBy",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    ApprovedByUser,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
