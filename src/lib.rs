//! broadsheet — comment moderation and spam detection core.
//!
//! This crate owns the comment entity of a blog/news publishing application:
//! its pending/approved/rejected state machine and approval audit trail, a
//! heuristic spam classifier with TTL caching, the cache invalidation
//! protocol for comment lifecycle events, and the query scopes consumed by
//! the moderation queue and public listings.
//!
//! The HTTP layer, templating, sessions, and form validation are external
//! collaborators. They hand this crate a `sea_orm::DatabaseConnection` and a
//! [`cache::CommentCache`] and call the operations in [`comment`],
//! [`moderation`], and [`spam`].

pub mod app_config;
pub mod cache;
pub mod comment;
pub mod ip;
pub mod moderation;
pub mod orm;
pub mod scopes;
pub mod spam;
