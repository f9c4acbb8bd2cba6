//! Heuristic spam detection for comments
//!
//! Four ordered heuristics, first positive wins: link density, uppercase
//! ratio, minimum length, and IP frequency. The first three are pure over
//! the content; the fourth counts other active comments from the same
//! address. Thresholds come from `[spam]` configuration and default to the
//! documented values.

use crate::app_config::{self, SpamConfig};
use crate::cache::CommentCache;
use crate::orm::comments;
use crate::scopes::{self, CommentScopes};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult};
use std::collections::{HashMap, HashSet};

/// Link pattern; any occurrence of "http" counts, case-insensitive
static LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)http").expect("Invalid link regex"));

/// Count link markers in content
pub fn link_count(content: &str) -> usize {
    LINK_PATTERN.find_iter(content).count()
}

/// Fraction of alphabetic characters that are uppercase.
/// Content with no alphabetic characters has a ratio of 0.
pub fn uppercase_ratio(content: &str) -> f32 {
    let alpha_chars: Vec<char> = content.chars().filter(|c| c.is_alphabetic()).collect();
    if alpha_chars.is_empty() {
        return 0.0;
    }
    alpha_chars.iter().filter(|c| c.is_uppercase()).count() as f32 / alpha_chars.len() as f32
}

/// Apply the pure content heuristics (links, uppercase, length).
pub fn content_is_spam(content: &str, rules: &SpamConfig) -> bool {
    if link_count(content) > rules.max_links as usize {
        return true;
    }

    if uppercase_ratio(content) > rules.max_uppercase_ratio {
        return true;
    }

    if content.trim().chars().count() < rules.min_content_chars as usize {
        return true;
    }

    false
}

/// Number of *other* active comments sharing this comment's IP address.
///
/// The cache stores the self-inclusive total per address; the comment itself
/// is subtracted here, clamped at zero. Comments without an address count 0.
/// Cached for the configured IP-count TTL.
pub async fn comments_from_same_ip_count(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &comments::Model,
) -> Result<i64, DbErr> {
    let ip = match comment.ip_address.as_deref() {
        Some(ip) => ip,
        None => return Ok(0),
    };

    let total = match cache.ip_count(ip) {
        Some(total) => total,
        None => {
            let total = scopes::visible().from_ip(ip).count(db).await? as i64;
            cache.set_ip_count(ip, total);
            total
        }
    };

    Ok((total - 1).max(0))
}

/// Classify a single comment, all four heuristics with short-circuit.
///
/// The boolean result is memoized per comment id for the configured spam
/// TTL; content and IP frequency rarely change within that window. Returns
/// `false` without touching the cache when detection is disabled.
pub async fn is_potential_spam(
    db: &DatabaseConnection,
    cache: &CommentCache,
    comment: &comments::Model,
) -> Result<bool, DbErr> {
    if !app_config::spam_detection_enabled() {
        return Ok(false);
    }

    if let Some(flag) = cache.spam_flag(comment.id) {
        return Ok(flag);
    }

    let rules = app_config::spam_rules();
    let result = if content_is_spam(&comment.content, &rules) {
        true
    } else {
        // The IP query only runs when the content heuristics pass.
        comments_from_same_ip_count(db, cache, comment).await? > rules.max_comments_per_ip
    };

    cache.set_spam_flag(comment.id, result);
    Ok(result)
}

#[derive(Debug, FromQueryResult)]
struct IpFrequency {
    ip_address: String,
    count: i64,
}

/// Classify a batch of comments with a single frequency query.
///
/// Collects the distinct non-null addresses in the batch, issues one grouped
/// count over the whole active corpus, and applies every heuristic in
/// memory. Behaviorally identical to calling [`is_potential_spam`] per
/// element, at O(1) queries instead of O(n). Results are not cached; the
/// moderation queue rescans batches on demand.
pub async fn bulk_classify_spam(
    db: &DatabaseConnection,
    batch: &[comments::Model],
) -> Result<HashMap<i32, bool>, DbErr> {
    if !app_config::spam_detection_enabled() {
        return Ok(batch.iter().map(|c| (c.id, false)).collect());
    }

    let rules = app_config::spam_rules();

    let ips: Vec<String> = batch
        .iter()
        .filter_map(|c| c.ip_address.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut ip_totals: HashMap<String, i64> = HashMap::new();
    if !ips.is_empty() {
        let rows = comments::Entity::find()
            .select_only()
            .column(comments::Column::IpAddress)
            .column_as(comments::Column::Id.count(), "count")
            .filter(comments::Column::DeletedAt.is_null())
            .filter(comments::Column::IpAddress.is_in(ips))
            .group_by(comments::Column::IpAddress)
            .into_model::<IpFrequency>()
            .all(db)
            .await?;

        for row in rows {
            ip_totals.insert(row.ip_address, row.count);
        }
    }

    let mut results = HashMap::with_capacity(batch.len());
    for comment in batch {
        let spam = content_is_spam(&comment.content, &rules)
            || match comment.ip_address.as_deref() {
                Some(ip) => {
                    // Same subtract-self rule as the single-comment path.
                    let total = ip_totals.get(ip).copied().unwrap_or(0);
                    (total - 1).max(0) > rules.max_comments_per_ip
                }
                None => false,
            };
        results.insert(comment.id, spam);
    }

    Ok(results)
}
