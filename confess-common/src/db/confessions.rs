//! Queries on the `confessions` table
//!
//! The store assigns id, creation time, and slug. Timestamps are stored
//! as fixed-width RFC 3339 text (microseconds, `Z`) so lexical order is
//! chronological order.

use crate::model::{Confession, NewConfession};
use crate::{slug, Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

/// Attempts at drawing a fresh slug suffix before giving up
const MAX_SLUG_ATTEMPTS: usize = 5;

const SELECT_COLUMNS: &str = "SELECT id, target_name, message, song_url, song_embed_id, \
     is_approved, is_verified, dev_code, created_at, unique_slug, views, like_count \
     FROM confessions";

/// Insert a new confession, assigning id, timestamp, and a unique slug
pub async fn insert_confession(pool: &SqlitePool, record: &NewConfession) -> Result<Confession> {
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let confession = Confession {
            id: Uuid::new_v4(),
            target_name: record.target_name.clone(),
            message: record.message.clone(),
            song_url: record.song_url.clone(),
            song_embed_id: record.song_embed_id.clone(),
            is_approved: record.is_approved,
            is_verified: record.is_verified,
            dev_code: record.dev_code.clone(),
            created_at: Utc::now(),
            unique_slug: slug::generate(&record.target_name),
            views: Some(0),
            like_count: Some(0),
            user_has_liked: None,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO confessions (
                id, target_name, message, song_url, song_embed_id,
                is_approved, is_verified, dev_code, created_at, unique_slug
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(confession.id.to_string())
        .bind(&confession.target_name)
        .bind(&confession.message)
        .bind(&confession.song_url)
        .bind(&confession.song_embed_id)
        .bind(confession.is_approved)
        .bind(confession.is_verified)
        .bind(&confession.dev_code)
        .bind(format_timestamp(&confession.created_at))
        .bind(&confession.unique_slug)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                debug!(id = %confession.id, slug = %confession.unique_slug, "Inserted confession");
                return Ok(confession);
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!(
                    slug = %confession.unique_slug,
                    attempt,
                    "Slug collision, drawing a new suffix"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Remote(format!(
        "Could not allocate a unique slug after {} attempts",
        MAX_SLUG_ATTEMPTS
    )))
}

/// Approved confessions, newest first
pub async fn list_approved(pool: &SqlitePool) -> Result<Vec<Confession>> {
    let sql = format!(
        "{} WHERE is_approved = 1 ORDER BY created_at DESC, rowid DESC",
        SELECT_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(row_to_confession).collect()
}

/// All confessions regardless of approval, newest first
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Confession>> {
    let sql = format!("{} ORDER BY created_at DESC, rowid DESC", SELECT_COLUMNS);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(row_to_confession).collect()
}

/// Approved confession by slug; unapproved rows are treated as absent
pub async fn get_approved_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Confession>> {
    let sql = format!(
        "{} WHERE unique_slug = ? AND is_approved = 1 LIMIT 1",
        SELECT_COLUMNS
    );
    let row = sqlx::query(&sql).bind(slug).fetch_optional(pool).await?;
    row.as_ref().map(row_to_confession).transpose()
}

/// Confession by id regardless of approval
pub async fn get_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Confession>> {
    let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(row_to_confession).transpose()
}

/// `views = views + 1`; returns false if no such row
pub async fn increment_views(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE confessions SET views = views + 1 WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Add (liked) or remove (unliked) one like, never dropping below zero
///
/// Returns the new count, or None if no such row.
pub async fn adjust_like_count(pool: &SqlitePool, id: Uuid, liked: bool) -> Result<Option<i64>> {
    let delta: i64 = if liked { 1 } else { -1 };
    let count: Option<i64> = sqlx::query_scalar(
        "UPDATE confessions SET like_count = MAX(like_count + ?, 0) WHERE id = ? RETURNING like_count",
    )
    .bind(delta)
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(count)
}

/// Permanently delete a confession; returns false if no such row
pub async fn delete_confession(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM confessions WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_confession(row: &SqliteRow) -> Result<Confession> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Remote(format!("Invalid id '{}' in confessions: {}", id, e)))?;

    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Remote(format!("Invalid created_at '{}': {}", created_at, e)))?
        .with_timezone(&Utc);

    Ok(Confession {
        id,
        target_name: row.try_get("target_name")?,
        message: row.try_get("message")?,
        song_url: row.try_get("song_url")?,
        song_embed_id: row.try_get("song_embed_id")?,
        is_approved: row.try_get("is_approved")?,
        is_verified: row.try_get("is_verified")?,
        dev_code: row.try_get("dev_code")?,
        created_at,
        unique_slug: row.try_get("unique_slug")?,
        views: Some(row.try_get("views")?),
        like_count: Some(row.try_get("like_count")?),
        user_has_liked: None,
    })
}
