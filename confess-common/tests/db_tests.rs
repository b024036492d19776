//! Tests for the SQLite confession table
//!
//! Covers:
//! - Schema creation on a fresh file and re-opening an existing one
//! - Server-assigned id / timestamp / slug
//! - Approval filtering and newest-first ordering
//! - View and like counters
//! - Permanent deletion

use confess_common::db::{self, init_database, init_memory_database};
use confess_common::{slug, NewConfession};
use uuid::Uuid;

fn new_confession(target: &str, message: &str, approved: bool) -> NewConfession {
    NewConfession {
        target_name: target.to_string(),
        message: message.to_string(),
        song_url: None,
        song_embed_id: None,
        is_approved: approved,
        is_verified: false,
        dev_code: None,
    }
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("confessions.db");

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("confessions.db");

    let pool = init_database(&db_path).await.expect("first open");
    db::insert_confession(&pool, &new_confession("Alex", "hello", true))
        .await
        .expect("insert");
    pool.close().await;

    let pool = init_database(&db_path).await.expect("second open");
    let all = db::list_all(&pool).await.expect("list");
    assert_eq!(all.len(), 1, "Existing rows should survive re-open");
}

#[tokio::test]
async fn test_insert_assigns_server_fields() {
    let pool = init_memory_database().await.expect("memory db");

    let created = db::insert_confession(&pool, &new_confession("Alex Tan", "hi", true))
        .await
        .expect("insert");

    assert!(created.unique_slug.starts_with("alex-tan-"));
    assert!(slug::is_url_safe(&created.unique_slug));
    assert_eq!(created.views, Some(0));
    assert_eq!(created.like_count, Some(0));

    let fetched = db::get_by_id(&pool, created.id)
        .await
        .expect("query")
        .expect("row exists");
    assert_eq!(fetched.unique_slug, created.unique_slug);
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn test_slugs_are_unique_across_identical_names() {
    let pool = init_memory_database().await.expect("memory db");

    let mut slugs = std::collections::HashSet::new();
    for _ in 0..20 {
        let created = db::insert_confession(&pool, &new_confession("Same Name", "again", true))
            .await
            .expect("insert");
        assert!(slugs.insert(created.unique_slug), "Slug reused");
    }
}

#[tokio::test]
async fn test_list_approved_filters_and_orders_newest_first() {
    let pool = init_memory_database().await.expect("memory db");

    let first = db::insert_confession(&pool, &new_confession("A", "first", true)).await.unwrap();
    let hidden = db::insert_confession(&pool, &new_confession("B", "hidden", false)).await.unwrap();
    let last = db::insert_confession(&pool, &new_confession("C", "last", true)).await.unwrap();

    let approved = db::list_approved(&pool).await.unwrap();
    let ids: Vec<Uuid> = approved.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![last.id, first.id]);

    let all = db::list_all(&pool).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].id, hidden.id);
}

#[tokio::test]
async fn test_unapproved_slug_is_not_found() {
    let pool = init_memory_database().await.expect("memory db");

    let hidden = db::insert_confession(&pool, &new_confession("B", "hidden", false)).await.unwrap();

    let lookup = db::get_approved_by_slug(&pool, &hidden.unique_slug).await.unwrap();
    assert!(lookup.is_none());

    let missing = db::get_approved_by_slug(&pool, "no-such-slug").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_counters() {
    let pool = init_memory_database().await.expect("memory db");
    let created = db::insert_confession(&pool, &new_confession("A", "x", true)).await.unwrap();

    assert!(db::increment_views(&pool, created.id).await.unwrap());
    assert!(db::increment_views(&pool, created.id).await.unwrap());
    assert!(!db::increment_views(&pool, Uuid::new_v4()).await.unwrap());

    assert_eq!(db::adjust_like_count(&pool, created.id, true).await.unwrap(), Some(1));
    assert_eq!(db::adjust_like_count(&pool, created.id, false).await.unwrap(), Some(0));
    // Never below zero
    assert_eq!(db::adjust_like_count(&pool, created.id, false).await.unwrap(), Some(0));
    assert_eq!(db::adjust_like_count(&pool, Uuid::new_v4(), true).await.unwrap(), None);

    let fetched = db::get_by_id(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(fetched.views, Some(2));
    assert_eq!(fetched.like_count, Some(0));
}

#[tokio::test]
async fn test_delete_is_permanent() {
    let pool = init_memory_database().await.expect("memory db");
    let created = db::insert_confession(&pool, &new_confession("A", "x", true)).await.unwrap();

    assert!(db::delete_confession(&pool, created.id).await.unwrap());
    assert!(!db::delete_confession(&pool, created.id).await.unwrap());

    assert!(db::list_approved(&pool).await.unwrap().is_empty());
    assert!(db::get_approved_by_slug(&pool, &created.unique_slug).await.unwrap().is_none());
}
