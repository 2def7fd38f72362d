use std::sync::Arc;

use serde_json::json;

use storyloom::documents::{DocumentError, apply_update};
use storyloom::store::models::{OutlineContent, OutlineStatus, VolumeOutline};
use storyloom::store::{DocumentStore, MemoryStore, StoreError};

const PROJECT: i64 = 3;

fn seed_content() -> OutlineContent {
    OutlineContent {
        volumes: vec![VolumeOutline {
            title: "Seed".to_string(),
            chapters: vec![],
            order_no: None,
        }],
    }
}

fn update_payload(title: &str) -> serde_json::Value {
    json!({
        "volumes": [
            {"title": title, "chapters": [{"title": "Ch 1", "summary": "reworked"}]}
        ]
    })
}

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .put_outline(PROJECT, "seed", seed_content(), OutlineStatus::Generated)
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn matching_version_replaces_and_bumps() {
    let store = seeded_store().await;

    let outline = apply_update(store.as_ref(), PROJECT, 1, update_payload("Edited"))
        .await
        .unwrap();
    assert_eq!(outline.version, 2);
    assert_eq!(outline.content.volumes[0].title, "Edited");
}

#[tokio::test]
async fn stale_version_is_rejected_without_write() {
    let store = seeded_store().await;
    apply_update(store.as_ref(), PROJECT, 1, update_payload("First edit"))
        .await
        .unwrap();

    let err = apply_update(store.as_ref(), PROJECT, 1, update_payload("Second edit"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Store(StoreError::VersionConflict {
            expected: 1,
            stored: 2
        })
    ));

    // The conflicting write left no trace.
    let stored = store.outline_for_project(PROJECT).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.content.volumes[0].title, "First edit");
}

#[tokio::test]
async fn concurrent_updates_with_same_expected_version_admit_one_winner() {
    let store = seeded_store().await;

    let (a, b) = tokio::join!(
        apply_update(store.as_ref(), PROJECT, 1, update_payload("Writer A")),
        apply_update(store.as_ref(), PROJECT, 1, update_payload("Writer B")),
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one writer may win the version race");
    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(
        loser,
        DocumentError::Store(StoreError::VersionConflict { .. })
    ));

    let stored = store.outline_for_project(PROJECT).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn malformed_content_is_rejected_before_any_mutation() {
    let store = seeded_store().await;

    let err = apply_update(store.as_ref(), PROJECT, 1, json!({"chapters": []}))
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::Validation { .. }));

    let stored = store.outline_for_project(PROJECT).await.unwrap().unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.content, seed_content());
}

#[tokio::test]
async fn unknown_outline_is_not_found() {
    let store = MemoryStore::new();
    let err = apply_update(&store, 999, 1, update_payload("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Store(StoreError::NotFound { what: "outline" })
    ));
}
