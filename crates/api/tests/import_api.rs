//! HTTP-level integration tests for the import endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener. The in-memory store stands in for
//! Postgres.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{body_json, get, post_empty, post_file, post_json};
use inventra_core::entity::{AssetFields, AssetRecord, NewReference, ReferenceEntity, ReferenceKind};
use inventra_core::types::DbId;
use inventra_import::{EntityStore, MemoryStore, StoreError};
use serde_json::json;

async fn analyze(app: &axum::Router, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(app.clone(), "/api/v1/imports/analyze", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Analyze
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_returns_preview_without_writing() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(Arc::clone(&store));

    let data = analyze(
        &app,
        json!({
            "rows": [
                { "Name": "Desk", "Vendor": "Acme", "Colour": "red" },
                { "Serial Number": "SN9" }
            ],
            "auto_create_entities": true
        }),
    )
    .await;

    assert_eq!(data["status"], "preview");
    assert_eq!(data["counts"]["total"], 2);
    assert_eq!(data["counts"]["create"], 1);
    assert_eq!(data["counts"]["skip"], 1);
    assert_eq!(data["ignored_columns"], json!(["Colour"]));
    assert_eq!(data["decisions"][1]["outcome"], "skip");
    assert_eq!(data["decisions"][1]["errors"][0]["message"], "Name is required.");

    assert!(store.assets().is_empty());
    assert!(store.references(ReferenceKind::Vendor).is_empty());
}

#[tokio::test]
async fn analyze_rejects_empty_rows() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let response = post_json(app, "/api/v1/imports/analyze", json!({ "rows": [] })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn analyze_rejects_non_object_rows() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let response = post_json(
        app,
        "/api/v1/imports/analyze",
        json!({ "rows": [{ "Name": "Desk" }, 42] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INGESTION_ERROR");
}

#[tokio::test]
async fn decisions_are_served_per_session() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let data = analyze(&app, json!({ "rows": [{ "Name": "Desk" }] })).await;
    let id = data["session_id"].as_str().unwrap();

    let response = get(app, &format!("/api/v1/imports/{id}/decisions")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["outcome"], "create");
    assert_eq!(json["data"][0]["row"]["name"], "Desk");
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_csv_is_analyzed() {
    let store = Arc::new(MemoryStore::new());
    store.insert_reference(ReferenceKind::Location, "Warehouse", None);
    let app = common::build_test_app(store);

    let csv = "Name,Location,Serial Number\nDrill,warehouse,D-1\nSaw,Garage,S-1\n";
    let response = post_file(
        app,
        "/api/v1/imports/analyze/upload",
        "inventory.csv",
        "text/csv",
        csv,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["counts"]["total"], 2);
    assert_eq!(data["counts"]["create"], 1);
    assert_eq!(data["counts"]["skip"], 1);
    assert_eq!(data["decisions"][1]["outcome"], "skip");
}

#[tokio::test]
async fn upload_with_unsupported_type_surfaces_extraction_error() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let response = post_file(
        app,
        "/api/v1/imports/analyze/upload",
        "inventory.pdf",
        "application/pdf",
        "%PDF-1.7",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INGESTION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("application/pdf"));
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commit_creates_then_updates_same_serial() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(Arc::clone(&store));

    let data = analyze(
        &app,
        json!({
            "rows": [
                { "Name": "Fridge", "Serial Number": "SN1", "Vendor": "Acme" },
                { "Name": "Fridge", "Serial Number": "SN1", "Vendor": "Acme", "Notes": "Moved" }
            ],
            "auto_create_entities": true
        }),
    )
    .await;
    assert_eq!(data["counts"]["create"], 2);
    let id = data["session_id"].as_str().unwrap().to_string();

    let response = post_empty(app.clone(), &format!("/api/v1/imports/{id}/commit")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "committed");
    assert_eq!(data["summary"]["created"], 1);
    assert_eq!(data["summary"]["updated"], 1);
    assert_eq!(data["summary"]["skipped"], 0);

    assert_eq!(store.assets().len(), 1);
    assert_eq!(store.references(ReferenceKind::Vendor).len(), 1);

    let response = get(app, &format!("/api/v1/imports/{id}")).await;
    let session = body_json(response).await["data"].clone();
    assert_eq!(session["status"], "committed");
    assert_eq!(session["summary"]["created"], 1);
}

#[tokio::test]
async fn commit_with_skipped_rows_is_partial() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let data = analyze(
        &app,
        json!({ "rows": [{ "Name": "Desk" }, { "Name": "Chair", "Purchase Price": "abc" }] }),
    )
    .await;
    let id = data["session_id"].as_str().unwrap();

    let response = post_empty(app, &format!("/api/v1/imports/{id}/commit")).await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "partial");
    assert_eq!(data["summary"]["created"], 1);
    assert_eq!(data["summary"]["skipped"], 1);
}

#[tokio::test]
async fn second_commit_is_a_conflict() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let data = analyze(&app, json!({ "rows": [{ "Name": "Desk" }] })).await;
    let id = data["session_id"].as_str().unwrap();

    let first = post_empty(app.clone(), &format!("/api/v1/imports/{id}/commit")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_empty(app, &format!("/api/v1/imports/{id}/commit")).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn concurrent_commits_of_overlapping_sessions_write_once() {
    let store = Arc::new(MemoryStore::new());
    store.yield_on_writes();
    let app = common::build_test_app(Arc::clone(&store));
    let body = json!({
        "rows": [{ "Name": "Fridge", "Serial Number": "SN1", "Category": "Appliances" }],
        "auto_create_entities": true
    });
    let first = analyze(&app, body.clone()).await["session_id"].as_str().unwrap().to_string();
    let second = analyze(&app, body).await["session_id"].as_str().unwrap().to_string();

    let first_path = format!("/api/v1/imports/{first}/commit");
    let second_path = format!("/api/v1/imports/{second}/commit");
    let (a, b) = tokio::join!(
        post_empty(app.clone(), &first_path),
        post_empty(app.clone(), &second_path),
    );
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    let a = body_json(a).await["data"]["summary"].clone();
    let b = body_json(b).await["data"]["summary"].clone();

    assert_eq!(store.references(ReferenceKind::Category).len(), 1);
    assert_eq!(store.assets().len(), 1);
    assert_eq!(a["created"].as_u64().unwrap() + b["created"].as_u64().unwrap(), 1);
    assert_eq!(a["updated"].as_u64().unwrap() + b["updated"].as_u64().unwrap(), 1);
}

/// Store whose asset writes panic, standing in for a bug in a store
/// implementation.
struct PanickingStore {
    inner: MemoryStore,
}

#[async_trait]
impl EntityStore for PanickingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
    async fn list_references(
        &self,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceEntity>, StoreError> {
        self.inner.list_references(kind).await
    }
    async fn list_assets(&self) -> Result<Vec<AssetRecord>, StoreError> {
        self.inner.list_assets().await
    }
    async fn get_asset(&self, id: DbId) -> Result<Option<AssetRecord>, StoreError> {
        self.inner.get_asset(id).await
    }
    async fn create_reference(
        &self,
        kind: ReferenceKind,
        new: &NewReference,
    ) -> Result<ReferenceEntity, StoreError> {
        self.inner.create_reference(kind, new).await
    }
    async fn create_asset(&self, _fields: &AssetFields) -> Result<AssetRecord, StoreError> {
        panic!("asset table exploded");
    }
    async fn update_asset(
        &self,
        id: DbId,
        fields: &AssetFields,
    ) -> Result<AssetRecord, StoreError> {
        self.inner.update_asset(id, fields).await
    }
}

#[tokio::test]
async fn panicking_commit_leaves_session_failed() {
    let app = common::build_test_app_with(Arc::new(PanickingStore {
        inner: MemoryStore::new(),
    }));
    let data = analyze(&app, json!({ "rows": [{ "Name": "Desk" }] })).await;
    let id = data["session_id"].as_str().unwrap();

    let response = post_empty(app.clone(), &format!("/api/v1/imports/{id}/commit")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "failed");
    assert!(data["error"].as_str().unwrap().starts_with("Commit task failed"));

    let response = get(app.clone(), &format!("/api/v1/imports/{id}")).await;
    assert_eq!(body_json(response).await["data"]["status"], "failed");

    // Finished, so neither retryable nor cancellable.
    let response = post_empty(app, &format!("/api/v1/imports/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Cancel / lookup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_preview_cannot_be_committed() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(Arc::clone(&store));
    let data = analyze(&app, json!({ "rows": [{ "Name": "Desk" }] })).await;
    let id = data["session_id"].as_str().unwrap();

    let response = post_empty(app.clone(), &format!("/api/v1/imports/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "cancelled");

    let response = post_empty(app, &format!("/api/v1/imports/{id}/commit")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(store.assets().is_empty());
}

#[tokio::test]
async fn unknown_session_returns_404() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let id = uuid::Uuid::new_v4();

    let response = get(app.clone(), &format!("/api/v1/imports/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_empty(app, &format!("/api/v1/imports/{id}/commit")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}
