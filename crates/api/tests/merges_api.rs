//! HTTP-level tests for merging branches and resolving conflicts.

mod common;

use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use common::{body_json, create_document, data, fork, get, post_json, save};
use draftline_core::crdt::YrsTextDecoder;
use serde_json::json;

fn crdt_body(text: &str) -> serde_json::Value {
    json!({
        "content": text,
        "crdt_state": STANDARD.encode(YrsTextDecoder::default().encode(text)),
    })
}

#[tokio::test]
async fn conflicting_merge_is_resolved_by_hand() {
    let engine = common::test_engine();
    let (doc, main) = create_document(&engine, "Novel").await;
    save(&engine, main, crdt_body("Hello")).await;
    let feature = fork(&engine, doc, "Feature").await;
    save(&engine, feature, crdt_body("Hello world")).await;
    let v3 = save(&engine, main, crdt_body("Hello there")).await;

    let response = post_json(
        common::build_test_app(engine.clone()),
        "/api/v1/merges",
        json!({"source_branch_id": feature, "target_branch_id": main}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let outcome = data(response).await;
    assert_eq!(outcome["has_conflicts"], true);
    assert_eq!(outcome["merge_event"]["status"], "conflicted");
    assert_eq!(outcome["conflict_data"]["ancestor_content"], "Hello");
    assert!(outcome["merged_version"].is_null());
    let merge_id = outcome["merge_event"]["id"].as_i64().unwrap();

    let resolve_uri = format!("/api/v1/merges/{merge_id}/resolve");
    let response = post_json(
        common::build_test_app(engine.clone()),
        &resolve_uri,
        crdt_body("Hello there world"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let resolved = data(response).await["merged_version"].clone();
    assert_eq!(resolved["branch_id"], main);
    assert_eq!(resolved["parent_version_id"], v3);
    assert_eq!(resolved["author_id"], common::USER);

    let response = get(
        common::build_test_app(engine.clone()),
        &format!("/api/v1/merges/{merge_id}"),
    )
    .await;
    let event = data(response).await;
    assert_eq!(event["status"], "completed");
    assert_eq!(event["metadata"]["merged_version_id"], resolved["id"]);
    assert!(event["resolved_at"].is_string());

    let response = post_json(
        common::build_test_app(engine.clone()),
        &resolve_uri,
        json!({"content": "again"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");

    let response = get(
        common::build_test_app(engine),
        &format!("/api/v1/documents/{doc}/merges"),
    )
    .await;
    let history = data(response).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn fast_forward_merge_returns_new_version() {
    let engine = common::test_engine();
    let (doc, main) = create_document(&engine, "Novel").await;
    save(&engine, main, crdt_body("Hello")).await;
    let feature = fork(&engine, doc, "Feature").await;
    save(&engine, feature, crdt_body("Hello world")).await;

    let response = post_json(
        common::build_test_app(engine.clone()),
        "/api/v1/merges",
        json!({"source_branch_id": feature, "target_branch_id": main}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let outcome = data(response).await;
    assert_eq!(outcome["has_conflicts"], false);
    assert_eq!(outcome["merge_event"]["status"], "completed");
    assert_eq!(outcome["merge_event"]["metadata"]["outcome"], "fast_forward");
    assert_eq!(outcome["merged_version"]["content"], "Hello world");

    let response = get(
        common::build_test_app(engine),
        &format!("/api/v1/branches/{main}/head"),
    )
    .await;
    assert_eq!(data(response).await["content"], "Hello world");
}

#[tokio::test]
async fn invalid_merges_return_422() {
    let engine = common::test_engine();
    let (doc, main) = create_document(&engine, "Novel").await;
    save(&engine, main, json!({"content": "text"})).await;
    let empty = fork(&engine, doc, "Empty").await;

    let response = post_json(
        common::build_test_app(engine.clone()),
        "/api/v1/merges",
        json!({"source_branch_id": main, "target_branch_id": main}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "INVALID_BRANCH_PAIR");

    let response = post_json(
        common::build_test_app(engine.clone()),
        "/api/v1/merges",
        json!({"source_branch_id": empty, "target_branch_id": main}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "NO_VERSIONS_TO_MERGE");

    let response = get(common::build_test_app(engine), "/api/v1/merges/31337").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
