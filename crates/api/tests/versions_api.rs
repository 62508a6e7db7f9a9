//! HTTP-level tests for saving, listing, rolling back, and comparing versions.

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
async fn save_and_list_newest_first() {
    let engine = common::test_engine();
    let (_doc, main) = create_document(&engine, "Novel").await;
    let first = save(&engine, main, json!({"content": "one"})).await;
    let second = save(&engine, main, json!({"content": "one two"})).await;
    save(&engine, main, json!({"content": "one two three"})).await;

    let response = get(
        common::build_test_app(engine.clone()),
        &format!("/api/v1/branches/{main}/versions?limit=2"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = data(response).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["seq"], 3);
    assert_eq!(list[0]["parent_version_id"], second);
    assert_eq!(list[1]["id"], second);
    assert_eq!(list[1]["parent_version_id"], first);

    let response = get(
        common::build_test_app(engine),
        &format!("/api/v1/branches/{main}/head"),
    )
    .await;
    let head = data(response).await;
    assert_eq!(head["content"], "one two three");
    assert_eq!(head["word_count"], 3);
}

#[tokio::test]
async fn crdt_state_travels_as_base64() {
    let engine = common::test_engine();
    let (_doc, main) = create_document(&engine, "Novel").await;
    let body = crdt_body("Hello");
    let id = save(&engine, main, body.clone()).await;

    let response = get(
        common::build_test_app(engine),
        &format!("/api/v1/versions/{id}"),
    )
    .await;
    let version = data(response).await;
    assert_eq!(version["crdt_state"], body["crdt_state"]);
}

#[tokio::test]
async fn stale_expected_head_returns_409() {
    let engine = common::test_engine();
    let (_doc, main) = create_document(&engine, "Novel").await;
    let first = save(&engine, main, json!({"content": "one", "expect_empty_branch": true})).await;
    save(
        &engine,
        main,
        json!({"content": "two", "expected_head_version_id": first}),
    )
    .await;

    let response = post_json(
        common::build_test_app(engine),
        &format!("/api/v1/branches/{main}/versions"),
        json!({"content": "stale", "expected_head_version_id": first}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICTING_WRITE");
}

#[tokio::test]
async fn negative_word_count_returns_400() {
    let engine = common::test_engine();
    let (_doc, main) = create_document(&engine, "Novel").await;

    let response = post_json(
        common::build_test_app(engine),
        &format!("/api/v1/branches/{main}/versions"),
        json!({"content": "short", "word_count": -1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn save_to_unknown_branch_returns_404() {
    let app = common::build_test_app(common::test_engine());
    let response = post_json(app, "/api/v1/branches/424242/versions", json!({"content": "x"})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rollback_appends_restored_copy() {
    let engine = common::test_engine();
    let (doc, main) = create_document(&engine, "Novel").await;
    let first = save(&engine, main, json!({"content": "original"})).await;
    save(&engine, main, json!({"content": "rewritten"})).await;

    let response = post_json(
        common::build_test_app(engine.clone()),
        &format!("/api/v1/branches/{main}/rollback"),
        json!({"version_id": first}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let restored = data(response).await;
    assert_eq!(restored["content"], "original");
    assert_eq!(restored["seq"], 3);

    let feature = fork(&engine, doc, "Feature").await;
    let foreign = save(&engine, feature, json!({"content": "elsewhere"})).await;
    let response = post_json(
        common::build_test_app(engine),
        &format!("/api/v1/branches/{main}/rollback"),
        json!({"version_id": foreign}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn diff_and_ancestor_between_branches() {
    let engine = common::test_engine();
    let (doc, main) = create_document(&engine, "Novel").await;
    let base = save(&engine, main, crdt_body("line one\n")).await;
    let feature = fork(&engine, doc, "Feature").await;
    save(&engine, feature, crdt_body("line one\nline two\n")).await;

    let response = get(
        common::build_test_app(engine.clone()),
        &format!("/api/v1/branches/{feature}/diff?compare_to_branch_id={main}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let diff = data(response).await;
    assert_eq!(diff["content_changed"], true);
    assert_eq!(diff["lines_added"], 1);
    assert_eq!(diff["lines_removed"], 0);
    assert_eq!(diff["word_count_diff"], 2);
    assert_eq!(diff["state_diff"]["identical"], false);

    let response = get(
        common::build_test_app(engine.clone()),
        &format!("/api/v1/branches/{feature}/diff"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(
        common::build_test_app(engine),
        &format!("/api/v1/branches/{feature}/ancestor/{main}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data(response).await["id"], base);
}
