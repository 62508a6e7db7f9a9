mod common;

use assert_matches::assert_matches;
use draftline_core::ancestry::AncestorStrategy;
use draftline_core::error::CoreError;
use draftline_engine::{EngineConfig, EngineError};

use common::{document, engine, engine_with, fork, save, AUTHOR};

#[tokio::test]
async fn fork_point_survives_parent_advancing() {
    let engine = engine();
    let (doc, main) = document(&engine).await;
    let v1 = save(&engine, main.id, "Hello").await;
    let feature = fork(&engine, doc, "Feature", None).await;

    save(&engine, main.id, "Hello there").await;
    save(&engine, feature.id, "Hello world").await;
    save(&engine, main.id, "Hello there, friend").await;

    let ab = engine.find_common_ancestor(main.id, feature.id).await.unwrap();
    let ba = engine.find_common_ancestor(feature.id, main.id).await.unwrap();
    assert_eq!(ab.as_ref().map(|v| v.id), Some(v1));
    assert_eq!(ab.map(|v| v.id), ba.map(|v| v.id));
}

#[tokio::test]
async fn siblings_share_the_older_fork_point() {
    let engine = engine();
    let (doc, main) = document(&engine).await;
    let v1 = save(&engine, main.id, "one").await;
    let early = fork(&engine, doc, "Early", None).await;
    save(&engine, main.id, "one two").await;
    let late = fork(&engine, doc, "Late", None).await;

    save(&engine, early.id, "one, early").await;
    save(&engine, late.id, "one two, late").await;

    let found = engine.find_common_ancestor(early.id, late.id).await.unwrap();
    assert_eq!(found.map(|v| v.id), Some(v1));
}

#[tokio::test]
async fn nested_branches_resolve_through_lineage() {
    let engine = engine();
    let (doc, main) = document(&engine).await;
    let v1 = save(&engine, main.id, "root").await;
    let parent = fork(&engine, doc, "Parent", None).await;
    let p1 = save(&engine, parent.id, "root, parent").await;
    let child = fork(&engine, doc, "Child", Some(parent.id)).await;

    save(&engine, parent.id, "root, parent again").await;
    save(&engine, child.id, "root, parent, child").await;
    save(&engine, main.id, "root moved").await;

    let with_parent = engine.find_common_ancestor(child.id, parent.id).await.unwrap();
    assert_eq!(with_parent.map(|v| v.id), Some(p1));

    let with_main = engine.find_common_ancestor(child.id, main.id).await.unwrap();
    assert_eq!(with_main.map(|v| v.id), Some(v1));
}

#[tokio::test]
async fn fork_of_empty_branch_shares_nothing() {
    let engine = engine();
    let (doc, main) = document(&engine).await;
    let early = fork(&engine, doc, "Early", None).await;
    save(&engine, main.id, "main text").await;
    save(&engine, early.id, "early text").await;

    let found = engine.find_common_ancestor(main.id, early.id).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn branch_is_its_own_ancestor_at_head() {
    let engine = engine();
    let (_doc, main) = document(&engine).await;
    save(&engine, main.id, "a").await;
    let head = save(&engine, main.id, "a b").await;

    let found = engine.find_common_ancestor(main.id, main.id).await.unwrap();
    assert_eq!(found.map(|v| v.id), Some(head));
}

#[tokio::test]
async fn branches_of_different_documents_rejected() {
    let engine = engine();
    let (_doc_a, main_a) = document(&engine).await;
    let (_doc_b, main_b) = document(&engine).await;

    let err = engine
        .find_common_ancestor(main_a.id, main_b.id)
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::InvalidBranchPair(_)));
}

#[tokio::test]
async fn completed_merge_becomes_the_merge_base() {
    let engine = engine();
    let (doc, main) = document(&engine).await;
    let v1 = save(&engine, main.id, "Hello").await;
    let feature = fork(&engine, doc, "Feature", None).await;
    let f1 = save(&engine, feature.id, "Hello world").await;

    let before = engine.find_common_ancestor(main.id, feature.id).await.unwrap();
    assert_eq!(before.map(|v| v.id), Some(v1));

    let outcome = engine.initiate_merge(feature.id, main.id, AUTHOR).await.unwrap();
    assert!(!outcome.has_conflicts);

    let after = engine.find_common_ancestor(main.id, feature.id).await.unwrap();
    assert_eq!(after.map(|v| v.id), Some(f1));
}

// ---------------------------------------------------------------------------
// Bounded window
// ---------------------------------------------------------------------------

fn windowed(window: usize) -> EngineConfig {
    EngineConfig {
        ancestor_strategy: AncestorStrategy::BoundedWindow,
        ancestor_window: window,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn window_finds_fork_point() {
    let engine = engine_with(windowed(10));
    let (doc, main) = document(&engine).await;
    let v1 = save(&engine, main.id, "Hello").await;
    let feature = fork(&engine, doc, "Feature", None).await;
    save(&engine, feature.id, "Hello world").await;
    save(&engine, main.id, "Hello there").await;

    let ab = engine.find_common_ancestor(main.id, feature.id).await.unwrap();
    let ba = engine.find_common_ancestor(feature.id, main.id).await.unwrap();
    assert_eq!(ab.map(|v| v.id), Some(v1));
    assert_eq!(ba.map(|v| v.id), Some(v1));
}

#[tokio::test]
async fn window_exhausted_reports_no_common_ancestor() {
    let engine = engine_with(windowed(3));
    let (doc, main) = document(&engine).await;
    save(&engine, main.id, "v1").await;
    let feature = fork(&engine, doc, "Feature", None).await;
    save(&engine, feature.id, "f1").await;
    for i in 2..=4 {
        save(&engine, main.id, &format!("v{i}")).await;
    }

    let err = engine
        .find_common_ancestor(main.id, feature.id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        EngineError::Core(CoreError::NoCommonAncestor { window: 3, .. })
    );

    // The lineage strategy is not bounded by history length.
    let lineage = engine_with(EngineConfig::default());
    let (doc, main) = document(&lineage).await;
    let v1 = save(&lineage, main.id, "v1").await;
    let feature = fork(&lineage, doc, "Feature", None).await;
    save(&lineage, feature.id, "f1").await;
    for i in 2..=4 {
        save(&lineage, main.id, &format!("v{i}")).await;
    }
    let found = lineage.find_common_ancestor(main.id, feature.id).await.unwrap();
    assert_eq!(found.map(|v| v.id), Some(v1));
}
