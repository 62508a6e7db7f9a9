use std::sync::Arc;

use draftline_core::crdt::YrsTextDecoder;
use draftline_core::types::DbId;
use draftline_db::models::branch::{Branch, CreateBranch};
use draftline_db::MemoryStore;
use draftline_engine::{Engine, EngineConfig, VersionDraft};
use draftline_events::EventBus;

/// User id used as author for every write in these tests.
pub const AUTHOR: DbId = 7;

/// An engine over a fresh in-memory store with default configuration.
pub fn engine() -> Engine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> Engine {
    Engine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(YrsTextDecoder::default()),
        Arc::new(EventBus::default()),
        config,
    )
}

/// Create a document, returning its id and `main` branch.
pub async fn document(engine: &Engine) -> (DbId, Branch) {
    let created = engine.create_document("Manuscript", AUTHOR).await.unwrap();
    (created.document.id, created.main_branch)
}

/// Fork `name` from `parent` (or from `main` when `None`).
pub async fn fork(engine: &Engine, document_id: DbId, name: &str, parent: Option<DbId>) -> Branch {
    engine
        .create_branch(
            document_id,
            &CreateBranch {
                name: name.to_string(),
                description: None,
                parent_branch_id: parent,
            },
            AUTHOR,
        )
        .await
        .unwrap()
}

/// A draft carrying Yjs state for `text`.
pub fn crdt(text: &str) -> VersionDraft {
    VersionDraft::text(text).with_state(YrsTextDecoder::default().encode(text))
}

/// Append a CRDT-backed version and return its id.
pub async fn save(engine: &Engine, branch_id: DbId, text: &str) -> DbId {
    engine.append(branch_id, crdt(text), AUTHOR).await.unwrap().id
}
