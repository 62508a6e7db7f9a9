//! Document branch, version, and merge engine.
//!
//! [`Engine`] bundles the store, the CRDT decoder, the event bus, and the
//! tuning knobs. It is built once per process and shared behind an `Arc`.
//! Operations are grouped by concern:
//!
//! - [`versions`]: append-only version chains and head reads
//! - [`branches`]: documents, branches, and per-user active branch
//! - [`ancestor`]: common-ancestor resolution
//! - [`merge`]: merge initiation, conflict detection, and resolution
//! - [`rollback`]: restoring an earlier version as a new head
//! - [`diff`]: comparing a branch head with another branch or version

use std::sync::Arc;

use draftline_core::crdt::CrdtDecoder;
use draftline_core::error::CoreError;
use draftline_core::types::DbId;
use draftline_db::models::branch::Branch;
use draftline_db::models::document::Document;
use draftline_db::models::merge_event::MergeEvent;
use draftline_db::models::version::Version;
use draftline_db::DocumentStore;
use draftline_events::EventBus;

pub mod ancestor;
pub mod branches;
pub mod config;
pub mod diff;
pub mod error;
pub mod merge;
pub mod rollback;
pub mod versions;

pub use config::EngineConfig;
pub use diff::{BranchDiff, DiffTarget};
pub use error::{EngineError, EngineResult};
pub use merge::{MergeOutcome, Resolution};
pub use versions::VersionDraft;

pub struct Engine {
    store: Arc<dyn DocumentStore>,
    decoder: Arc<dyn CrdtDecoder>,
    events: Arc<EventBus>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        decoder: Arc<dyn CrdtDecoder>,
        events: Arc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            decoder,
            events,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    // -- lookups that fail with NotFound ------------------------------------

    pub(crate) async fn require_document(&self, id: DbId) -> EngineResult<Document> {
        self.store.find_document(id).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "Document",
                id,
            }
            .into()
        })
    }

    pub(crate) async fn require_branch(&self, id: DbId) -> EngineResult<Branch> {
        self.store.find_branch(id).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "Branch",
                id,
            }
            .into()
        })
    }

    pub(crate) async fn require_version(&self, id: DbId) -> EngineResult<Version> {
        self.store.find_version(id).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "Version",
                id,
            }
            .into()
        })
    }

    pub(crate) async fn require_merge_event(&self, id: DbId) -> EngineResult<MergeEvent> {
        self.store.find_merge_event(id).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "MergeEvent",
                id,
            }
            .into()
        })
    }

    /// Two branches of the same document, loaded together.
    pub(crate) async fn require_branch_pair(
        &self,
        a: DbId,
        b: DbId,
    ) -> EngineResult<(Branch, Branch)> {
        let (a, b) = futures::try_join!(self.require_branch(a), self.require_branch(b))?;
        if a.document_id != b.document_id {
            return Err(CoreError::InvalidBranchPair(format!(
                "Branch {} belongs to document {}, branch {} to document {}",
                a.id, a.document_id, b.id, b.document_id
            ))
            .into());
        }
        Ok((a, b))
    }

    /// The version a branch's head pointer names, if any.
    pub(crate) async fn head_of(&self, branch: &Branch) -> EngineResult<Option<Version>> {
        match branch.head_version_id {
            Some(id) => Ok(Some(self.require_version(id).await?)),
            None => Ok(None),
        }
    }
}
