//! In-process [`DocumentStore`] for tests and database-less development.
//!
//! All state lives behind one `tokio::sync::RwLock`; every method takes
//! the lock once, so each call is atomic exactly like a database
//! transaction. Ids come from a single counter and increase monotonically.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use draftline_core::branching::MAIN_BRANCH_NAME;
use draftline_core::merge::MergeStatus;
use draftline_core::types::DbId;

use crate::models::active_branch::ActiveBranch;
use crate::models::branch::{Branch, BranchUpdate, NewBranch};
use crate::models::document::{Document, NewDocument};
use crate::models::merge_event::{MergeEvent, MergeTransition, NewMergeEvent};
use crate::models::version::{HeadExpectation, NewVersion, Version};
use crate::store::{DocumentStore, StoreError};

#[derive(Default)]
struct State {
    last_id: DbId,
    documents: BTreeMap<DbId, Document>,
    branches: BTreeMap<DbId, Branch>,
    versions: BTreeMap<DbId, Version>,
    merge_events: BTreeMap<DbId, MergeEvent>,
    active_branches: HashMap<(DbId, DbId), ActiveBranch>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn slug_taken(&self, document_id: DbId, slug: &str, except: Option<DbId>) -> bool {
        self.branches
            .values()
            .any(|b| b.document_id == document_id && b.slug == slug && Some(b.id) != except)
    }

    fn append(
        &mut self,
        input: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Version, StoreError> {
        let branch = self
            .branches
            .get(&input.branch_id)
            .ok_or(StoreError::BranchNotFound(input.branch_id))?;
        if !expected.admits(branch.head_version_id) {
            return Err(StoreError::ConflictingWrite {
                branch_id: input.branch_id,
            });
        }
        let (document_id, parent_version_id, seq) =
            (branch.document_id, branch.head_version_id, branch.head_seq + 1);

        let version = Version {
            id: self.next_id(),
            document_id,
            branch_id: input.branch_id,
            seq,
            parent_version_id,
            content: input.content.clone(),
            crdt_state: input.crdt_state.clone(),
            word_count: input.word_count,
            author_id: input.author_id,
            created_at: Utc::now(),
        };
        self.versions.insert(version.id, version.clone());

        if let Some(branch) = self.branches.get_mut(&input.branch_id) {
            branch.head_version_id = Some(version.id);
            branch.head_seq = seq;
            branch.updated_at = version.created_at;
        }
        Ok(version)
    }

    /// Apply a transition to a stored event, or `None` if the status does
    /// not match.
    fn transition(&mut self, id: DbId, transition: &MergeTransition) -> Option<MergeEvent> {
        let event = self.merge_events.get_mut(&id)?;
        if event.status != transition.from {
            return None;
        }
        event.status = transition.to;
        event.metadata = transition.metadata.clone();
        if transition.resolved_at.is_some() {
            event.resolved_at = transition.resolved_at;
        }
        Some(event.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(
        &self,
        input: &NewDocument,
    ) -> Result<(Document, Branch), StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let document = Document {
            id: state.next_id(),
            title: input.title.clone(),
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        let main = Branch {
            id: state.next_id(),
            document_id: document.id,
            name: MAIN_BRANCH_NAME.to_string(),
            slug: MAIN_BRANCH_NAME.to_string(),
            description: None,
            parent_branch_id: None,
            base_version_id: None,
            lineage: Vec::new(),
            head_version_id: None,
            head_seq: 0,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        state.documents.insert(document.id, document.clone());
        state.branches.insert(main.id, main.clone());
        Ok((document, main))
    }

    async fn find_document(&self, id: DbId) -> Result<Option<Document>, StoreError> {
        Ok(self.state.read().await.documents.get(&id).cloned())
    }

    async fn create_branch(&self, input: &NewBranch) -> Result<Branch, StoreError> {
        let mut state = self.state.write().await;
        if state.slug_taken(input.document_id, &input.slug, None) {
            return Err(StoreError::DuplicateSlug {
                slug: input.slug.clone(),
            });
        }
        let now = Utc::now();
        let branch = Branch {
            id: state.next_id(),
            document_id: input.document_id,
            name: input.name.clone(),
            slug: input.slug.clone(),
            description: input.description.clone(),
            parent_branch_id: Some(input.parent_branch_id),
            base_version_id: input.base_version_id,
            lineage: input.lineage.clone(),
            head_version_id: None,
            head_seq: 0,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        state.branches.insert(branch.id, branch.clone());
        Ok(branch)
    }

    async fn find_branch(&self, id: DbId) -> Result<Option<Branch>, StoreError> {
        Ok(self.state.read().await.branches.get(&id).cloned())
    }

    async fn find_branch_by_slug(
        &self,
        document_id: DbId,
        slug: &str,
    ) -> Result<Option<Branch>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .branches
            .values()
            .find(|b| b.document_id == document_id && b.slug == slug)
            .cloned())
    }

    async fn list_branches(&self, document_id: DbId) -> Result<Vec<Branch>, StoreError> {
        let state = self.state.read().await;
        let mut branches: Vec<Branch> = state
            .branches
            .values()
            .filter(|b| b.document_id == document_id)
            .cloned()
            .collect();
        // BTreeMap iteration is already id order; stable sort keeps it.
        branches.sort_by_key(|b| !b.is_main());
        Ok(branches)
    }

    async fn count_branches(&self, document_id: DbId) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        let count = state
            .branches
            .values()
            .filter(|b| b.document_id == document_id)
            .count();
        Ok(count as i64)
    }

    async fn update_branch(
        &self,
        id: DbId,
        update: &BranchUpdate,
    ) -> Result<Option<Branch>, StoreError> {
        let mut state = self.state.write().await;
        let Some(document_id) = state.branches.get(&id).map(|b| b.document_id) else {
            return Ok(None);
        };
        if let Some(slug) = &update.slug {
            if state.slug_taken(document_id, slug, Some(id)) {
                return Err(StoreError::DuplicateSlug { slug: slug.clone() });
            }
        }

        let Some(branch) = state.branches.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            branch.name = name.clone();
        }
        if let Some(slug) = &update.slug {
            branch.slug = slug.clone();
        }
        if let Some(description) = &update.description {
            branch.description = Some(description.clone());
        }
        branch.updated_at = Utc::now();
        Ok(Some(branch.clone()))
    }

    async fn delete_branch(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let removed = state.branches.remove(&id).is_some();
        if removed {
            state.active_branches.retain(|_, a| a.branch_id != id);
            for child in state.branches.values_mut() {
                if child.parent_branch_id == Some(id) {
                    child.parent_branch_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn append_version(
        &self,
        input: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Version, StoreError> {
        self.state.write().await.append(input, expected)
    }

    async fn find_version(&self, id: DbId) -> Result<Option<Version>, StoreError> {
        Ok(self.state.read().await.versions.get(&id).cloned())
    }

    async fn list_versions(
        &self,
        branch_id: DbId,
        limit: i64,
    ) -> Result<Vec<Version>, StoreError> {
        let state = self.state.read().await;
        let mut versions: Vec<Version> = state
            .versions
            .values()
            .filter(|v| v.branch_id == branch_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.seq.cmp(&a.seq));
        versions.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(versions)
    }

    async fn count_versions(&self, branch_id: DbId) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        let count = state
            .versions
            .values()
            .filter(|v| v.branch_id == branch_id)
            .count();
        Ok(count as i64)
    }

    async fn create_merge_event(&self, input: &NewMergeEvent) -> Result<MergeEvent, StoreError> {
        let mut state = self.state.write().await;
        let event = MergeEvent {
            id: state.next_id(),
            document_id: input.document_id,
            source_branch_id: input.source_branch_id,
            target_branch_id: input.target_branch_id,
            initiator_id: input.initiator_id,
            status: MergeStatus::Pending,
            metadata: input.metadata.clone(),
            resolved_at: None,
            created_at: Utc::now(),
        };
        state.merge_events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_merge_event(&self, id: DbId) -> Result<Option<MergeEvent>, StoreError> {
        Ok(self.state.read().await.merge_events.get(&id).cloned())
    }

    async fn transition_merge_event(
        &self,
        id: DbId,
        transition: &MergeTransition,
    ) -> Result<Option<MergeEvent>, StoreError> {
        Ok(self.state.write().await.transition(id, transition))
    }

    async fn complete_merge_with_version(
        &self,
        id: DbId,
        transition: &MergeTransition,
        version: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Option<(MergeEvent, Version)>, StoreError> {
        let mut state = self.state.write().await;
        let status_matches = state
            .merge_events
            .get(&id)
            .is_some_and(|e| e.status == transition.from);
        if !status_matches {
            return Ok(None);
        }

        let version = state.append(version, expected)?;
        let mut stamped = transition.clone();
        stamped.metadata.merged_version_id = Some(version.id);
        Ok(state.transition(id, &stamped).map(|event| (event, version)))
    }

    async fn list_merge_events(&self, document_id: DbId) -> Result<Vec<MergeEvent>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .merge_events
            .values()
            .rev()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn latest_completed_merge_between(
        &self,
        branch_a: DbId,
        branch_b: DbId,
    ) -> Result<Option<MergeEvent>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .merge_events
            .values()
            .filter(|e| e.status == MergeStatus::Completed && e.joins(branch_a, branch_b))
            .max_by_key(|e| (e.resolved_at, e.id))
            .cloned())
    }

    async fn set_active_branch(
        &self,
        document_id: DbId,
        user_id: DbId,
        branch_id: DbId,
    ) -> Result<ActiveBranch, StoreError> {
        let mut state = self.state.write().await;
        let active = ActiveBranch {
            document_id,
            user_id,
            branch_id,
            updated_at: Utc::now(),
        };
        state
            .active_branches
            .insert((document_id, user_id), active.clone());
        Ok(active)
    }

    async fn find_active_branch(
        &self,
        document_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ActiveBranch>, StoreError> {
        let state = self.state.read().await;
        Ok(state.active_branches.get(&(document_id, user_id)).cloned())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use draftline_core::branching::ForkPoint;
    use draftline_core::merge::MergeMetadata;

    use super::*;

    async fn seeded() -> (MemoryStore, Document, Branch) {
        let store = MemoryStore::new();
        let (doc, main) = store
            .create_document(&NewDocument {
                title: "Novel".into(),
                created_by: 1,
            })
            .await
            .unwrap();
        (store, doc, main)
    }

    fn new_version(branch_id: DbId, content: &str) -> NewVersion {
        NewVersion {
            branch_id,
            content: content.into(),
            crdt_state: None,
            word_count: 1,
            author_id: 1,
        }
    }

    fn fork(main: &Branch, name: &str) -> NewBranch {
        NewBranch {
            document_id: main.document_id,
            name: name.into(),
            slug: name.into(),
            description: None,
            parent_branch_id: main.id,
            base_version_id: main.head_version_id,
            lineage: vec![main.head_point()],
            created_by: 1,
        }
    }

    #[tokio::test]
    async fn document_comes_with_empty_main() {
        let (_store, doc, main) = seeded().await;
        assert_eq!(main.document_id, doc.id);
        assert!(main.is_main());
        assert_eq!(main.head_seq, 0);
        assert!(main.lineage.is_empty());
    }

    #[tokio::test]
    async fn appends_chain_and_move_head() {
        let (store, _doc, main) = seeded().await;
        let v1 = store
            .append_version(&new_version(main.id, "a"), HeadExpectation::Any)
            .await
            .unwrap();
        let v2 = store
            .append_version(&new_version(main.id, "b"), HeadExpectation::Any)
            .await
            .unwrap();

        assert_eq!((v1.seq, v1.parent_version_id), (1, None));
        assert_eq!((v2.seq, v2.parent_version_id), (2, Some(v1.id)));

        let main = store.find_branch(main.id).await.unwrap().unwrap();
        assert_eq!(main.head_version_id, Some(v2.id));
        assert_eq!(main.head_point(), ForkPoint::new(main.id, Some(v2.id), 2));

        let listed = store.list_versions(main.id, 10).await.unwrap();
        assert_eq!(listed.iter().map(|v| v.id).collect::<Vec<_>>(), vec![v2.id, v1.id]);
        assert_eq!(store.list_versions(main.id, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_expectation_is_rejected() {
        let (store, _doc, main) = seeded().await;
        store
            .append_version(&new_version(main.id, "a"), HeadExpectation::Exactly(None))
            .await
            .unwrap();
        let err = store
            .append_version(&new_version(main.id, "b"), HeadExpectation::Exactly(None))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::ConflictingWrite { branch_id } if branch_id == main.id);
        assert_eq!(store.count_versions(main.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn append_to_missing_branch_fails() {
        let store = MemoryStore::new();
        let err = store
            .append_version(&new_version(42, "x"), HeadExpectation::Any)
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::BranchNotFound(42));
    }

    #[tokio::test]
    async fn duplicate_slug_rejected() {
        let (store, _doc, main) = seeded().await;
        store.create_branch(&fork(&main, "alt")).await.unwrap();
        let err = store.create_branch(&fork(&main, "alt")).await.unwrap_err();
        assert_matches!(err, StoreError::DuplicateSlug { .. });
    }

    #[tokio::test]
    async fn deleted_branch_keeps_versions() {
        let (store, _doc, main) = seeded().await;
        let alt = store.create_branch(&fork(&main, "alt")).await.unwrap();
        let v = store
            .append_version(&new_version(alt.id, "x"), HeadExpectation::Any)
            .await
            .unwrap();

        assert!(store.delete_branch(alt.id).await.unwrap());
        assert!(!store.delete_branch(alt.id).await.unwrap());
        assert_eq!(store.find_version(v.id).await.unwrap(), Some(v));
    }

    #[tokio::test]
    async fn transition_is_compare_and_swap() {
        let (store, doc, main) = seeded().await;
        let alt = store.create_branch(&fork(&main, "alt")).await.unwrap();
        let event = store
            .create_merge_event(&NewMergeEvent {
                document_id: doc.id,
                source_branch_id: alt.id,
                target_branch_id: main.id,
                initiator_id: 1,
                metadata: MergeMetadata::default(),
            })
            .await
            .unwrap();
        let to_conflicted = MergeTransition {
            from: MergeStatus::Pending,
            to: MergeStatus::Conflicted,
            metadata: MergeMetadata::default(),
            resolved_at: None,
        };

        let moved = store.transition_merge_event(event.id, &to_conflicted).await.unwrap();
        assert_eq!(moved.unwrap().status, MergeStatus::Conflicted);
        assert!(store
            .transition_merge_event(event.id, &to_conflicted)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn completion_with_version_stamps_and_is_single_shot() {
        let (store, doc, main) = seeded().await;
        let alt = store.create_branch(&fork(&main, "alt")).await.unwrap();
        let event = store
            .create_merge_event(&NewMergeEvent {
                document_id: doc.id,
                source_branch_id: alt.id,
                target_branch_id: main.id,
                initiator_id: 1,
                metadata: MergeMetadata::default(),
            })
            .await
            .unwrap();
        let complete = MergeTransition {
            from: MergeStatus::Pending,
            to: MergeStatus::Completed,
            metadata: MergeMetadata::default(),
            resolved_at: Some(Utc::now()),
        };

        let (event, version) = store
            .complete_merge_with_version(
                event.id,
                &complete,
                &new_version(main.id, "m"),
                HeadExpectation::Exactly(None),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.status, MergeStatus::Completed);
        assert_eq!(event.metadata.merged_version_id, Some(version.id));

        let again = store
            .complete_merge_with_version(
                event.id,
                &complete,
                &new_version(main.id, "m2"),
                HeadExpectation::Any,
            )
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(store.count_versions(main.id).await.unwrap(), 1);

        let latest = store
            .latest_completed_merge_between(main.id, alt.id)
            .await
            .unwrap();
        assert_eq!(latest.map(|e| e.id), Some(event.id));
    }

    #[tokio::test]
    async fn completion_against_moved_head_writes_nothing() {
        let (store, doc, main) = seeded().await;
        let alt = store.create_branch(&fork(&main, "alt")).await.unwrap();
        let seen = store
            .append_version(&new_version(main.id, "seen"), HeadExpectation::Any)
            .await
            .unwrap();
        let event = store
            .create_merge_event(&NewMergeEvent {
                document_id: doc.id,
                source_branch_id: alt.id,
                target_branch_id: main.id,
                initiator_id: 1,
                metadata: MergeMetadata::default(),
            })
            .await
            .unwrap();
        let concurrent = store
            .append_version(&new_version(main.id, "concurrent"), HeadExpectation::Any)
            .await
            .unwrap();

        let complete = MergeTransition {
            from: MergeStatus::Pending,
            to: MergeStatus::Completed,
            metadata: MergeMetadata::default(),
            resolved_at: Some(Utc::now()),
        };
        let err = store
            .complete_merge_with_version(
                event.id,
                &complete,
                &new_version(main.id, "merged"),
                HeadExpectation::Exactly(Some(seen.id)),
            )
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::ConflictingWrite { branch_id } if branch_id == main.id);

        let main = store.find_branch(main.id).await.unwrap().unwrap();
        assert_eq!(main.head_version_id, Some(concurrent.id));
        assert_eq!(store.count_versions(main.id).await.unwrap(), 2);
        let event = store.find_merge_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.status, MergeStatus::Pending);
    }

    #[tokio::test]
    async fn deleting_a_parent_detaches_its_children() {
        let (store, _doc, main) = seeded().await;
        let alt = store.create_branch(&fork(&main, "alt")).await.unwrap();
        let child = store.create_branch(&fork(&alt, "child")).await.unwrap();
        assert_eq!(child.parent_branch_id, Some(alt.id));

        store.delete_branch(alt.id).await.unwrap();

        let child = store.find_branch(child.id).await.unwrap().unwrap();
        assert_eq!(child.parent_branch_id, None);
        assert_eq!(child.lineage.len(), 1);
        let main = store.find_branch(main.id).await.unwrap().unwrap();
        assert_eq!(main.parent_branch_id, None);
    }

    #[tokio::test]
    async fn active_branch_is_per_user() {
        let (store, doc, main) = seeded().await;
        let alt = store.create_branch(&fork(&main, "alt")).await.unwrap();
        store.set_active_branch(doc.id, 7, alt.id).await.unwrap();

        let mine = store.find_active_branch(doc.id, 7).await.unwrap().unwrap();
        assert_eq!(mine.branch_id, alt.id);
        assert!(store.find_active_branch(doc.id, 8).await.unwrap().is_none());

        store.delete_branch(alt.id).await.unwrap();
        assert!(store.find_active_branch(doc.id, 7).await.unwrap().is_none());
    }
}
