//! Merge coordinator.
//!
//! `initiate_merge` compares the heads of two branches against their common
//! ancestor and settles the new merge event in one of three ways:
//!
//! - fast-forward: only the source changed, the target receives a copy of
//!   the source head;
//! - up-to-date: the target already has every change, nothing is written;
//! - conflict: both sides changed, the event waits for `resolve_merge`.
//!
//! Any store failure after the event exists marks it `failed`, including a
//! target head that moved after it was compared.

use chrono::Utc;
use serde::Serialize;
use draftline_core::conflict::ConflictData;
use draftline_core::error::CoreError;
use draftline_core::merge::{
    assess_content_only, assess_three_way, DetectionMethod, MergeKind, MergeMetadata, MergeStatus,
};
use draftline_core::types::DbId;
use draftline_db::models::merge_event::{MergeEvent, MergeTransition, NewMergeEvent};
use draftline_db::models::version::{HeadExpectation, NewVersion, Version};
use draftline_events::{names, DocumentEvent};

use crate::versions::VersionDraft;
use crate::{Engine, EngineResult};

/// Result of initiating a merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub merge_event: MergeEvent,
    pub has_conflicts: bool,
    pub conflict_data: Option<ConflictData>,
    /// The version appended on the target by a fast-forward.
    pub merged_version: Option<Version>,
}

/// Manually merged content for a conflicted merge.
pub type Resolution = VersionDraft;

/// The three texts a merge compares, and how they were obtained.
struct Comparison {
    detection: DetectionMethod,
    source: String,
    target: String,
    ancestor: Option<String>,
}

impl Engine {
    /// Merge `source_branch_id` into `target_branch_id`.
    pub async fn initiate_merge(
        &self,
        source_branch_id: DbId,
        target_branch_id: DbId,
        initiator_id: DbId,
    ) -> EngineResult<MergeOutcome> {
        let (source, target) = self
            .require_branch_pair(source_branch_id, target_branch_id)
            .await?;
        if source.id == target.id {
            return Err(CoreError::InvalidBranchPair(format!(
                "Cannot merge branch {source_branch_id} into itself"
            ))
            .into());
        }

        let source_head = self
            .head_of(&source)
            .await?
            .ok_or(CoreError::NoVersionsToMerge {
                branch_id: source.id,
            })?;
        let target_head = self
            .head_of(&target)
            .await?
            .ok_or(CoreError::NoVersionsToMerge {
                branch_id: target.id,
            })?;

        let ancestor = match self.common_ancestor_id(&source, &target).await? {
            Some(id) => Some(self.require_version(id).await?),
            None => None,
        };

        let metadata = MergeMetadata {
            source_version_id: Some(source_head.id),
            target_version_id: Some(target_head.id),
            ancestor_version_id: ancestor.as_ref().map(|v| v.id),
            ..MergeMetadata::default()
        };
        let event = self
            .store
            .create_merge_event(&NewMergeEvent {
                document_id: source.document_id,
                source_branch_id,
                target_branch_id,
                initiator_id,
                metadata,
            })
            .await?;

        tracing::info!(
            merge_event_id = event.id,
            source_branch_id,
            target_branch_id,
            source_version_id = source_head.id,
            target_version_id = target_head.id,
            ancestor_version_id = ?event.metadata.ancestor_version_id,
            "Merge initiated"
        );

        match self
            .settle(&event, &source_head, &target_head, ancestor.as_ref(), initiator_id)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.mark_failed(&event, &err.to_string()).await;
                Err(err)
            }
        }
    }

    async fn settle(
        &self,
        event: &MergeEvent,
        source_head: &Version,
        target_head: &Version,
        ancestor: Option<&Version>,
        initiator_id: DbId,
    ) -> EngineResult<MergeOutcome> {
        let comparison = self.compare(source_head, target_head, ancestor);
        let kind = match (&comparison.detection, &comparison.ancestor) {
            (DetectionMethod::Crdt, Some(ancestor)) => {
                assess_three_way(&comparison.source, &comparison.target, ancestor)
            }
            _ => assess_content_only(&comparison.source, &comparison.target),
        };

        let mut metadata = event.metadata.clone();
        metadata.detection = Some(comparison.detection);
        metadata.outcome = Some(kind);

        match kind {
            MergeKind::Conflict => {
                let conflict = ConflictData::build(
                    &comparison.source,
                    &comparison.target,
                    comparison.ancestor.as_deref(),
                );
                metadata.conflict = Some(conflict.clone());
                let transition = MergeTransition {
                    from: MergeStatus::Pending,
                    to: MergeStatus::Conflicted,
                    metadata,
                    resolved_at: None,
                };
                let settled = self.apply_transition(event.id, &transition).await?;

                tracing::info!(
                    merge_event_id = event.id,
                    detection = ?comparison.detection,
                    overlapping = conflict.overlapping_count(),
                    "Merge conflicted"
                );
                self.publish_merge(names::MERGE_CONFLICTED, &settled, initiator_id);

                Ok(MergeOutcome {
                    merge_event: settled,
                    has_conflicts: true,
                    conflict_data: Some(conflict),
                    merged_version: None,
                })
            }
            MergeKind::FastForward => {
                let transition = MergeTransition {
                    from: MergeStatus::Pending,
                    to: MergeStatus::Completed,
                    metadata,
                    resolved_at: Some(Utc::now()),
                };
                let copy = NewVersion {
                    branch_id: event.target_branch_id,
                    content: source_head.content.clone(),
                    crdt_state: source_head.crdt_state.clone(),
                    word_count: source_head.word_count,
                    author_id: initiator_id,
                };
                let (settled, version) = self
                    .store
                    .complete_merge_with_version(
                        event.id,
                        &transition,
                        &copy,
                        HeadExpectation::Exactly(Some(target_head.id)),
                    )
                    .await?
                    .ok_or_else(|| settled_elsewhere(event.id))?;

                tracing::info!(
                    merge_event_id = event.id,
                    merged_version_id = version.id,
                    "Merge fast-forwarded"
                );
                self.publish_completion(&settled, initiator_id);

                Ok(MergeOutcome {
                    merge_event: settled,
                    has_conflicts: false,
                    conflict_data: None,
                    merged_version: Some(version),
                })
            }
            MergeKind::UpToDate | MergeKind::Resolved => {
                let transition = MergeTransition {
                    from: MergeStatus::Pending,
                    to: MergeStatus::Completed,
                    metadata,
                    resolved_at: Some(Utc::now()),
                };
                let settled = self.apply_transition(event.id, &transition).await?;

                tracing::info!(merge_event_id = event.id, "Merge target already up to date");
                self.publish_completion(&settled, initiator_id);

                Ok(MergeOutcome {
                    merge_event: settled,
                    has_conflicts: false,
                    conflict_data: None,
                    merged_version: None,
                })
            }
        }
    }

    /// Decode all three CRDT states, or fall back to plain content when any
    /// state is missing or undecodable.
    fn compare(
        &self,
        source: &Version,
        target: &Version,
        ancestor: Option<&Version>,
    ) -> Comparison {
        let fallback = || Comparison {
            detection: DetectionMethod::Content,
            source: source.content.clone(),
            target: target.content.clone(),
            ancestor: ancestor.map(|v| v.content.clone()),
        };

        let Some(ancestor) = ancestor else {
            return fallback();
        };
        let (Some(source_state), Some(target_state), Some(ancestor_state)) = (
            source.crdt_state.as_deref(),
            target.crdt_state.as_deref(),
            ancestor.crdt_state.as_deref(),
        ) else {
            return fallback();
        };

        let decoded = self.decoder.decode(source_state).and_then(|s| {
            let t = self.decoder.decode(target_state)?;
            let a = self.decoder.decode(ancestor_state)?;
            Ok((s, t, a))
        });
        match decoded {
            Ok((source, target, ancestor)) => Comparison {
                detection: DetectionMethod::Crdt,
                source,
                target,
                ancestor: Some(ancestor),
            },
            Err(err) => {
                tracing::warn!(
                    source_version_id = source.id,
                    target_version_id = target.id,
                    ancestor_version_id = ancestor.id,
                    error = %err,
                    "CRDT decode failed, comparing plain content"
                );
                fallback()
            }
        }
    }

    /// Apply the manual resolution of a conflicted merge: append it to the
    /// target and complete the event, atomically.
    ///
    /// The resolution is built from the target head recorded on the event.
    /// If the target has moved since, it fails with `ConflictingWrite` and
    /// the event stays conflicted.
    pub async fn resolve_merge(
        &self,
        merge_event_id: DbId,
        resolution: Resolution,
        resolver_id: DbId,
    ) -> EngineResult<Version> {
        let event = self.require_merge_event(merge_event_id).await?;
        if event.status != MergeStatus::Conflicted {
            return Err(CoreError::NotConflicted {
                merge_event_id,
                status: event.status,
            }
            .into());
        }

        let resolved_at = Utc::now();
        let mut metadata = event.metadata.clone();
        metadata.outcome = Some(MergeKind::Resolved);
        metadata.resolved_by = Some(resolver_id);
        metadata.resolved_at = Some(resolved_at);

        let transition = MergeTransition {
            from: MergeStatus::Conflicted,
            to: MergeStatus::Completed,
            metadata,
            resolved_at: Some(resolved_at),
        };
        let version = resolution.into_new_version(event.target_branch_id, resolver_id)?;
        let expected = HeadExpectation::Exactly(event.metadata.target_version_id);

        let Some((settled, version)) = self
            .store
            .complete_merge_with_version(merge_event_id, &transition, &version, expected)
            .await?
        else {
            // Lost the compare-and-swap to a concurrent resolve.
            let current = self.require_merge_event(merge_event_id).await?;
            return Err(CoreError::NotConflicted {
                merge_event_id,
                status: current.status,
            }
            .into());
        };

        tracing::info!(
            merge_event_id,
            merged_version_id = version.id,
            resolver_id,
            "Merge resolved"
        );
        self.publish_completion(&settled, resolver_id);
        Ok(version)
    }

    pub async fn get_merge_event(&self, id: DbId) -> EngineResult<MergeEvent> {
        self.require_merge_event(id).await
    }

    /// A document's merges, newest first.
    pub async fn get_merge_history(&self, document_id: DbId) -> EngineResult<Vec<MergeEvent>> {
        self.require_document(document_id).await?;
        Ok(self.store.list_merge_events(document_id).await?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn apply_transition(
        &self,
        id: DbId,
        transition: &MergeTransition,
    ) -> EngineResult<MergeEvent> {
        self.store
            .transition_merge_event(id, transition)
            .await?
            .ok_or_else(|| settled_elsewhere(id).into())
    }

    /// Best effort: a failure here is logged, never returned.
    async fn mark_failed(&self, event: &MergeEvent, reason: &str) {
        let mut metadata = event.metadata.clone();
        metadata.failure = Some(reason.to_string());
        let transition = MergeTransition {
            from: MergeStatus::Pending,
            to: MergeStatus::Failed,
            metadata,
            resolved_at: None,
        };

        match self.store.transition_merge_event(event.id, &transition).await {
            Ok(Some(_)) => {
                tracing::error!(merge_event_id = event.id, reason, "Merge failed");
            }
            Ok(None) => {
                tracing::warn!(
                    merge_event_id = event.id,
                    reason,
                    "Merge failed after its event was already settled"
                );
            }
            Err(err) => {
                tracing::error!(
                    merge_event_id = event.id,
                    reason,
                    error = %err,
                    "Merge failed and could not be marked failed"
                );
            }
        }
    }

    fn publish_completion(&self, event: &MergeEvent, actor_id: DbId) {
        self.events.publish(
            DocumentEvent::new(names::ANALYSIS_INVALIDATED, event.document_id)
                .with_branch(event.target_branch_id)
                .with_merge(event.id)
                .with_actor(actor_id),
        );
        self.publish_merge(names::MERGE_COMPLETED, event, actor_id);
    }

    fn publish_merge(&self, event_type: &str, event: &MergeEvent, actor_id: DbId) {
        self.events.publish(
            DocumentEvent::new(event_type, event.document_id)
                .with_branch(event.target_branch_id)
                .with_merge(event.id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({
                    "source_branch_id": event.source_branch_id,
                    "outcome": event.metadata.outcome,
                    "merged_version_id": event.metadata.merged_version_id,
                })),
        );
    }
}

fn settled_elsewhere(merge_event_id: DbId) -> CoreError {
    CoreError::Conflict(format!(
        "Merge event {merge_event_id} was settled by another request"
    ))
}
