//! Repository for the `merge_events` table.

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use draftline_core::merge::MergeStatus;
use draftline_core::types::DbId;

use crate::models::merge_event::{MergeEvent, MergeTransition, NewMergeEvent};

/// Column list for merge_events queries.
const COLUMNS: &str = "id, document_id, source_branch_id, target_branch_id, \
    initiator_id, status, metadata, resolved_at, created_at";

pub struct MergeEventRepo;

impl MergeEventRepo {
    /// Insert a new `pending` merge event.
    pub async fn create(pool: &PgPool, input: &NewMergeEvent) -> Result<MergeEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO merge_events
                (document_id, source_branch_id, target_branch_id, initiator_id,
                 status, metadata)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MergeEvent>(&query)
            .bind(input.document_id)
            .bind(input.source_branch_id)
            .bind(input.target_branch_id)
            .bind(input.initiator_id)
            .bind(MergeStatus::Pending.as_str())
            .bind(Json(&input.metadata))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MergeEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM merge_events WHERE id = $1");
        sqlx::query_as::<_, MergeEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Compare-and-swap the status. Returns `None` if the event is missing
    /// or no longer in `transition.from`.
    ///
    /// Generic over the executor so it can run on the pool or inside an
    /// open transaction.
    pub async fn transition<'e, E>(
        executor: E,
        id: DbId,
        transition: &MergeTransition,
    ) -> Result<Option<MergeEvent>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE merge_events SET
                status = $1,
                metadata = $2,
                resolved_at = COALESCE($3, resolved_at)
             WHERE id = $4 AND status = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MergeEvent>(&query)
            .bind(transition.to.as_str())
            .bind(Json(&transition.metadata))
            .bind(transition.resolved_at)
            .bind(id)
            .bind(transition.from.as_str())
            .fetch_optional(executor)
            .await
    }

    /// All merge events for a document, newest first.
    pub async fn list_by_document(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<MergeEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM merge_events
             WHERE document_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, MergeEvent>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// The most recently settled completed merge between two branches.
    pub async fn latest_completed_between(
        pool: &PgPool,
        branch_a: DbId,
        branch_b: DbId,
    ) -> Result<Option<MergeEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM merge_events
             WHERE status = $1
               AND ((source_branch_id = $2 AND target_branch_id = $3)
                 OR (source_branch_id = $3 AND target_branch_id = $2))
             ORDER BY resolved_at DESC NULLS LAST, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, MergeEvent>(&query)
            .bind(MergeStatus::Completed.as_str())
            .bind(branch_a)
            .bind(branch_b)
            .fetch_optional(pool)
            .await
    }
}
