//! Repository for the `active_branches` table.

use sqlx::PgPool;
use draftline_core::types::DbId;

use crate::models::active_branch::ActiveBranch;

const COLUMNS: &str = "document_id, user_id, branch_id, updated_at";

pub struct ActiveBranchRepo;

impl ActiveBranchRepo {
    /// Record `branch_id` as the user's active branch, replacing any
    /// previous choice for the document.
    pub async fn upsert(
        pool: &PgPool,
        document_id: DbId,
        user_id: DbId,
        branch_id: DbId,
    ) -> Result<ActiveBranch, sqlx::Error> {
        let query = format!(
            "INSERT INTO active_branches (document_id, user_id, branch_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (document_id, user_id)
             DO UPDATE SET branch_id = EXCLUDED.branch_id, updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActiveBranch>(&query)
            .bind(document_id)
            .bind(user_id)
            .bind(branch_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        document_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ActiveBranch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM active_branches
             WHERE document_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, ActiveBranch>(&query)
            .bind(document_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
