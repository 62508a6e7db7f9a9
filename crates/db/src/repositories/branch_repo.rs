//! Repository for the `branches` table.

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use draftline_core::branching::MAIN_BRANCH_NAME;
use draftline_core::types::DbId;

use crate::models::branch::{Branch, BranchUpdate, NewBranch};

/// Column list for branches queries.
pub(crate) const COLUMNS: &str = "id, document_id, name, slug, description, \
    parent_branch_id, base_version_id, lineage, head_version_id, head_seq, \
    created_by, created_at, updated_at";

/// Provides CRUD operations for document branches.
pub struct BranchRepo;

impl BranchRepo {
    /// Insert the root branch of a freshly created document.
    pub async fn insert_main(
        tx: &mut Transaction<'_, Postgres>,
        document_id: DbId,
        created_by: DbId,
    ) -> Result<Branch, sqlx::Error> {
        let query = format!(
            "INSERT INTO branches (document_id, name, slug, created_by)
             VALUES ($1, $2, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Branch>(&query)
            .bind(document_id)
            .bind(MAIN_BRANCH_NAME)
            .bind(created_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert a forked branch, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewBranch) -> Result<Branch, sqlx::Error> {
        let query = format!(
            "INSERT INTO branches
                (document_id, name, slug, description, parent_branch_id,
                 base_version_id, lineage, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Branch>(&query)
            .bind(input.document_id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.parent_branch_id)
            .bind(input.base_version_id)
            .bind(Json(&input.lineage))
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a branch by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Branch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM branches WHERE id = $1");
        sqlx::query_as::<_, Branch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        document_id: DbId,
        slug: &str,
    ) -> Result<Option<Branch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM branches
             WHERE document_id = $1 AND slug = $2"
        );
        sqlx::query_as::<_, Branch>(&query)
            .bind(document_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List all branches for a document, `main` first, then by creation order.
    pub async fn list_by_document(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<Branch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM branches
             WHERE document_id = $1
             ORDER BY (name = $2) DESC, id ASC"
        );
        sqlx::query_as::<_, Branch>(&query)
            .bind(document_id)
            .bind(MAIN_BRANCH_NAME)
            .fetch_all(pool)
            .await
    }

    /// Count branches for a document.
    pub async fn count_by_document(pool: &PgPool, document_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM branches WHERE document_id = $1")
            .bind(document_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update a branch. Returns the updated row, or `None` if not found.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &BranchUpdate,
    ) -> Result<Option<Branch>, sqlx::Error> {
        let query = format!(
            "UPDATE branches SET
                name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                description = COALESCE($3, description),
                updated_at = NOW()
             WHERE id = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Branch>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a branch row. Versions are kept. Returns `true` if a row was
    /// removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
