//! Repository for the `versions` table.
//!
//! Versions are insert-only. An append locks the owning branch row, links
//! the new version to the current head, and advances the head pointer
//! before the transaction commits, so concurrent appends on one branch
//! form a single chain.

use sqlx::{PgPool, Postgres, Transaction};
use draftline_core::types::DbId;

use crate::models::version::{HeadExpectation, NewVersion, Version};
use crate::store::StoreError;

/// Column list for versions queries.
const COLUMNS: &str = "id, document_id, branch_id, seq, parent_version_id, \
    content, crdt_state, word_count, author_id, created_at";

pub struct VersionRepo;

impl VersionRepo {
    /// Append a version on its branch inside `tx`.
    ///
    /// Fails with [`StoreError::BranchNotFound`] for a missing branch and
    /// [`StoreError::ConflictingWrite`] when `expected` does not admit the
    /// locked head.
    pub async fn append(
        tx: &mut Transaction<'_, Postgres>,
        input: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Version, StoreError> {
        let head: Option<(DbId, Option<DbId>, i64)> = sqlx::query_as(
            "SELECT document_id, head_version_id, head_seq
             FROM branches WHERE id = $1
             FOR UPDATE",
        )
        .bind(input.branch_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some((document_id, head_version_id, head_seq)) = head else {
            return Err(StoreError::BranchNotFound(input.branch_id));
        };
        if !expected.admits(head_version_id) {
            return Err(StoreError::ConflictingWrite {
                branch_id: input.branch_id,
            });
        }

        let query = format!(
            "INSERT INTO versions
                (document_id, branch_id, seq, parent_version_id, content,
                 crdt_state, word_count, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let version = sqlx::query_as::<_, Version>(&query)
            .bind(document_id)
            .bind(input.branch_id)
            .bind(head_seq + 1)
            .bind(head_version_id)
            .bind(&input.content)
            .bind(&input.crdt_state)
            .bind(input.word_count)
            .bind(input.author_id)
            .fetch_one(&mut **tx)
            .await?;

        let moved = sqlx::query(
            "UPDATE branches
             SET head_version_id = $1, head_seq = $2, updated_at = NOW()
             WHERE id = $3 AND head_seq = $4",
        )
        .bind(version.id)
        .bind(version.seq)
        .bind(input.branch_id)
        .bind(head_seq)
        .execute(&mut **tx)
        .await?;
        if moved.rows_affected() != 1 {
            return Err(StoreError::ConflictingWrite {
                branch_id: input.branch_id,
            });
        }

        Ok(version)
    }

    /// Find a version by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Version>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM versions WHERE id = $1");
        sqlx::query_as::<_, Version>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The newest `limit` versions of a branch, newest first.
    pub async fn list_by_branch(
        pool: &PgPool,
        branch_id: DbId,
        limit: i64,
    ) -> Result<Vec<Version>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM versions
             WHERE branch_id = $1
             ORDER BY seq DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Version>(&query)
            .bind(branch_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_branch(pool: &PgPool, branch_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM versions WHERE branch_id = $1")
            .bind(branch_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
