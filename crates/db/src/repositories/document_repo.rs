//! Repository for the `documents` table.

use sqlx::PgPool;
use draftline_core::types::DbId;

use crate::models::branch::Branch;
use crate::models::document::{Document, NewDocument};
use crate::repositories::BranchRepo;

/// Column list for documents queries.
const COLUMNS: &str = "id, title, created_by, created_at, updated_at";

pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a document and its `main` branch in one transaction.
    pub async fn create_with_main(
        pool: &PgPool,
        input: &NewDocument,
    ) -> Result<(Document, Branch), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO documents (title, created_by)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let document = sqlx::query_as::<_, Document>(&query)
            .bind(&input.title)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        let main = BranchRepo::insert_main(&mut tx, document.id, input.created_by).await?;

        tx.commit().await?;
        Ok((document, main))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
