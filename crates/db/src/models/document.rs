//! Document models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use draftline_core::types::{DbId, Timestamp};

/// A row from the `documents` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Document {
    pub id: DbId,
    pub title: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for creating a document.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub title: String,
}

/// Insert input: the store creates the document and its `main` branch
/// together.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub created_by: DbId,
}
