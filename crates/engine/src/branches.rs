//! Branch directory: documents, branches, and each user's active branch.

use futures::future::try_join_all;
use serde::Serialize;
use draftline_core::ancestry::branch_path;
use draftline_core::branching::{self, branch_slug, MAIN_BRANCH_NAME};
use draftline_core::error::CoreError;
use draftline_core::types::DbId;
use draftline_db::models::active_branch::ActiveBranch;
use draftline_db::models::branch::{
    Branch, BranchSummary, BranchUpdate, CreateBranch, NewBranch, UpdateBranch,
};
use draftline_db::models::document::{Document, NewDocument};

use crate::{Engine, EngineResult};

/// A new document and the `main` branch created with it.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedDocument {
    pub document: Document,
    pub main_branch: Branch,
}

impl Engine {
    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    pub async fn create_document(
        &self,
        title: &str,
        created_by: DbId,
    ) -> EngineResult<CreatedDocument> {
        branching::validate_document_title(title)?;

        let (document, main_branch) = self
            .store
            .create_document(&NewDocument {
                title: title.to_string(),
                created_by,
            })
            .await?;

        tracing::info!(
            document_id = document.id,
            main_branch_id = main_branch.id,
            created_by,
            "Document created"
        );
        Ok(CreatedDocument {
            document,
            main_branch,
        })
    }

    pub async fn get_document(&self, id: DbId) -> EngineResult<Document> {
        self.require_document(id).await
    }

    // -----------------------------------------------------------------------
    // Branches
    // -----------------------------------------------------------------------

    /// The root branch of a document.
    pub async fn main_branch(&self, document_id: DbId) -> EngineResult<Branch> {
        self.store
            .find_branch_by_slug(document_id, MAIN_BRANCH_NAME)
            .await?
            .ok_or_else(|| {
                CoreError::Internal(format!("Document {document_id} has no main branch")).into()
            })
    }

    /// Fork a new branch at the parent's current head.
    ///
    /// Without `parent_branch_id` the branch forks from `main`.
    pub async fn create_branch(
        &self,
        document_id: DbId,
        input: &CreateBranch,
        created_by: DbId,
    ) -> EngineResult<Branch> {
        branching::validate_fork_name(&input.name)?;
        branching::validate_branch_description(input.description.as_deref())?;
        self.require_document(document_id).await?;

        let parent = match input.parent_branch_id {
            Some(id) => self.require_branch(id).await?,
            None => self.main_branch(document_id).await?,
        };
        if parent.document_id != document_id {
            return Err(CoreError::InvalidBranchPair(format!(
                "Parent branch {} belongs to document {}, not {document_id}",
                parent.id, parent.document_id
            ))
            .into());
        }
        branching::validate_lineage_depth(parent.lineage.len())?;

        let count = self.store.count_branches(document_id).await?;
        branching::validate_branch_count(count)?;

        let slug = branch_slug(&input.name);
        self.ensure_slug_free(document_id, &slug, None).await?;

        let branch = self
            .store
            .create_branch(&NewBranch {
                document_id,
                name: input.name.clone(),
                slug,
                description: input.description.clone(),
                parent_branch_id: parent.id,
                base_version_id: parent.head_version_id,
                lineage: branch_path(parent.head_point(), &parent.lineage),
                created_by,
            })
            .await?;

        tracing::info!(
            branch_id = branch.id,
            document_id,
            parent_branch_id = parent.id,
            base_version_id = ?branch.base_version_id,
            name = %branch.name,
            "Branch created"
        );
        Ok(branch)
    }

    pub async fn get_branch(&self, id: DbId) -> EngineResult<Branch> {
        self.require_branch(id).await
    }

    /// Every branch of a document with its head summary and version count.
    pub async fn list_branches(&self, document_id: DbId) -> EngineResult<Vec<BranchSummary>> {
        self.require_document(document_id).await?;
        let branches = self.store.list_branches(document_id).await?;

        let summaries = try_join_all(branches.into_iter().map(|branch| async move {
            let head = self.head_of(&branch).await?.map(|v| v.summary());
            let version_count = self.store.count_versions(branch.id).await?;
            EngineResult::Ok(BranchSummary {
                branch,
                head,
                version_count,
            })
        }))
        .await?;

        tracing::debug!(document_id, count = summaries.len(), "Listed branches");
        Ok(summaries)
    }

    /// Rename a branch or change its description. Renaming re-derives the
    /// slug; `main` cannot be renamed.
    pub async fn update_branch(&self, id: DbId, input: &UpdateBranch) -> EngineResult<Branch> {
        let branch = self.require_branch(id).await?;
        branching::validate_branch_description(input.description.as_deref())?;

        let mut update = BranchUpdate {
            description: input.description.clone(),
            ..BranchUpdate::default()
        };

        if let Some(name) = input.name.as_deref().filter(|n| *n != branch.name) {
            if branch.is_main() {
                return Err(CoreError::ProtectedBranch {
                    name: branch.name,
                    action: "renamed",
                }
                .into());
            }
            branching::validate_fork_name(name)?;
            let slug = branch_slug(name);
            self.ensure_slug_free(branch.document_id, &slug, Some(id))
                .await?;
            update.name = Some(name.to_string());
            update.slug = Some(slug);
        }

        let updated = self
            .store
            .update_branch(id, &update)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Branch",
                id,
            })?;

        tracing::info!(branch_id = id, name = %updated.name, "Branch updated");
        Ok(updated)
    }

    /// Delete a branch row. Its versions stay readable; `main` is protected.
    pub async fn delete_branch(&self, id: DbId) -> EngineResult<()> {
        let branch = self.require_branch(id).await?;
        if branch.is_main() {
            return Err(CoreError::ProtectedBranch {
                name: branch.name,
                action: "deleted",
            }
            .into());
        }

        if !self.store.delete_branch(id).await? {
            return Err(CoreError::NotFound {
                entity: "Branch",
                id,
            }
            .into());
        }

        tracing::info!(branch_id = id, document_id = branch.document_id, "Branch deleted");
        Ok(())
    }

    async fn ensure_slug_free(
        &self,
        document_id: DbId,
        slug: &str,
        except: Option<DbId>,
    ) -> EngineResult<()> {
        match self.store.find_branch_by_slug(document_id, slug).await? {
            Some(existing) if Some(existing.id) != except => Err(CoreError::Conflict(format!(
                "A branch with slug '{slug}' already exists in this document"
            ))
            .into()),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Active branch
    // -----------------------------------------------------------------------

    /// Record which branch `user_id` is working on in a document.
    pub async fn switch_active_branch(
        &self,
        document_id: DbId,
        branch_id: DbId,
        user_id: DbId,
    ) -> EngineResult<ActiveBranch> {
        let branch = self.require_branch(branch_id).await?;
        if branch.document_id != document_id {
            return Err(CoreError::InvalidBranchPair(format!(
                "Branch {branch_id} does not belong to document {document_id}"
            ))
            .into());
        }

        let active = self
            .store
            .set_active_branch(document_id, user_id, branch_id)
            .await?;

        tracing::info!(document_id, branch_id, user_id, "Active branch switched");
        Ok(active)
    }

    /// The user's active branch, or `main` when none was chosen or the
    /// chosen branch no longer exists.
    pub async fn active_branch(&self, document_id: DbId, user_id: DbId) -> EngineResult<Branch> {
        self.require_document(document_id).await?;
        if let Some(active) = self.store.find_active_branch(document_id, user_id).await? {
            if let Some(branch) = self.store.find_branch(active.branch_id).await? {
                return Ok(branch);
            }
        }
        self.main_branch(document_id).await
    }
}
