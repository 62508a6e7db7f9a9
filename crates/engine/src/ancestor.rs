//! Ancestor resolver: the most recent version two branches share.

use draftline_core::ancestry::{
    bounded_window_ancestor, branch_path, lineage_ancestor, AncestorStrategy, BranchWindow,
    VersionLink,
};
use draftline_core::types::DbId;
use draftline_db::models::branch::Branch;
use draftline_db::models::version::Version;

use crate::{Engine, EngineResult};

impl Engine {
    /// Common ancestor of two branches of one document, or `None` when
    /// their histories share nothing. The result does not depend on
    /// argument order.
    pub async fn find_common_ancestor(
        &self,
        branch_a: DbId,
        branch_b: DbId,
    ) -> EngineResult<Option<Version>> {
        let (a, b) = self.require_branch_pair(branch_a, branch_b).await?;
        match self.common_ancestor_id(&a, &b).await? {
            Some(id) => Ok(Some(self.require_version(id).await?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn common_ancestor_id(
        &self,
        a: &Branch,
        b: &Branch,
    ) -> EngineResult<Option<DbId>> {
        if a.id == b.id {
            return Ok(a.head_version_id);
        }

        let found = match self.config.ancestor_strategy {
            AncestorStrategy::Lineage => self.lineage_ancestor_id(a, b).await?,
            AncestorStrategy::BoundedWindow => self.window_ancestor_id(a, b).await?,
        };

        tracing::debug!(
            branch_a = a.id,
            branch_b = b.id,
            strategy = %self.config.ancestor_strategy,
            ancestor_version_id = ?found,
            "Resolved common ancestor"
        );
        Ok(found)
    }

    /// The merge base from the last completed merge of the pair, else the
    /// nearest shared fork point.
    async fn lineage_ancestor_id(&self, a: &Branch, b: &Branch) -> EngineResult<Option<DbId>> {
        let merged = self
            .store
            .latest_completed_merge_between(a.id, b.id)
            .await?
            .and_then(|event| event.metadata.source_version_id);
        if merged.is_some() {
            return Ok(merged);
        }

        let path_a = branch_path(a.head_point(), &a.lineage);
        let path_b = branch_path(b.head_point(), &b.lineage);
        Ok(lineage_ancestor(&path_a, &path_b))
    }

    async fn window_ancestor_id(&self, a: &Branch, b: &Branch) -> EngineResult<Option<DbId>> {
        let window = self.config.ancestor_window;
        let limit = i64::try_from(window).unwrap_or(i64::MAX);
        let (versions_a, versions_b) = futures::try_join!(
            self.store.list_versions(a.id, limit),
            self.store.list_versions(b.id, limit),
        )?;

        let links_a: Vec<VersionLink> = versions_a.iter().map(Version::link).collect();
        let links_b: Vec<VersionLink> = versions_b.iter().map(Version::link).collect();

        let found = bounded_window_ancestor(
            BranchWindow {
                branch_id: a.id,
                versions: &links_a,
                base_version_id: a.base_version_id,
            },
            BranchWindow {
                branch_id: b.id,
                versions: &links_b,
                base_version_id: b.base_version_id,
            },
            window,
        )?;
        Ok(found)
    }
}
