//! Common-ancestor search between two branches of one document.
//!
//! Two strategies are provided:
//!
//! - [`lineage_ancestor`] walks the fork chains stored on each branch. It is
//!   exact and costs O(lineage depth).
//! - [`bounded_window_ancestor`] scans the newest versions of each branch.
//!   It only sees a fixed window of history and fails with
//!   [`CoreError::NoCommonAncestor`] when that window may hide the answer.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::branching::ForkPoint;
use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorStrategy {
    #[default]
    Lineage,
    BoundedWindow,
}

impl AncestorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lineage => "lineage",
            Self::BoundedWindow => "bounded_window",
        }
    }
}

impl fmt::Display for AncestorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AncestorStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lineage" => Ok(Self::Lineage),
            "bounded_window" => Ok(Self::BoundedWindow),
            other => Err(CoreError::Validation(format!(
                "Unknown ancestor strategy '{other}'. Must be one of: lineage, bounded_window"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Lineage strategy
// ---------------------------------------------------------------------------

/// A branch's full path to the root: its own current head first, followed
/// by its stored lineage. This is also the lineage of a child forked at
/// that head.
pub fn branch_path(current: ForkPoint, lineage: &[ForkPoint]) -> Vec<ForkPoint> {
    let mut path = Vec::with_capacity(lineage.len() + 1);
    path.push(current);
    path.extend_from_slice(lineage);
    path
}

/// Find the most recent version shared by two branch paths.
///
/// Paths run from each branch up to the root, so the branches they have in
/// common form a shared suffix. On the nearest shared branch both sides saw a
/// prefix of that branch's linear history; the shorter prefix (smaller `seq`)
/// ends at the common ancestor. When neither side saw a version there
/// (`seq == 0`) the search continues towards the root.
///
/// The result does not depend on argument order.
pub fn lineage_ancestor(path_a: &[ForkPoint], path_b: &[ForkPoint]) -> Option<DbId> {
    for a in path_a {
        let Some(b) = path_b.iter().find(|p| p.branch_id == a.branch_id) else {
            continue;
        };
        let older = if a.seq <= b.seq { a } else { b };
        if older.seq > 0 {
            if let Some(version_id) = older.version_id {
                return Some(version_id);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Bounded-window strategy
// ---------------------------------------------------------------------------

/// The part of a version the window scan needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionLink {
    pub id: DbId,
    pub parent_version_id: Option<DbId>,
}

/// One side of a bounded-window search: the newest-first window of a
/// branch's versions and the branch's fork point.
#[derive(Debug, Clone, Copy)]
pub struct BranchWindow<'a> {
    pub branch_id: DbId,
    pub versions: &'a [VersionLink],
    pub base_version_id: Option<DbId>,
}

/// Scan two newest-first windows of version history for a shared version.
///
/// 1. Walking each window newest to oldest, a version whose id, or whose
///    parent, appears in the other window is a candidate.
/// 2. Failing that, a fork point that appears in the other window, or two
///    equal fork points, is a candidate.
///
/// Version ids are allocated monotonically, so the highest candidate id is
/// the most recent shared version; taking it makes the result symmetric.
///
/// If nothing matches and either window was filled to `window`, older
/// history was never inspected and the search fails with
/// [`CoreError::NoCommonAncestor`]. Complete windows with no match mean the
/// branches share nothing.
pub fn bounded_window_ancestor(
    a: BranchWindow<'_>,
    b: BranchWindow<'_>,
    window: usize,
) -> Result<Option<DbId>, CoreError> {
    let ids_a: HashSet<DbId> = a.versions.iter().map(|v| v.id).collect();
    let ids_b: HashSet<DbId> = b.versions.iter().map(|v| v.id).collect();

    let shared = first_shared(b.versions, &ids_a)
        .into_iter()
        .chain(first_shared(a.versions, &ids_b))
        .max();
    if shared.is_some() {
        return Ok(shared);
    }

    let mut fork_candidates = Vec::new();
    if let Some(base) = b.base_version_id {
        if ids_a.contains(&base) || a.base_version_id == Some(base) {
            fork_candidates.push(base);
        }
    }
    if let Some(base) = a.base_version_id {
        if ids_b.contains(&base) {
            fork_candidates.push(base);
        }
    }
    if let Some(found) = fork_candidates.into_iter().max() {
        return Ok(Some(found));
    }

    if a.versions.len() >= window || b.versions.len() >= window {
        return Err(CoreError::NoCommonAncestor {
            branch_a: a.branch_id,
            branch_b: b.branch_id,
            window,
        });
    }
    Ok(None)
}

/// Newest version in `versions` that is in `other`, or whose parent is.
fn first_shared(versions: &[VersionLink], other: &HashSet<DbId>) -> Option<DbId> {
    versions.iter().find_map(|v| {
        if other.contains(&v.id) {
            Some(v.id)
        } else {
            v.parent_version_id.filter(|p| other.contains(p))
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn fp(branch_id: DbId, version_id: Option<DbId>, seq: i64) -> ForkPoint {
        ForkPoint::new(branch_id, version_id, seq)
    }

    fn link(id: DbId, parent: Option<DbId>) -> VersionLink {
        VersionLink {
            id,
            parent_version_id: parent,
        }
    }

    // -- lineage -------------------------------------------------------------

    #[test]
    fn child_and_parent_share_fork_point() {
        // main: v1 (seq 1), then v3 (seq 2). feature forked at v1, then v2.
        let main = branch_path(fp(1, Some(3), 2), &[]);
        let feature = branch_path(fp(2, Some(2), 1), &[fp(1, Some(1), 1)]);

        assert_eq!(lineage_ancestor(&main, &feature), Some(1));
        assert_eq!(feature[1..], [fp(1, Some(1), 1)]);
        assert_eq!(lineage_ancestor(&feature, &main), Some(1));
    }

    #[test]
    fn parent_behind_fork_point_uses_parent_head() {
        // Parent has seq 1 now; child recorded seq 1 too: identical point.
        let main = branch_path(fp(1, Some(1), 1), &[]);
        let feature = branch_path(fp(2, None, 0), &[fp(1, Some(1), 1)]);
        assert_eq!(lineage_ancestor(&main, &feature), Some(1));
    }

    #[test]
    fn siblings_meet_at_older_fork() {
        // a forked main at seq 2 (v5); b forked main at seq 4 (v9).
        let a = branch_path(fp(2, Some(20), 3), &[fp(1, Some(5), 2)]);
        let b = branch_path(fp(3, Some(30), 1), &[fp(1, Some(9), 4)]);
        assert_eq!(lineage_ancestor(&a, &b), Some(5));
        assert_eq!(lineage_ancestor(&b, &a), Some(5));
    }

    #[test]
    fn nested_branch_against_grandparent() {
        let root = fp(1, Some(2), 2);
        let mid_lineage = [fp(1, Some(1), 1)];
        let leaf = branch_path(fp(3, None, 0), &[fp(2, Some(7), 1), fp(1, Some(1), 1)]);
        let main = branch_path(root, &[]);
        let mid = branch_path(fp(2, Some(8), 2), &mid_lineage);

        assert_eq!(lineage_ancestor(&leaf, &main), Some(1));
        assert_eq!(lineage_ancestor(&leaf, &mid), Some(7));
    }

    #[test]
    fn empty_shared_branch_continues_to_root() {
        // mid had no versions when both leaves forked; mid itself forked main at v4.
        let left = branch_path(fp(3, Some(30), 1), &[fp(2, None, 0), fp(1, Some(4), 2)]);
        let right = branch_path(fp(4, Some(40), 1), &[fp(2, None, 0), fp(1, Some(4), 2)]);
        assert_eq!(lineage_ancestor(&left, &right), Some(4));
    }

    #[test]
    fn empty_histories_have_no_ancestor() {
        let main = branch_path(fp(1, None, 0), &[]);
        let feature = branch_path(fp(2, None, 0), &[fp(1, None, 0)]);
        assert_eq!(lineage_ancestor(&main, &feature), None);
    }

    // -- bounded window ------------------------------------------------------

    #[test]
    fn window_finds_fork_point_in_other_window() {
        let main = [link(3, Some(1)), link(1, None)];
        let feature = [link(2, None)];
        let a = BranchWindow {
            branch_id: 1,
            versions: &main,
            base_version_id: None,
        };
        let b = BranchWindow {
            branch_id: 2,
            versions: &feature,
            base_version_id: Some(1),
        };
        assert_eq!(bounded_window_ancestor(a, b, 100).unwrap(), Some(1));
        assert_eq!(bounded_window_ancestor(b, a, 100).unwrap(), Some(1));
    }

    #[test]
    fn window_prefers_shared_version_records() {
        let a_versions = [link(8, Some(6)), link(6, Some(4))];
        let b_versions = [link(9, Some(6)), link(6, Some(4))];
        let a = BranchWindow {
            branch_id: 1,
            versions: &a_versions,
            base_version_id: None,
        };
        let b = BranchWindow {
            branch_id: 2,
            versions: &b_versions,
            base_version_id: None,
        };
        assert_eq!(bounded_window_ancestor(a, b, 100).unwrap(), Some(6));
        assert_eq!(bounded_window_ancestor(b, a, 100).unwrap(), Some(6));
    }

    #[test]
    fn window_matches_equal_fork_points() {
        let left = [link(5, None)];
        let right = [link(6, None)];
        let a = BranchWindow {
            branch_id: 2,
            versions: &left,
            base_version_id: Some(1),
        };
        let b = BranchWindow {
            branch_id: 3,
            versions: &right,
            base_version_id: Some(1),
        };
        assert_eq!(bounded_window_ancestor(a, b, 100).unwrap(), Some(1));
    }

    #[test]
    fn complete_windows_without_match_yield_none() {
        let left = [link(5, None)];
        let right = [link(6, None)];
        let a = BranchWindow {
            branch_id: 2,
            versions: &left,
            base_version_id: None,
        };
        let b = BranchWindow {
            branch_id: 3,
            versions: &right,
            base_version_id: None,
        };
        assert_eq!(bounded_window_ancestor(a, b, 100).unwrap(), None);
    }

    #[test]
    fn full_window_without_match_is_hard_failure() {
        // main advanced past the window since feature forked at v1.
        let main: Vec<VersionLink> = (10..13).rev().map(|id| link(id, Some(id - 1))).collect();
        let feature = [link(2, None)];
        let a = BranchWindow {
            branch_id: 1,
            versions: &main,
            base_version_id: None,
        };
        let b = BranchWindow {
            branch_id: 2,
            versions: &feature,
            base_version_id: Some(1),
        };
        assert_matches!(
            bounded_window_ancestor(a, b, 3),
            Err(CoreError::NoCommonAncestor {
                branch_a: 1,
                branch_b: 2,
                window: 3
            })
        );
    }

    // -- strategy ------------------------------------------------------------

    #[test]
    fn strategy_parses_known_names() {
        assert_eq!("lineage".parse::<AncestorStrategy>().unwrap(), AncestorStrategy::Lineage);
        assert_eq!(
            "bounded_window".parse::<AncestorStrategy>().unwrap(),
            AncestorStrategy::BoundedWindow
        );
        assert!("dag".parse::<AncestorStrategy>().is_err());
        assert_eq!(AncestorStrategy::default().to_string(), "lineage");
    }
}
