//! Branch naming, slug derivation, validation limits, and fork lineage.
//!
//! Every document has exactly one root branch, [`MAIN_BRANCH_NAME`]. All other
//! branches are forked from an existing branch and carry their full fork
//! chain ([`ForkPoint`]s up to the root) so ancestor lookups never have to
//! scan raw version history.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Name of the root branch created with every document.
pub const MAIN_BRANCH_NAME: &str = "main";

/// Maximum allowed length for a branch name.
pub const MAX_BRANCH_NAME_LENGTH: usize = 100;

/// Maximum allowed length for a branch description.
pub const MAX_BRANCH_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum fork chain length (number of ancestor branches).
pub const MAX_LINEAGE_DEPTH: usize = 32;

/// Maximum number of branches per document.
pub const MAX_BRANCHES_PER_DOCUMENT: i64 = 50;

/// Maximum allowed length for a document title.
pub const MAX_DOCUMENT_TITLE_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Fork lineage
// ---------------------------------------------------------------------------

/// The state of one branch at a point in time: its head version and the
/// head's position (`seq`) on that branch.
///
/// A branch's lineage is a list of these, one per ancestor branch, ordered
/// from the immediate parent up to the root. `seq == 0` means the branch had
/// no versions at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkPoint {
    pub branch_id: DbId,
    pub version_id: Option<DbId>,
    pub seq: i64,
}

impl ForkPoint {
    pub fn new(branch_id: DbId, version_id: Option<DbId>, seq: i64) -> Self {
        Self {
            branch_id,
            version_id,
            seq,
        }
    }
}

// ---------------------------------------------------------------------------
// Slug
// ---------------------------------------------------------------------------

/// Derive a URL-safe slug from a branch name.
///
/// Lowercases, turns whitespace runs into a hyphen, strips anything outside
/// `[a-z0-9-]`, then collapses repeated hyphens and trims them from both ends.
pub fn branch_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_hyphen = false;
    for c in name.to_lowercase().chars() {
        let mapped = if c.is_whitespace() || c == '-' {
            '-'
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            continue;
        };
        if mapped == '-' {
            if !prev_hyphen {
                slug.push('-');
            }
            prev_hyphen = true;
        } else {
            slug.push(mapped);
            prev_hyphen = false;
        }
    }
    slug.trim_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Returns true for the protected root branch name.
pub fn is_main_branch(name: &str) -> bool {
    name == MAIN_BRANCH_NAME
}

/// Validate a branch name: non-empty, trimmed, within
/// [`MAX_BRANCH_NAME_LENGTH`], producing a non-empty slug.
pub fn validate_branch_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Branch name must not be empty".to_string(),
        ));
    }
    if trimmed.len() != name.len() {
        return Err(CoreError::Validation(
            "Branch name must not have leading or trailing whitespace".to_string(),
        ));
    }
    let chars = name.chars().count();
    if chars > MAX_BRANCH_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Branch name must not exceed {MAX_BRANCH_NAME_LENGTH} characters, got {chars}"
        )));
    }
    if branch_slug(name).is_empty() {
        return Err(CoreError::Validation(format!(
            "Branch name '{name}' must contain at least one letter or digit"
        )));
    }
    Ok(())
}

/// Validate the name of a branch being forked or renamed.
///
/// On top of [`validate_branch_name`], rejects the reserved root name.
pub fn validate_fork_name(name: &str) -> Result<(), CoreError> {
    validate_branch_name(name)?;
    if branch_slug(name) == MAIN_BRANCH_NAME {
        return Err(CoreError::Validation(format!(
            "'{MAIN_BRANCH_NAME}' is reserved for the root branch"
        )));
    }
    Ok(())
}

/// Validate an optional branch description length.
pub fn validate_branch_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.chars().count() > MAX_BRANCH_DESCRIPTION_LENGTH => Err(CoreError::Validation(format!(
            "Branch description must not exceed {MAX_BRANCH_DESCRIPTION_LENGTH} characters"
        ))),
        _ => Ok(()),
    }
}

/// Validate that forking from a branch with `parent_depth` ancestors stays
/// within [`MAX_LINEAGE_DEPTH`].
pub fn validate_lineage_depth(parent_depth: usize) -> Result<(), CoreError> {
    if parent_depth >= MAX_LINEAGE_DEPTH {
        return Err(CoreError::Validation(format!(
            "Maximum branch nesting depth is {MAX_LINEAGE_DEPTH}, parent is at depth {parent_depth}"
        )));
    }
    Ok(())
}

/// Validate that the branch count for a document does not exceed
/// [`MAX_BRANCHES_PER_DOCUMENT`].
pub fn validate_branch_count(current_count: i64) -> Result<(), CoreError> {
    if current_count >= MAX_BRANCHES_PER_DOCUMENT {
        return Err(CoreError::Validation(format!(
            "Maximum branches per document is {MAX_BRANCHES_PER_DOCUMENT}, \
             document already has {current_count}"
        )));
    }
    Ok(())
}

/// Validate a document title (non-empty, <= [`MAX_DOCUMENT_TITLE_LENGTH`]).
pub fn validate_document_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation(
            "Document title must not be empty".into(),
        ));
    }
    if title.chars().count() > MAX_DOCUMENT_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Document title must be at most {MAX_DOCUMENT_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
