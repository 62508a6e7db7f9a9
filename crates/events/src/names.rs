//! Event type names published by the engine.

/// Anything derived from a document's text (analysis, search, summaries)
/// must be recomputed. Published when a merge changes a branch head.
pub const ANALYSIS_INVALIDATED: &str = "document.analysis_invalidated";

/// A merge finished, automatically or through manual resolution.
pub const MERGE_COMPLETED: &str = "merge.completed";

/// A merge stopped on conflicting edits and awaits resolution.
pub const MERGE_CONFLICTED: &str = "merge.conflicted";
