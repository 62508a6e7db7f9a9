//! Version history limits and content metrics.

use crate::error::CoreError;

/// Default number of versions returned by a history listing.
pub const DEFAULT_VERSION_LIST_LIMIT: i64 = 50;

/// Upper bound on a single history listing, regardless of what is requested.
pub const MAX_VERSION_LIST_LIMIT: i64 = 100;

/// Number of newest versions per branch inspected by the bounded-window
/// ancestor search.
pub const DEFAULT_ANCESTOR_WINDOW: usize = 100;

/// Clamp a requested listing size into `[1, max]`, using `default` when the
/// caller did not ask for a specific size.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}

/// Count whitespace-delimited words.
pub fn word_count(content: &str) -> i32 {
    i32::try_from(content.split_whitespace().count()).unwrap_or(i32::MAX)
}

/// Reject caller-supplied word counts below zero.
pub fn validate_word_count(count: i32) -> Result<(), CoreError> {
    if count < 0 {
        return Err(CoreError::Validation(format!(
            "Word count must not be negative, got {count}"
        )));
    }
    Ok(())
}
