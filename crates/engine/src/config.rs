use draftline_core::ancestry::AncestorStrategy;
use draftline_core::crdt::DEFAULT_TEXT_NAME;
use draftline_core::error::CoreError;
use draftline_core::versioning::{
    DEFAULT_ANCESTOR_WINDOW, DEFAULT_VERSION_LIST_LIMIT, MAX_VERSION_LIST_LIMIT,
};

/// Engine tuning loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// History page size when the caller does not ask for one.
    pub version_list_default_limit: i64,
    /// Largest history page served.
    pub version_list_max_limit: i64,
    /// Versions per branch scanned by the bounded-window ancestor search.
    pub ancestor_window: usize,
    pub ancestor_strategy: AncestorStrategy,
    /// Root text read out of CRDT state snapshots.
    pub crdt_text_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version_list_default_limit: DEFAULT_VERSION_LIST_LIMIT,
            version_list_max_limit: MAX_VERSION_LIST_LIMIT,
            ancestor_window: DEFAULT_ANCESTOR_WINDOW,
            ancestor_strategy: AncestorStrategy::default(),
            crdt_text_name: DEFAULT_TEXT_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default   |
    /// |------------------------------|-----------|
    /// | `VERSION_LIST_DEFAULT_LIMIT` | `50`      |
    /// | `VERSION_LIST_MAX_LIMIT`     | `100`     |
    /// | `ANCESTOR_WINDOW`            | `100`     |
    /// | `ANCESTOR_STRATEGY`          | `lineage` |
    /// | `CRDT_TEXT_NAME`             | `content` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let version_list_default_limit = parse_or(
            &lookup,
            "VERSION_LIST_DEFAULT_LIMIT",
            defaults.version_list_default_limit,
        )?;
        let version_list_max_limit =
            parse_or(&lookup, "VERSION_LIST_MAX_LIMIT", defaults.version_list_max_limit)?;
        let ancestor_window = parse_or(&lookup, "ANCESTOR_WINDOW", defaults.ancestor_window)?;
        let ancestor_strategy =
            parse_or(&lookup, "ANCESTOR_STRATEGY", defaults.ancestor_strategy)?;
        let crdt_text_name = lookup("CRDT_TEXT_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.crdt_text_name);

        if version_list_max_limit < 1 || version_list_default_limit < 1 {
            return Err(CoreError::Validation(
                "Version list limits must be at least 1".to_string(),
            ));
        }
        if version_list_default_limit > version_list_max_limit {
            return Err(CoreError::Validation(format!(
                "VERSION_LIST_DEFAULT_LIMIT ({version_list_default_limit}) exceeds \
                 VERSION_LIST_MAX_LIMIT ({version_list_max_limit})"
            )));
        }
        if ancestor_window == 0 {
            return Err(CoreError::Validation(
                "ANCESTOR_WINDOW must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            version_list_default_limit,
            version_list_max_limit,
            ancestor_window,
            ancestor_strategy,
            crdt_text_name,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Validation(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}
