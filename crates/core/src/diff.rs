//! Summary comparison between two versions, used by branch diffs.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// Line counts of a change from `old` to `new`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub lines_added: usize,
    pub lines_removed: usize,
}

/// Count inserted and deleted lines between two texts.
pub fn line_stats(old: &str, new: &str) -> LineStats {
    let diff = TextDiff::from_lines(old, new);
    diff.iter_all_changes()
        .fold(LineStats::default(), |mut stats, change| {
            match change.tag() {
                ChangeTag::Insert => stats.lines_added += 1,
                ChangeTag::Delete => stats.lines_removed += 1,
                ChangeTag::Equal => {}
            }
            stats
        })
}

/// Comparison of two serialized CRDT states.
///
/// The states are opaque here; only their size and byte equality are
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiff {
    pub source_bytes: usize,
    pub target_bytes: usize,
    pub identical: bool,
}

impl StateDiff {
    /// Present only when both sides carry CRDT state.
    pub fn between(source: Option<&[u8]>, target: Option<&[u8]>) -> Option<Self> {
        let (source, target) = (source?, target?);
        Some(Self {
            source_bytes: source.len(),
            target_bytes: target.len(),
            identical: source == target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_have_no_changes() {
        assert_eq!(line_stats("a\nb\n", "a\nb\n"), LineStats::default());
    }

    #[test]
    fn replaced_line_counts_both_ways() {
        let stats = line_stats("a\nb\nc\n", "a\nB\nc\nd\n");
        assert_eq!(stats.lines_added, 2);
        assert_eq!(stats.lines_removed, 1);
    }

    #[test]
    fn state_diff_requires_both_states() {
        assert_eq!(StateDiff::between(Some(&[1, 2]), None), None);
        assert_eq!(StateDiff::between(None, Some(&[1])), None);

        let diff = StateDiff::between(Some(&[1, 2, 3]), Some(&[1, 2])).unwrap();
        assert_eq!(diff.source_bytes, 3);
        assert_eq!(diff.target_bytes, 2);
        assert!(!diff.identical);
    }
}
