//! Line-level conflict markers for conflicted merges.
//!
//! Both sides are diffed against the ancestor with [`similar`]. Changed
//! ancestor ranges that touch or overlap are grouped into one
//! [`ConflictMarker`]; a marker is `overlapping` when both sides changed the
//! same region differently. [`ConflictData::marked_content`] applies the
//! clean hunks and wraps overlapping ones in diff3-style markers so a human
//! has a starting point for resolution.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffTag};

/// Opening line of an overlapping hunk in marked content.
pub const SOURCE_MARKER: &str = "<<<<<<< source";
/// Separator between the source and target sides of a hunk.
pub const SEPARATOR_MARKER: &str = "=======";
/// Closing line of an overlapping hunk in marked content.
pub const TARGET_MARKER: &str = ">>>>>>> target";

/// One changed region of the ancestor, as seen from both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictMarker {
    /// First ancestor line (0-based) covered by the region.
    pub ancestor_start: usize,
    /// One past the last ancestor line covered by the region.
    pub ancestor_end: usize,
    pub source_lines: Vec<String>,
    pub target_lines: Vec<String>,
    pub overlapping: bool,
}

/// Conflict payload persisted on a conflicted merge event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictData {
    pub source_content: String,
    pub target_content: String,
    pub ancestor_content: Option<String>,
    pub conflict_markers: Vec<ConflictMarker>,
    pub marked_content: String,
}

impl ConflictData {
    /// Build the conflict payload for a source/target pair.
    ///
    /// Without an ancestor the comparison is two-way: the target stands in
    /// for the ancestor and every differing region counts as overlapping.
    pub fn build(source: &str, target: &str, ancestor: Option<&str>) -> Self {
        let base = ancestor.unwrap_or(target);
        let base_lines = split_lines(base);
        let source_lines = split_lines(source);
        let target_lines = split_lines(target);

        let conflict_markers = compute_markers(
            &base_lines,
            &source_lines,
            &target_lines,
            ancestor.is_none(),
        );
        let marked_content = render_marked(&base_lines, &conflict_markers);

        Self {
            source_content: source.to_string(),
            target_content: target.to_string(),
            ancestor_content: ancestor.map(str::to_string),
            conflict_markers,
            marked_content,
        }
    }

    /// Number of regions both sides changed differently.
    pub fn overlapping_count(&self) -> usize {
        self.conflict_markers.iter().filter(|m| m.overlapping).count()
    }
}

// ---------------------------------------------------------------------------
// Hunk computation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Target,
}

#[derive(Debug, Clone)]
struct Hunk {
    side: Side,
    base: Range<usize>,
}

struct Cluster {
    start: usize,
    end: usize,
    hunks: Vec<Hunk>,
}

/// One diff op between the ancestor (`base`) and a side (`new`).
type Op = (DiffTag, Range<usize>, Range<usize>);

/// Split text into lines, keeping line terminators.
fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn diff_ops(base: &[&str], other: &[&str]) -> Vec<Op> {
    capture_diff_slices(Algorithm::Myers, base, other)
        .into_iter()
        .map(|op| op.as_tag_tuple())
        .collect()
}

fn changed_hunks(ops: &[Op], side: Side) -> impl Iterator<Item = Hunk> + '_ {
    ops.iter()
        .filter(|(tag, _, _)| *tag != DiffTag::Equal)
        .map(move |(_, base, _)| Hunk {
            side,
            base: base.clone(),
        })
}

fn compute_markers(
    base: &[&str],
    source: &[&str],
    target: &[&str],
    two_way: bool,
) -> Vec<ConflictMarker> {
    let source_ops = diff_ops(base, source);
    let target_ops = diff_ops(base, target);

    let mut hunks: Vec<Hunk> = changed_hunks(&source_ops, Side::Source)
        .chain(changed_hunks(&target_ops, Side::Target))
        .collect();
    hunks.sort_by_key(|h| (h.base.start, h.base.end));

    let mut clusters: Vec<Cluster> = Vec::new();
    for hunk in hunks {
        match clusters.last_mut() {
            Some(cluster) if hunk.base.start <= cluster.end => {
                cluster.end = cluster.end.max(hunk.base.end);
                cluster.hunks.push(hunk);
            }
            _ => clusters.push(Cluster {
                start: hunk.base.start,
                end: hunk.base.end,
                hunks: vec![hunk],
            }),
        }
    }

    clusters
        .into_iter()
        .map(|cluster| {
            let source_lines = side_lines(&cluster, Side::Source, base, source, &source_ops);
            let target_lines = side_lines(&cluster, Side::Target, base, target, &target_ops);
            let both_sides = cluster.hunks.iter().any(|h| h.side == Side::Source)
                && cluster.hunks.iter().any(|h| h.side == Side::Target);
            ConflictMarker {
                ancestor_start: cluster.start,
                ancestor_end: cluster.end,
                overlapping: (two_way || both_sides) && source_lines != target_lines,
                source_lines,
                target_lines,
            }
        })
        .collect()
}

/// Text of one side over the cluster's ancestor range.
///
/// A side without hunks in the cluster matches the ancestor there. Otherwise
/// both cluster bounds are mapped through the side's full op list, so
/// insertions at either bound land inside the range.
fn side_lines(
    cluster: &Cluster,
    side: Side,
    base: &[&str],
    lines: &[&str],
    ops: &[Op],
) -> Vec<String> {
    if !cluster.hunks.iter().any(|h| h.side == side) {
        return to_owned(&base[cluster.start..cluster.end]);
    }
    let end = map_end(ops, cluster.end).min(lines.len());
    let start = map_start(ops, cluster.start).min(end);
    to_owned(&lines[start..end])
}

/// Side index where ancestor line `pos` begins, before any insertion at
/// `pos`.
fn map_start(ops: &[Op], pos: usize) -> usize {
    for (_, old, new) in ops {
        if old.start == pos {
            return new.start;
        }
        if old.start < pos && pos < old.end {
            return (new.start + (pos - old.start)).min(new.end);
        }
    }
    ops.last().map_or(0, |(_, _, new)| new.end)
}

/// Side index just past ancestor boundary `pos`, after any insertion at
/// `pos`.
fn map_end(ops: &[Op], pos: usize) -> usize {
    let mut end = 0;
    for (tag, old, new) in ops {
        if old.start > pos {
            break;
        }
        if old.start < pos && pos < old.end {
            return (new.start + (pos - old.start)).min(new.end);
        }
        if old.end == pos && (old.start < pos || *tag != DiffTag::Equal) {
            end = new.end;
        }
    }
    end
}

fn to_owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_marked(base: &[&str], markers: &[ConflictMarker]) -> String {
    let mut out = String::new();
    let mut pos = 0;
    for marker in markers {
        base[pos..marker.ancestor_start]
            .iter()
            .for_each(|l| out.push_str(l));

        if marker.overlapping {
            push_line(&mut out, SOURCE_MARKER);
            push_block(&mut out, &marker.source_lines);
            push_line(&mut out, SEPARATOR_MARKER);
            push_block(&mut out, &marker.target_lines);
            push_line(&mut out, TARGET_MARKER);
        } else {
            let original = &base[marker.ancestor_start..marker.ancestor_end];
            let source_unchanged = marker.source_lines.iter().map(String::as_str).eq(original.iter().copied());
            let chosen = if source_unchanged {
                &marker.target_lines
            } else {
                &marker.source_lines
            };
            chosen.iter().for_each(|l| out.push_str(l));
        }
        pos = marker.ancestor_end;
    }
    base[pos..].iter().for_each(|l| out.push_str(l));
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn push_block(out: &mut String, lines: &[String]) {
    for line in lines {
        out.push_str(line);
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
