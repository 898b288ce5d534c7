//! Line-level configuration diffs.
//!
//! Built on `similar`'s Myers implementation. The edit script is grouped
//! into hunks with a context radius, the same windowing `diff -u` uses.

use std::fmt::Write as _;

use serde::Serialize;
use similar::{Algorithm, ChangeTag, DiffOp};

use super::text::{ConfigSource, ConfigText};

/// Default number of unchanged lines kept around each change.
pub const DEFAULT_CONTEXT: usize = 3;

/// Classification of one line in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Only in the candidate.
    Added,
    /// Only in the reference.
    Removed,
    /// Unchanged, shown because it is near a change.
    Context,
    /// Unchanged, shown because windowing is off.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub text: String,
    /// 1-based line in the reference; `None` for added lines.
    pub old_line: Option<usize>,
    /// 1-based line in the candidate; `None` for removed lines.
    pub new_line: Option<usize>,
}

/// A run of entries with its position in both texts.
///
/// Starts are 1-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub entries: Vec<DiffEntry>,
}

impl Hunk {
    fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            unified_range(self.old_start, self.old_len),
            unified_range(self.new_start, self.new_len)
        )
    }
}

/// `start,len` as unified diff writes it: a lone line omits the length,
/// an empty range names the line before it.
fn unified_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start.saturating_sub(1)),
        1 => start.to_string(),
        _ => format!("{start},{len}"),
    }
}

/// Added/removed line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

/// Differences between a reference and a candidate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub from: ConfigSource,
    pub to: ConfigSource,
    pub hunks: Vec<Hunk>,
}

impl Diff {
    /// All entries in emission order, across hunks.
    pub fn entries(&self) -> impl Iterator<Item = &DiffEntry> {
        self.hunks.iter().flat_map(|hunk| hunk.entries.iter())
    }

    pub fn stats(&self) -> DiffStats {
        self.entries()
            .fold(DiffStats::default(), |mut stats, entry| {
                match entry.kind {
                    DiffKind::Added => stats.added += 1,
                    DiffKind::Removed => stats.removed += 1,
                    DiffKind::Context | DiffKind::Unchanged => {}
                }
                stats
            })
    }

    /// Render as unified diff text.
    pub fn to_unified(&self, from_label: &str, to_label: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "--- {from_label}");
        let _ = writeln!(out, "+++ {to_label}");
        for hunk in &self.hunks {
            let _ = writeln!(out, "{}", hunk.header());
            for entry in &hunk.entries {
                let marker = match entry.kind {
                    DiffKind::Added => '+',
                    DiffKind::Removed => '-',
                    DiffKind::Context | DiffKind::Unchanged => ' ',
                };
                let _ = writeln!(out, "{marker}{}", entry.text);
            }
        }
        out
    }
}

/// Result of comparing two configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "diff", rename_all = "kebab-case")]
pub enum DiffOutcome {
    NoDifferences,
    Differences(Diff),
}

impl DiffOutcome {
    pub fn has_differences(&self) -> bool {
        matches!(self, DiffOutcome::Differences(_))
    }

    pub fn diff(&self) -> Option<&Diff> {
        match self {
            DiffOutcome::NoDifferences => None,
            DiffOutcome::Differences(diff) => Some(diff),
        }
    }
}

/// Windowing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    context: usize,
    full: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT,
            full: false,
        }
    }
}

impl DiffOptions {
    /// Keep `lines` unchanged lines around each change.
    pub fn context(lines: usize) -> Self {
        Self {
            context: lines,
            full: false,
        }
    }

    /// Emit every line; unchanged lines are reported as [`DiffKind::Unchanged`].
    pub fn full() -> Self {
        Self {
            context: 0,
            full: true,
        }
    }
}

/// Compare with the default context radius.
pub fn diff(reference: &ConfigText, candidate: &ConfigText) -> DiffOutcome {
    diff_with(reference, candidate, DiffOptions::default())
}

/// Compare `reference` (old) with `candidate` (new).
pub fn diff_with(reference: &ConfigText, candidate: &ConfigText, options: DiffOptions) -> DiffOutcome {
    let old: Vec<&str> = reference.lines().iter().map(String::as_str).collect();
    let new: Vec<&str> = candidate.lines().iter().map(String::as_str).collect();

    if old == new {
        return DiffOutcome::NoDifferences;
    }

    let ops = similar::capture_diff_slices(Algorithm::Myers, &old, &new);
    let groups = if options.full {
        vec![ops]
    } else {
        similar::group_diff_ops(ops, options.context)
    };

    let unchanged = if options.full {
        DiffKind::Unchanged
    } else {
        DiffKind::Context
    };

    let hunks = groups
        .iter()
        .filter_map(|group| hunk(group, &old, &new, unchanged))
        .collect();

    DiffOutcome::Differences(Diff {
        from: reference.source().clone(),
        to: candidate.source().clone(),
        hunks,
    })
}

fn hunk(group: &[DiffOp], old: &[&str], new: &[&str], unchanged: DiffKind) -> Option<Hunk> {
    let first = group.first()?;
    let last = group.last()?;
    let old_range = first.old_range().start..last.old_range().end;
    let new_range = first.new_range().start..last.new_range().end;

    let entries = group
        .iter()
        .flat_map(|op| op.iter_changes(old, new))
        .map(|change| DiffEntry {
            kind: match change.tag() {
                ChangeTag::Insert => DiffKind::Added,
                ChangeTag::Delete => DiffKind::Removed,
                ChangeTag::Equal => unchanged,
            },
            text: change.value().to_string(),
            old_line: change.old_index().map(|i| i + 1),
            new_line: change.new_index().map(|i| i + 1),
        })
        .collect();

    Some(Hunk {
        old_start: old_range.start + 1,
        old_len: old_range.len(),
        new_start: new_range.start + 1,
        new_len: new_range.len(),
        entries,
    })
}
