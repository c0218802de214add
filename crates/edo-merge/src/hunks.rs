//! Structured two-sided diff against a common base.
//!
//! Both sides are diffed against the base independently. Regions of change
//! that overlap or touch in base coordinates are grouped into one hunk.
//! A hunk touched by a single side, or by both sides with identical
//! results, is plain. Otherwise the two versions of the base range are
//! diffed against each other: shared lines stay plain context and the
//! divergent runs become conflict entries.

use std::ops::Range;

use similar::{capture_diff_slices, Algorithm, DiffOp, DiffTag};

/// Role of a line inside a hunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineTag {
    Context,
    Added,
    Removed,
    /// Pseudo-line marking that a side's input ends inside this hunk.
    EndOfInput,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HunkLine {
    pub tag: LineTag,
    pub text: String,
}

impl HunkLine {
    fn new(tag: LineTag, text: &str) -> Self {
        Self {
            tag,
            text: text.to_string(),
        }
    }

    fn end() -> Self {
        Self::new(LineTag::EndOfInput, "")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HunkEntry {
    Plain(HunkLine),
    Conflict {
        mine: Vec<HunkLine>,
        theirs: Vec<HunkLine>,
    },
}

/// One group of changes, anchored on a base range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    /// First base line covered, 1-based.
    pub base_start: usize,
    /// Number of base lines covered; zero for a pure insertion.
    pub base_len: usize,
    pub entries: Vec<HunkEntry>,
}

impl Hunk {
    /// Base line indices covered by this hunk, 0-based.
    pub fn base_range(&self) -> Range<usize> {
        let start = self.base_start.saturating_sub(1);
        start..start + self.base_len
    }

    pub fn is_conflict(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry, HunkEntry::Conflict { .. }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Mine,
    Theirs,
}

/// Base lines one side changed.
#[derive(Clone, Debug)]
struct Region {
    owner: Side,
    base: Range<usize>,
}

/// Changed regions of one side's ops, adjacent ops coalesced.
fn regions(ops: &[DiffOp], owner: Side) -> Vec<Region> {
    let mut out: Vec<Region> = Vec::new();
    for op in ops {
        let (tag, old, _) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }
        if let Some(last) = out.last_mut() {
            if last.base.end >= old.start {
                last.base.end = last.base.end.max(old.end);
                continue;
            }
        }
        out.push(Region { owner, base: old });
    }
    out
}

/// One side's text for `base[range]`, replayed from that side's own ops.
///
/// Equal runs are clipped to `range`; changes are taken whole when their
/// base span lies inside it.
fn side_version<'a>(
    base: &[&'a str],
    lines: &[&'a str],
    ops: &[DiffOp],
    range: &Range<usize>,
) -> Vec<&'a str> {
    let mut out = Vec::new();
    for op in ops {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            let start = old.start.max(range.start);
            let end = old.end.min(range.end);
            if start < end {
                out.extend_from_slice(&base[start..end]);
            }
        } else if old.start >= range.start && old.end <= range.end {
            out.extend_from_slice(&lines[new]);
        }
    }
    out
}

fn tagged(tag: LineTag, lines: &[&str]) -> Vec<HunkLine> {
    lines.iter().map(|line| HunkLine::new(tag, line)).collect()
}

fn plain(tag: LineTag, lines: &[&str]) -> impl Iterator<Item = HunkEntry> {
    tagged(tag, lines).into_iter().map(HunkEntry::Plain)
}

/// Runs of the diff between the two versions of a conflicting range.
/// Consecutive changes are joined so each run is either shared or not.
fn runs(mine: &[&str], theirs: &[&str]) -> Vec<(bool, Range<usize>, Range<usize>)> {
    let mut out: Vec<(bool, Range<usize>, Range<usize>)> = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, mine, theirs) {
        let (tag, m, t) = op.as_tag_tuple();
        let shared = tag == DiffTag::Equal;
        if let Some((last_shared, last_m, last_t)) = out.last_mut() {
            if !shared && !*last_shared {
                last_m.end = m.end;
                last_t.end = t.end;
                continue;
            }
        }
        out.push((shared, m, t));
    }
    out
}

/// Entries for a range both sides changed differently.
///
/// Lines the two versions share become context between conflict entries.
/// When the range reaches the end of base, the final divergent run marks
/// where each side's input ends: the shorter side's conflict entry carries
/// the end-of-input marker and the longer side's remaining lines follow as
/// plain additions closed by their own marker.
fn conflict_entries(
    base_lines: &[&str],
    mine: &[&str],
    theirs: &[&str],
    at_end: bool,
) -> Vec<HunkEntry> {
    let mut entries: Vec<HunkEntry> = plain(LineTag::Removed, base_lines).collect();
    let parts = runs(mine, theirs);
    let last = parts.len().saturating_sub(1);
    for (i, (shared, m, t)) in parts.into_iter().enumerate() {
        let (m, t) = (&mine[m], &theirs[t]);
        if shared {
            entries.extend(plain(LineTag::Context, m));
            continue;
        }
        if !(at_end && i == last) {
            entries.push(HunkEntry::Conflict {
                mine: tagged(LineTag::Added, m),
                theirs: tagged(LineTag::Added, t),
            });
            continue;
        }

        let common = m.len().min(t.len());
        let mut mine_lines = tagged(LineTag::Added, &m[..common]);
        let mut theirs_lines = tagged(LineTag::Added, &t[..common]);
        let rest = if m.len() > common { &m[common..] } else { &t[common..] };
        if m.len() <= common {
            mine_lines.push(HunkLine::end());
        }
        if t.len() <= common {
            theirs_lines.push(HunkLine::end());
        }
        entries.push(HunkEntry::Conflict {
            mine: mine_lines,
            theirs: theirs_lines,
        });
        if !rest.is_empty() {
            entries.extend(plain(LineTag::Added, rest));
            entries.push(HunkEntry::Plain(HunkLine::end()));
        }
    }
    entries
}

/// Compute the hunks that turn `base` into a merge of `mine` and `theirs`.
///
/// Lines outside every hunk are unchanged on both sides.
pub fn structured_merge(base: &[&str], mine: &[&str], theirs: &[&str]) -> Vec<Hunk> {
    let mine_ops = capture_diff_slices(Algorithm::Myers, base, mine);
    let theirs_ops = capture_diff_slices(Algorithm::Myers, base, theirs);
    let mut all = regions(&mine_ops, Side::Mine);
    all.extend(regions(&theirs_ops, Side::Theirs));
    all.sort_by_key(|r| (r.base.start, r.base.end));

    let mut hunks = Vec::new();
    let mut iter = all.into_iter().peekable();
    while let Some(first) = iter.next() {
        let mut range = first.base.clone();
        let mut mine_touched = first.owner == Side::Mine;
        let mut theirs_touched = first.owner == Side::Theirs;
        while let Some(next) = iter.next_if(|r| r.base.start <= range.end) {
            range.end = range.end.max(next.base.end);
            mine_touched |= next.owner == Side::Mine;
            theirs_touched |= next.owner == Side::Theirs;
        }

        let base_lines = &base[range.clone()];
        let mine_version = side_version(base, mine, &mine_ops, &range);
        let theirs_version = side_version(base, theirs, &theirs_ops, &range);

        let entries = if mine_touched && theirs_touched && mine_version != theirs_version {
            let at_end = range.end == base.len();
            conflict_entries(base_lines, &mine_version, &theirs_version, at_end)
        } else {
            // Both sides agree, or only one side touched the range.
            let merged = if mine_touched {
                &mine_version
            } else {
                &theirs_version
            };
            plain(LineTag::Removed, base_lines)
                .chain(plain(LineTag::Added, merged))
                .collect()
        };

        hunks.push(Hunk {
            base_start: range.start + 1,
            base_len: range.len(),
            entries,
        });
    }
    hunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_have_no_hunks() {
        let base = ["A", "B", "C"];
        assert!(structured_merge(&base, &base, &base).is_empty());
    }

    #[test]
    fn one_sided_change_is_plain() {
        let hunks = structured_merge(&["A", "B", "C"], &["A", "X", "C"], &["A", "B", "C"]);
        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!((hunk.base_start, hunk.base_len), (2, 1));
        assert!(!hunk.is_conflict());
        assert_eq!(
            hunk.entries,
            vec![
                HunkEntry::Plain(HunkLine::new(LineTag::Removed, "B")),
                HunkEntry::Plain(HunkLine::new(LineTag::Added, "X")),
            ]
        );
    }

    #[test]
    fn same_change_on_both_sides_is_plain() {
        let hunks = structured_merge(&["A", "B", "C"], &["A", "X", "C"], &["A", "X", "C"]);
        assert_eq!(hunks.len(), 1);
        assert!(!hunks[0].is_conflict());
    }

    fn conflicts(hunk: &Hunk) -> Vec<(&[HunkLine], &[HunkLine])> {
        hunk.entries
            .iter()
            .filter_map(|entry| match entry {
                HunkEntry::Conflict { mine, theirs } => Some((&mine[..], &theirs[..])),
                HunkEntry::Plain(_) => None,
            })
            .collect()
    }

    fn plain(tag: LineTag, text: &str) -> HunkEntry {
        HunkEntry::Plain(HunkLine::new(tag, text))
    }

    #[test]
    fn divergent_change_is_a_conflict() {
        let hunks = structured_merge(&["A", "B", "C"], &["A", "X", "C"], &["A", "Y", "C"]);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].entries[0], plain(LineTag::Removed, "B"));
        match &conflicts(&hunks[0])[..] {
            [(mine, theirs)] => {
                assert_eq!(*mine, [HunkLine::new(LineTag::Added, "X")]);
                assert_eq!(*theirs, [HunkLine::new(LineTag::Added, "Y")]);
            }
            other => panic!("expected one conflict entry, got {other:?}"),
        }
    }

    #[test]
    fn separate_regions_stay_separate() {
        let base = ["1", "2", "3", "4", "5"];
        let mine = ["1", "M", "3", "4", "5"];
        let theirs = ["1", "2", "3", "4", "T"];
        let hunks = structured_merge(&base, &mine, &theirs);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].base_range(), 1..2);
        assert_eq!(hunks[1].base_range(), 4..5);
    }

    #[test]
    fn shared_lines_split_a_conflicting_range() {
        // Both sides rewrite B..D; they agree on L in the middle.
        let base = ["A", "B", "C", "D", "E"];
        let mine = ["A", "K", "L", "M", "E"];
        let theirs = ["A", "P", "L", "Q", "E"];
        let hunks = structured_merge(&base, &mine, &theirs);
        assert_eq!(hunks.len(), 1);
        let entries = &hunks[0].entries;
        assert_eq!(conflicts(&hunks[0]).len(), 2);
        let context = entries
            .iter()
            .position(|e| *e == plain(LineTag::Context, "L"))
            .expect("shared line kept as context");
        assert!(matches!(entries[context - 1], HunkEntry::Conflict { .. }));
        assert!(matches!(entries[context + 1], HunkEntry::Conflict { .. }));
    }

    #[test]
    fn conflict_at_end_of_input_is_marked() {
        let hunks = structured_merge(&["A", "B"], &["A", "X"], &["A", "Y", "Z"]);
        assert_eq!(hunks.len(), 1);
        match &conflicts(&hunks[0])[..] {
            [(mine, theirs)] => {
                assert_eq!(mine.last().map(|l| l.tag), Some(LineTag::EndOfInput));
                assert!(!theirs.iter().any(|l| l.tag == LineTag::EndOfInput));
            }
            other => panic!("expected one conflict entry, got {other:?}"),
        }
        // The longer side continues as plain lines until its own end.
        let tail = &hunks[0].entries[hunks[0].entries.len() - 2..];
        assert_eq!(
            tail,
            [plain(LineTag::Added, "Z"), HunkEntry::Plain(HunkLine::end())]
        );
    }

    #[test]
    fn one_side_emptied_while_the_other_rewrites() {
        let base = ["D", "B", "B", "A"];
        let mine = ["A", "C", "A", "A"];
        let hunks = structured_merge(&base, &mine, &[]);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].base_range(), 0..4);

        let mut expected: Vec<HunkEntry> =
            base.iter().map(|l| plain(LineTag::Removed, l)).collect();
        expected.push(HunkEntry::Conflict {
            mine: vec![],
            theirs: vec![HunkLine::end()],
        });
        expected.extend(mine.iter().map(|l| plain(LineTag::Added, l)));
        expected.push(HunkEntry::Plain(HunkLine::end()));
        assert_eq!(hunks[0].entries, expected);
    }

    #[test]
    fn insertions_at_the_same_point_conflict() {
        let hunks = structured_merge(&["A", "B"], &["A", "X", "B"], &["A", "Y", "B"]);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].base_len, 0);
        assert!(hunks[0].is_conflict());
    }
}
