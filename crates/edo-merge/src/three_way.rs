//! Line-level three-way merge with conflict marker blocks.

use std::borrow::Cow;

use edo_types::text::{trim_line_end, trim_lines};
use tracing::debug;

use crate::hunks::{structured_merge, HunkEntry, HunkLine, LineTag};
use crate::status::MergeStatus;

const MARKER_START: &str = "<<<<<<<";
const MARKER_SEP: &str = "=======";
const MARKER_END: &str = ">>>>>>>";

/// Caller-controlled merge behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOptions {
    /// Trim trailing spaces, tabs and carriage returns from every line of
    /// all three inputs before comparing.
    pub trim_trailing_whitespace: bool,
    /// Label after `<<<<<<<`.
    pub local_label: String,
    /// Label after `>>>>>>>`.
    pub remote_label: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            trim_trailing_whitespace: false,
            local_label: "LOCAL".into(),
            remote_label: "REMOTE".into(),
        }
    }
}

impl MergeOptions {
    pub fn trimmed(mut self, trim: bool) -> Self {
        self.trim_trailing_whitespace = trim;
        self
    }
}

/// Merged text and whether it needs manual resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedText {
    pub status: MergeStatus,
    pub text: String,
}

fn trim_all<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines.iter().map(|line| trim_line_end(line)).collect()
}

fn normalize<'a>(text: &'a str, opts: &MergeOptions) -> Cow<'a, str> {
    if opts.trim_trailing_whitespace {
        Cow::Owned(trim_lines(text))
    } else {
        Cow::Borrowed(text)
    }
}

/// Output under construction.
struct Emitter<'o> {
    opts: &'o MergeOptions,
    out: Vec<String>,
    conflicts: usize,
}

impl Emitter<'_> {
    fn line(&mut self, text: &str) {
        self.out.push(text.to_string());
    }

    /// Write a conflict block. Nothing is written when both sides are empty.
    fn block(&mut self, mine: &[String], theirs: &[String]) {
        if mine.is_empty() && theirs.is_empty() {
            return;
        }
        self.out
            .push(format!("{MARKER_START} {}", self.opts.local_label));
        self.out.extend_from_slice(mine);
        self.out.push(MARKER_SEP.to_string());
        self.out.extend_from_slice(theirs);
        self.out
            .push(format!("{MARKER_END} {}", self.opts.remote_label));
        self.conflicts += 1;
    }

    /// Flush an open conflict, moving the trailing lines both sides agree
    /// on below the block.
    fn block_with_common_tail(&mut self, mine: &mut Vec<String>, theirs: &mut Vec<String>) {
        let mut suffix = Vec::new();
        while let (Some(a), Some(b)) = (mine.last(), theirs.last()) {
            if a != b {
                break;
            }
            theirs.pop();
            suffix.extend(mine.pop());
        }
        self.block(mine, theirs);
        self.out.extend(suffix.into_iter().rev());
        mine.clear();
        theirs.clear();
    }
}

/// Append a conflict side's surviving lines to `buf`. Returns whether the
/// side's end-of-input marker was seen.
fn collect_side(lines: &[HunkLine], buf: &mut Vec<String>) -> bool {
    let mut ended = false;
    for line in lines {
        match line.tag {
            LineTag::Removed => {}
            LineTag::EndOfInput => ended = true,
            LineTag::Context | LineTag::Added => buf.push(line.text.clone()),
        }
    }
    ended
}

/// Merge three line sequences.
///
/// Regions changed by one side take that side's lines. Regions both sides
/// changed differently become `<<<<<<<`/`=======`/`>>>>>>>` blocks, with
/// leading and trailing lines the two sides share kept outside the block
/// where they can be told apart.
pub fn merge_lines(
    base: &[&str],
    mine: &[&str],
    theirs: &[&str],
    opts: &MergeOptions,
) -> (MergeStatus, Vec<String>) {
    if opts.trim_trailing_whitespace {
        let (base, mine, theirs) = (trim_all(base), trim_all(mine), trim_all(theirs));
        return merge_normalized(&base, &mine, &theirs, opts);
    }
    merge_normalized(base, mine, theirs, opts)
}

fn merge_normalized(
    base: &[&str],
    mine: &[&str],
    theirs: &[&str],
    opts: &MergeOptions,
) -> (MergeStatus, Vec<String>) {
    let mut emit = Emitter {
        opts,
        out: Vec::with_capacity(base.len().max(mine.len()).max(theirs.len())),
        conflicts: 0,
    };
    let mut cursor = 0;

    for hunk in structured_merge(base, mine, theirs) {
        let range = hunk.base_range();
        for line in &base[cursor.min(range.start)..range.start] {
            emit.line(line);
        }
        cursor = cursor.max(range.end);

        let mut open = false;
        let mut mine_buf: Vec<String> = Vec::new();
        let mut theirs_buf: Vec<String> = Vec::new();
        let mut mine_ended = false;
        let mut theirs_ended = false;

        for entry in &hunk.entries {
            match entry {
                HunkEntry::Plain(line) => {
                    if matches!(line.tag, LineTag::Removed | LineTag::EndOfInput) {
                        continue;
                    }
                    if open && !mine_ended && !theirs_ended {
                        emit.block(&mine_buf, &theirs_buf);
                        mine_buf.clear();
                        theirs_buf.clear();
                        open = false;
                    }
                    if mine_ended {
                        theirs_buf.push(line.text.clone());
                    } else if theirs_ended {
                        mine_buf.push(line.text.clone());
                    } else {
                        emit.line(&line.text);
                    }
                }
                HunkEntry::Conflict { mine, theirs } => {
                    open = true;
                    mine_ended |= collect_side(mine, &mut mine_buf);
                    theirs_ended |= collect_side(theirs, &mut theirs_buf);
                }
            }
        }

        if open {
            emit.block_with_common_tail(&mut mine_buf, &mut theirs_buf);
        }
    }

    for line in &base[cursor.min(base.len())..] {
        emit.line(line);
    }

    let status = if emit.conflicts > 0 {
        MergeStatus::Conflict
    } else {
        MergeStatus::Merged
    };
    debug!(%status, conflicts = emit.conflicts, lines = emit.out.len(), "merged lines");
    (status, emit.out)
}

/// Merge three buffers split on `\n`.
///
/// An unchanged local buffer short-circuits to the remote buffer verbatim.
pub fn merge_buffers(base: &str, local: &str, remote: &str, opts: &MergeOptions) -> MergedText {
    if normalize(local, opts) == normalize(base, opts) {
        return MergedText {
            status: MergeStatus::Merged,
            text: remote.to_string(),
        };
    }
    let base: Vec<&str> = base.split('\n').collect();
    let local: Vec<&str> = local.split('\n').collect();
    let remote: Vec<&str> = remote.split('\n').collect();
    let (status, lines) = merge_lines(&base, &local, &remote, opts);
    MergedText {
        status,
        text: lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn merge(base: &[&str], mine: &[&str], theirs: &[&str]) -> (MergeStatus, Vec<String>) {
        merge_lines(base, mine, theirs, &MergeOptions::default())
    }

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn conflict_shape() {
        let (status, out) = merge(&["A", "B", "C"], &["A", "X", "C"], &["A", "Y", "C"]);
        assert_eq!(status, MergeStatus::Conflict);
        assert_eq!(
            out,
            owned(&["A", "<<<<<<< LOCAL", "X", "=======", "Y", ">>>>>>> REMOTE", "C"])
        );
    }

    #[test]
    fn non_overlapping_changes_merge_cleanly() {
        let base = ["1", "2", "3", "4", "5"];
        let (status, out) = merge(&base, &["1", "M", "3", "4", "5"], &["1", "2", "3", "4", "T"]);
        assert_eq!(status, MergeStatus::Merged);
        assert_eq!(out, owned(&["1", "M", "3", "4", "T"]));
    }

    #[test]
    fn common_trailing_lines_leave_the_block() {
        let (status, out) = merge(&["A", "B"], &["A", "X", "Z"], &["A", "Y", "Z"]);
        assert_eq!(status, MergeStatus::Conflict);
        assert_eq!(
            out,
            owned(&["A", "<<<<<<< LOCAL", "X", "=======", "Y", ">>>>>>> REMOTE", "Z"])
        );
    }

    #[test]
    fn trailing_divergence_at_end_of_input() {
        let (status, out) = merge(&["A", "B"], &["A", "X"], &["A", "Y", "Z"]);
        assert_eq!(status, MergeStatus::Conflict);
        assert_eq!(
            out,
            owned(&["A", "<<<<<<< LOCAL", "X", "=======", "Y", "Z", ">>>>>>> REMOTE"])
        );
    }

    #[test]
    fn shared_line_inside_a_conflict_flushes_the_block() {
        let base = ["A", "B", "C", "D", "E"];
        let (status, out) = merge(&base, &["A", "K", "L", "M", "E"], &["A", "P", "L", "Q", "E"]);
        assert_eq!(status, MergeStatus::Conflict);
        assert_eq!(
            out,
            owned(&[
                "A",
                "<<<<<<< LOCAL",
                "K",
                "=======",
                "P",
                ">>>>>>> REMOTE",
                "L",
                "<<<<<<< LOCAL",
                "M",
                "=======",
                "Q",
                ">>>>>>> REMOTE",
                "E",
            ])
        );
    }

    #[test]
    fn side_emptied_at_end_keeps_the_other_in_the_block() {
        let (status, out) = merge(&["D", "B", "B", "A"], &["A", "C", "A", "A"], &[]);
        assert_eq!(status, MergeStatus::Conflict);
        assert_eq!(
            out,
            owned(&["<<<<<<< LOCAL", "A", "C", "A", "A", "=======", ">>>>>>> REMOTE"])
        );
    }

    #[test]
    fn rewritten_local_against_emptied_remote() {
        let merged = merge_buffers(
            "A\nD\nC\nA\nA\nD\nA",
            "D\nC\nD\nB\nD\nA\nA",
            "",
            &MergeOptions::default(),
        );
        assert_eq!(merged.status, MergeStatus::Conflict);
        assert!(merged.text.starts_with("<<<<<<< LOCAL\n"));
        assert!(merged.text.ends_with(">>>>>>> REMOTE"));
    }

    #[test]
    fn custom_labels() {
        let opts = MergeOptions {
            local_label: "MINE".into(),
            remote_label: "DEV-1-SYS-SUB".into(),
            ..MergeOptions::default()
        };
        let (_, out) = merge_lines(&["A"], &["B"], &["C"], &opts);
        assert_eq!(out[0], "<<<<<<< MINE");
        assert_eq!(out[out.len() - 1], ">>>>>>> DEV-1-SYS-SUB");
    }

    #[test]
    fn whitespace_only_differences_vanish_when_trimming() {
        let opts = MergeOptions::default().trimmed(true);
        let (status, out) = merge_lines(&["A", "B"], &["A  ", "B"], &["A", "B\t"], &opts);
        assert_eq!(status, MergeStatus::Merged);
        assert_eq!(out, owned(&["A", "B"]));

        let (status, _) = merge(&["A", "B"], &["A  ", "B"], &["A\t", "B"]);
        assert_eq!(status, MergeStatus::Conflict);
    }

    #[test]
    fn carriage_returns_are_trailing_whitespace() {
        let opts = MergeOptions::default().trimmed(true);
        let merged = merge_buffers("A\r\nB", "A \r\nX", "A\r\nY", &opts);
        assert_eq!(merged.status, MergeStatus::Conflict);
        assert_eq!(
            merged.text,
            "A\n<<<<<<< LOCAL\nX\n=======\nY\n>>>>>>> REMOTE"
        );
    }

    #[test]
    fn buffers_shortcut_returns_remote_verbatim() {
        let merged = merge_buffers("A\nB\n", "A\nB\n", "A\nC  \n", &MergeOptions::default());
        assert_eq!(merged.status, MergeStatus::Merged);
        assert_eq!(merged.text, "A\nC  \n");

        let opts = MergeOptions::default().trimmed(true);
        let merged = merge_buffers("A\nB\n", "A \nB\n", "A\nC  \n", &opts);
        assert_eq!(merged.text, "A\nC  \n");
    }

    #[test]
    fn buffers_keep_final_newline() {
        let merged = merge_buffers(
            "A\nB\nC\n",
            "A2\nB\nC\n",
            "A\nB\nC2\n",
            &MergeOptions::default(),
        );
        assert_eq!(merged.status, MergeStatus::Merged);
        assert_eq!(merged.text, "A2\nB\nC2\n");
    }

    #[test]
    fn buffers_with_conflict() {
        let merged = merge_buffers("A\nB\nC", "A\nX\nC", "A\nY\nC", &MergeOptions::default());
        assert_eq!(merged.status, MergeStatus::Conflict);
        assert_eq!(
            merged.text,
            "A\n<<<<<<< LOCAL\nX\n=======\nY\n>>>>>>> REMOTE\nC"
        );
    }

    fn as_strs(lines: &[String]) -> Vec<&str> {
        lines.iter().map(String::as_str).collect()
    }

    fn lines() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::sample::select(vec!["A", "B", "C", "D", "E"]), 0..12)
            .prop_map(|v| v.into_iter().map(String::from).collect())
    }

    proptest! {
        #[test]
        fn same_change_on_both_sides(base in lines(), x in lines()) {
            let (status, out) = merge(&as_strs(&base), &as_strs(&x), &as_strs(&x));
            prop_assert_eq!(status, MergeStatus::Merged);
            prop_assert_eq!(out, x);
        }

        #[test]
        fn only_mine_changed(base in lines(), mine in lines()) {
            let (status, out) = merge(&as_strs(&base), &as_strs(&mine), &as_strs(&base));
            prop_assert_eq!(status, MergeStatus::Merged);
            prop_assert_eq!(out, mine);
        }

        #[test]
        fn only_theirs_changed(base in lines(), theirs in lines()) {
            let (status, out) = merge(&as_strs(&base), &as_strs(&base), &as_strs(&theirs));
            prop_assert_eq!(status, MergeStatus::Merged);
            prop_assert_eq!(out, theirs);
        }

        #[test]
        fn independent_inputs_merge_to_known_lines(
            base in lines(),
            mine in lines(),
            theirs in lines(),
        ) {
            let (status, out) = merge(&as_strs(&base), &as_strs(&mine), &as_strs(&theirs));
            let is_marker = |line: &String| {
                line == "<<<<<<< LOCAL" || line == MARKER_SEP || line == ">>>>>>> REMOTE"
            };
            let markers = out.iter().filter(|line| is_marker(*line)).count();
            match status {
                MergeStatus::Merged => prop_assert_eq!(markers, 0),
                _ => {
                    prop_assert_eq!(status, MergeStatus::Conflict);
                    prop_assert!(markers >= 3 && markers % 3 == 0);
                }
            }
            for line in out.iter().filter(|line| !is_marker(*line)) {
                prop_assert!(
                    base.contains(line) || mine.contains(line) || theirs.contains(line),
                    "{line:?} came from no input"
                );
            }
        }
    }
}
