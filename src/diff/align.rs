//! Dual-pane alignment
//!
//! Converts the flat `DiffLine` sequence into two equal-length row
//! sequences. Deletion runs are held open until the run of additions that
//! replaces them has been seen, then both are flushed together so related
//! changes land on the same visual rows.

use super::parser::{DiffLine, LineKind};

/// Kind of a rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Context,
    Addition,
    Deletion,
    Empty,
}

/// One row in one pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub kind: RowKind,
    pub line_number: Option<usize>,
    pub text: String,
}

impl DisplayRow {
    pub fn empty() -> Self {
        Self {
            kind: RowKind::Empty,
            line_number: None,
            text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == RowKind::Empty
    }

    fn left_of(line: &DiffLine) -> Self {
        let kind = match line.kind {
            LineKind::Deletion => RowKind::Deletion,
            _ => RowKind::Context,
        };
        Self {
            kind,
            line_number: line.left_num,
            text: line.text.clone(),
        }
    }

    fn right_of(line: &DiffLine) -> Self {
        let kind = match line.kind {
            LineKind::Addition => RowKind::Addition,
            _ => RowKind::Context,
        };
        Self {
            kind,
            line_number: line.right_num,
            text: line.text.clone(),
        }
    }
}

/// Left and right panes; always the same length
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneRows {
    pub left: Vec<DisplayRow>,
    pub right: Vec<DisplayRow>,
}

impl PaneRows {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Rows presented on the same visual line
    pub fn pairs(&self) -> impl Iterator<Item = (&DisplayRow, &DisplayRow)> {
        self.left.iter().zip(self.right.iter())
    }

    pub fn get(&self, idx: usize) -> Option<(&DisplayRow, &DisplayRow)> {
        Some((self.left.get(idx)?, self.right.get(idx)?))
    }

    fn push(&mut self, left: DisplayRow, right: DisplayRow) {
        self.left.push(left);
        self.right.push(right);
    }
}

/// How a buffered run is turned into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Two or more deletions replaced by exactly one addition
    ReplaceCompaction,
    /// Pad the shorter side with empty rows
    Default,
}

impl FlushPolicy {
    pub fn select(left: &[DisplayRow], right: &[DisplayRow]) -> Self {
        let all_deletions = left.iter().all(|r| r.kind == RowKind::Deletion);
        if left.len() > 1 && all_deletions && right.len() == 1 && right[0].kind == RowKind::Addition {
            Self::ReplaceCompaction
        } else {
            Self::Default
        }
    }
}

/// Buffering state machine behind `align_for_display`
#[derive(Debug, Default)]
pub struct Aligner {
    out: PaneRows,
    left: Vec<DisplayRow>,
    right: Vec<DisplayRow>,
    hunk: Option<usize>,
}

impl Aligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: &DiffLine) {
        if line.breaks_run || self.hunk.is_some_and(|h| h != line.hunk) {
            self.flush();
        }
        self.hunk = Some(line.hunk);

        match line.kind {
            LineKind::Context => {
                self.flush();
                self.out.push(DisplayRow::left_of(line), DisplayRow::right_of(line));
            }
            LineKind::Deletion => {
                // Additions already collected close the previous replace
                if !self.right.is_empty() {
                    self.flush();
                }
                self.left.push(DisplayRow::left_of(line));
            }
            LineKind::Addition => {
                self.right.push(DisplayRow::right_of(line));
                // A bare addition is its own row; one that follows deletions
                // stays open to collect the rest of the replacing run
                if self.left.is_empty() {
                    self.flush();
                }
            }
        }
    }

    pub fn flush(&mut self) {
        if self.left.is_empty() && self.right.is_empty() {
            return;
        }

        let left = std::mem::take(&mut self.left);
        let right = std::mem::take(&mut self.right);

        match FlushPolicy::select(&left, &right) {
            FlushPolicy::ReplaceCompaction => {
                let mut replacement = right.into_iter();
                for deletion in left {
                    let other = replacement.next().unwrap_or_else(DisplayRow::empty);
                    self.out.push(deletion, other);
                }
            }
            FlushPolicy::Default => {
                let n = left.len().max(right.len());
                let mut left = left.into_iter();
                let mut right = right.into_iter();
                for _ in 0..n {
                    let l = left.next().unwrap_or_else(DisplayRow::empty);
                    let r = right.next().unwrap_or_else(DisplayRow::empty);
                    self.out.push(l, r);
                }
            }
        }
    }

    pub fn finish(mut self) -> PaneRows {
        self.flush();
        self.out
    }
}

/// Align parsed diff lines into left and right panes of equal length
pub fn align_for_display(lines: &[DiffLine]) -> PaneRows {
    let mut aligner = Aligner::new();
    for line in lines {
        aligner.push(line);
    }
    aligner.finish()
}

/// Show two whole files side by side without diffing them
pub fn align_raw(left_content: &str, right_content: &str) -> PaneRows {
    let left: Vec<&str> = left_content.lines().collect();
    let right: Vec<&str> = right_content.lines().collect();
    let n = left.len().max(right.len());

    let row = |lines: &[&str], i: usize| match lines.get(i) {
        Some(text) => DisplayRow {
            kind: RowKind::Context,
            line_number: Some(i + 1),
            text: text.to_string(),
        },
        None => DisplayRow::empty(),
    };

    let mut out = PaneRows::default();
    for i in 0..n {
        out.push(row(&left, i), row(&right, i));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parser::{parse_diff, Parser};

    fn texts(rows: &[DisplayRow]) -> Vec<&str> {
        rows.iter().map(|r| r.text.as_str()).collect()
    }

    fn kinds(rows: &[DisplayRow]) -> Vec<RowKind> {
        rows.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn default_policy_pads_shorter_side() {
        let lines = parse_diff("@@ -5,2 +5,3 @@\n ctxA\n-old1\n+new1\n+new2");
        let rows = align_for_display(&lines);
        assert_eq!(texts(&rows.left), vec!["ctxA", "old1", ""]);
        assert_eq!(texts(&rows.right), vec!["ctxA", "new1", "new2"]);
        assert_eq!(
            kinds(&rows.left),
            vec![RowKind::Context, RowKind::Deletion, RowKind::Empty]
        );
        assert_eq!(rows.right[2].line_number, Some(7));
    }

    #[test]
    fn replace_compaction_aligns_addition_with_first_deletion() {
        let lines = parse_diff("@@ -1,3 +1,1 @@\n-del1\n-del2\n-del3\n+add1\n");
        let rows = align_for_display(&lines);
        assert_eq!(texts(&rows.left), vec!["del1", "del2", "del3"]);
        assert_eq!(texts(&rows.right), vec!["add1", "", ""]);
        assert_eq!(
            kinds(&rows.right),
            vec![RowKind::Addition, RowKind::Empty, RowKind::Empty]
        );
    }

    #[test]
    fn policy_selection_boundaries() {
        let del = |n| DisplayRow::left_of(&DiffLine::deletion(n, "d", 0));
        let add = |n| DisplayRow::right_of(&DiffLine::addition(n, "a", 0));

        assert_eq!(
            FlushPolicy::select(&[del(1), del(2)], &[add(1)]),
            FlushPolicy::ReplaceCompaction
        );
        // 1:1 replace
        assert_eq!(FlushPolicy::select(&[del(1)], &[add(1)]), FlushPolicy::Default);
        // N:M with M > 1
        assert_eq!(
            FlushPolicy::select(&[del(1), del(2)], &[add(1), add(2)]),
            FlushPolicy::Default
        );
        // pure delete run
        assert_eq!(FlushPolicy::select(&[del(1), del(2)], &[]), FlushPolicy::Default);
    }

    #[test]
    fn bare_additions_each_become_a_row() {
        let lines = parse_diff("@@ -1,1 +1,3 @@\n a\n+b\n+c\n");
        let rows = align_for_display(&lines);
        assert_eq!(rows.len(), 3);
        assert_eq!(kinds(&rows.left), vec![RowKind::Context, RowKind::Empty, RowKind::Empty]);
        assert_eq!(texts(&rows.right), vec!["a", "b", "c"]);
    }

    #[test]
    fn pure_deletion_run_is_padded_on_the_right() {
        let lines = parse_diff("@@ -1,3 +1,1 @@\n a\n-b\n-c\n");
        let rows = align_for_display(&lines);
        assert_eq!(texts(&rows.left), vec!["a", "b", "c"]);
        assert_eq!(kinds(&rows.right), vec![RowKind::Context, RowKind::Empty, RowKind::Empty]);
    }

    #[test]
    fn consecutive_replacements_are_flushed_independently() {
        let lines = parse_diff("@@ -1,4 +1,2 @@\n-a\n-b\n+X\n-c\n-d\n+Y\n");
        let rows = align_for_display(&lines);
        assert_eq!(texts(&rows.left), vec!["a", "b", "c", "d"]);
        assert_eq!(texts(&rows.right), vec!["X", "", "Y", ""]);
    }

    #[test]
    fn runs_do_not_span_hunks() {
        let diff = "@@ -1,2 +1,1 @@\n x\n-a\n@@ -10,1 +9,2 @@\n+b\n y\n";
        let lines = Parser::new().suppress_filename_hunk(false).parse(diff);
        let rows = align_for_display(&lines);
        // "-a" and "+b" would share a row if the run crossed the hunk boundary
        assert_eq!(texts(&rows.left), vec!["x", "a", "", "y"]);
        assert_eq!(texts(&rows.right), vec!["x", "", "b", "y"]);
    }

    #[test]
    fn no_newline_marker_ends_deletion_run() {
        let diff = "@@ -1,2 +1,2 @@\n x\n-a\n\\ No newline at end of file\n+b\n";
        let rows = align_for_display(&parse_diff(diff));
        assert_eq!(texts(&rows.left), vec!["x", "a", ""]);
        assert_eq!(texts(&rows.right), vec!["x", "", "b"]);
    }

    #[test]
    fn marker_between_deletions_splits_compaction() {
        let diff = "@@ -1,3 +1,1 @@\n-a\n\\ No newline at end of file\n-b\n-c\n+X\n";
        let rows = align_for_display(&parse_diff(diff));
        assert_eq!(texts(&rows.left), vec!["a", "b", "c"]);
        assert_eq!(texts(&rows.right), vec!["", "X", ""]);
    }

    #[test]
    fn whitespace_only_input_yields_no_rows() {
        assert!(align_for_display(&parse_diff("   \n \n")).is_empty());
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let rows = align_for_display(&parse_diff(""));
        assert!(rows.is_empty());
        assert!(rows.right.is_empty());
        let rows = align_for_display(&parse_diff("--- a\n+++ b\n"));
        assert!(rows.is_empty());
    }

    #[test]
    fn panes_have_equal_length_and_preserve_text_order() {
        let diff = "@@ -1,9 +1,8 @@\n a\n-b\n-c\n+C\n d\n+e\n+f\n-g\n h\n-i\n-j\n-k\n+K1\n+K2\n l\n";
        let lines = parse_diff(diff);
        let rows = align_for_display(&lines);
        assert_eq!(rows.left.len(), rows.right.len());

        let left_expected: Vec<&str> = lines
            .iter()
            .filter(|l| l.kind != LineKind::Addition)
            .map(|l| l.text.as_str())
            .collect();
        let right_expected: Vec<&str> = lines
            .iter()
            .filter(|l| l.kind != LineKind::Deletion)
            .map(|l| l.text.as_str())
            .collect();
        let left_actual: Vec<&str> = rows.left.iter().filter(|r| !r.is_empty()).map(|r| r.text.as_str()).collect();
        let right_actual: Vec<&str> = rows.right.iter().filter(|r| !r.is_empty()).map(|r| r.text.as_str()).collect();
        assert_eq!(left_actual, left_expected);
        assert_eq!(right_actual, right_expected);
    }

    #[test]
    fn non_first_single_replace_hunk_uses_default_policy() {
        let diff = "@@ -1,1 +1,1 @@\n a\n@@ -5,1 +5,1 @@\n-old\n+new\n";
        let rows = align_for_display(&parse_diff(diff));
        assert_eq!(texts(&rows.left), vec!["a", "old"]);
        assert_eq!(texts(&rows.right), vec!["a", "new"]);
    }

    #[test]
    fn raw_alignment_numbers_both_files() {
        let rows = align_raw("one\ntwo\nthree\n", "uno\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.left[2].line_number, Some(3));
        assert!(rows.right[1].is_empty());
        assert_eq!(rows.right[0].text, "uno");
    }
}
