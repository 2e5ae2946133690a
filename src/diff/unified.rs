//! Single-pane (unified) view and change navigation

use super::align::{PaneRows, RowKind};
use super::parser::DiffLine;

/// Row in the unified view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifiedRow {
    /// Separator placed before every hunk after the first
    HunkBreak(usize),
    Line(DiffLine),
}

pub fn unified_rows(lines: &[DiffLine]) -> Vec<UnifiedRow> {
    let mut rows = Vec::with_capacity(lines.len());
    let mut hunk = None;
    for line in lines {
        if hunk.is_some() && hunk != Some(line.hunk) {
            rows.push(UnifiedRow::HunkBreak(line.hunk));
        }
        hunk = Some(line.hunk);
        rows.push(UnifiedRow::Line(line.clone()));
    }
    rows
}

fn is_change_row(rows: &PaneRows, idx: usize) -> bool {
    rows.get(idx)
        .map(|(l, r)| l.kind != RowKind::Context || r.kind != RowKind::Context)
        .unwrap_or(false)
}

/// Start of the next change run strictly after `from`
pub fn next_change(rows: &PaneRows, from: usize) -> Option<usize> {
    let mut idx = from;
    // Leave the run the cursor is in
    while idx < rows.len() && is_change_row(rows, idx) {
        idx += 1;
    }
    (idx..rows.len()).find(|&i| is_change_row(rows, i))
}

/// Start of the change run before the one containing `from`
pub fn prev_change(rows: &PaneRows, from: usize) -> Option<usize> {
    let run_start = |mut i: usize| {
        while i > 0 && is_change_row(rows, i - 1) {
            i -= 1;
        }
        i
    };

    let mut idx = from.min(rows.len());
    if idx < rows.len() && is_change_row(rows, idx) {
        idx = run_start(idx);
    }
    let end = (0..idx).rev().find(|&i| is_change_row(rows, i))?;
    Some(run_start(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{align_for_display, parse_diff, Parser};

    #[test]
    fn unified_rows_insert_breaks_between_hunks() {
        let diff = "@@ -1,1 +1,1 @@\n a\n@@ -9,2 +9,1 @@\n b\n-c\n";
        let lines = Parser::new().suppress_filename_hunk(false).parse(diff);
        let rows = unified_rows(&lines);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], UnifiedRow::HunkBreak(1));
        assert!(matches!(&rows[3], UnifiedRow::Line(l) if l.text == "c"));
    }

    #[test]
    fn unified_rows_empty() {
        assert!(unified_rows(&[]).is_empty());
    }

    #[test]
    fn change_navigation_walks_runs() {
        // rows: a | -b +B | c | d | +e | f
        let rows = align_for_display(&parse_diff("@@ -1,5 +1,6 @@\n a\n-b\n+B\n c\n d\n+e\n f\n"));
        assert_eq!(rows.len(), 6);
        assert_eq!(next_change(&rows, 0), Some(1));
        assert_eq!(next_change(&rows, 1), Some(4));
        assert_eq!(next_change(&rows, 4), None);
        assert_eq!(prev_change(&rows, 5), Some(4));
        assert_eq!(prev_change(&rows, 4), Some(1));
        assert_eq!(prev_change(&rows, 1), None);
    }
}
