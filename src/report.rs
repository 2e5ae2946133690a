//! Non-interactive output: side-by-side text and JSON

use serde_json::{json, Value};
use std::fmt::Write;

use crate::batch::{BatchReport, Filter, PairView};
use crate::diff::{DisplayRow, RowKind};
use crate::text::{expand_tabs, truncate_or_pad};

const NUM_WIDTH: usize = 4;
const SEPARATOR: &str = " \u{2502} ";

fn marker(kind: RowKind) -> char {
    match kind {
        RowKind::Addition => '+',
        RowKind::Deletion => '-',
        RowKind::Context | RowKind::Empty => ' ',
    }
}

fn render_cell(row: &DisplayRow, content_width: usize) -> String {
    let num = row
        .line_number
        .map(|n| format!("{:>width$}", n, width = NUM_WIDTH))
        .unwrap_or_else(|| " ".repeat(NUM_WIDTH));
    format!(
        "{} {}{}",
        num,
        marker(row.kind),
        truncate_or_pad(&expand_tabs(&row.text), content_width)
    )
}

fn render_pair(out: &mut String, pair: &PairView, width: usize) {
    let rule = "\u{2500}".repeat(width);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "[{}] {} \u{2194} {}",
        pair.index() + 1,
        pair.result.file1,
        pair.result.file2
    );

    if pair.result.identical {
        let _ = writeln!(out, "Files are identical");
        return;
    }
    if pair.result.binary {
        let _ = writeln!(out, "Binary files differ");
        return;
    }

    let _ = writeln!(
        out,
        "+{} -{} ~{}",
        pair.stats.additions,
        pair.stats.deletions,
        pair.stats.changes()
    );
    let _ = writeln!(out, "{}", rule);

    // num + space + marker on each side
    let pane_width = width.saturating_sub(SEPARATOR.chars().count()) / 2;
    let content_width = pane_width.saturating_sub(NUM_WIDTH + 2);
    for (left, right) in pair.rows.pairs() {
        let line = format!(
            "{}{}{}",
            render_cell(left, content_width),
            SEPARATOR,
            render_cell(right, content_width)
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }
}

/// Side-by-side report of every pair matching `filter`
pub fn render_text(report: &BatchReport, width: usize, filter: Filter) -> String {
    let mut out = String::new();

    for pair in report.filtered(filter) {
        render_pair(&mut out, pair, width);
        out.push('\n');
    }

    if report.has_errors() {
        let _ = writeln!(out, "Errors:");
        for err in &report.errors {
            let _ = writeln!(
                out,
                "  [{}] {} \u{2194} {}: {}",
                err.index + 1,
                err.file1,
                err.file2,
                err.error
            );
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} files, {} identical, {} different, {} failed | +{} -{} ~{}",
        report.file_count(),
        report.identical_count(),
        report.different_count(),
        report.errors.len(),
        report.totals.additions,
        report.totals.deletions,
        report.totals.changes()
    );
    out
}

/// Machine-readable report
pub fn render_json(report: &BatchReport) -> Value {
    let results: Vec<_> = report
        .pairs
        .iter()
        .map(|p| {
            json!({
                "index": p.result.index,
                "file1": p.result.file1,
                "file2": p.result.file2,
                "diff": p.result.diff,
                "identical": p.result.identical,
                "binary": p.result.binary,
                "stats": {
                    "additions": p.stats.additions,
                    "deletions": p.stats.deletions,
                    "changes": p.stats.changes(),
                },
            })
        })
        .collect();

    json!({
        "generatedAt": chrono::Local::now().to_rfc3339(),
        "summary": {
            "files": report.file_count(),
            "identical": report.identical_count(),
            "different": report.different_count(),
            "additions": report.totals.additions,
            "deletions": report.totals.deletions,
            "changes": report.totals.changes(),
        },
        "results": results,
        "errors": report.errors,
    })
}
