//! Batch comparison of many file pairs
//!
//! Every pair goes through compare -> parse -> align independently, so one
//! unreadable file never blocks the others.

use serde::Serialize;
use std::thread;

use crate::compare::{Comparator, Comparison, DiffResult, FilePair};
use crate::diff::{align_for_display, align_raw, DiffLine, DiffStats, PaneRows, Parser};

/// A compared pair ready to display
#[derive(Debug, Clone)]
pub struct PairView {
    pub result: DiffResult,
    pub lines: Vec<DiffLine>,
    pub rows: PaneRows,
    pub stats: DiffStats,
    pub left_content: String,
    pub right_content: String,
}

impl PairView {
    pub fn from_comparison(cmp: Comparison) -> Self {
        // Generated diffs never carry a filename pseudo-hunk, so a real
        // single-line change in the first hunk must be kept
        let lines = if cmp.result.diff.is_empty() {
            Vec::new()
        } else {
            Parser::new()
                .suppress_filename_hunk(false)
                .parse(&cmp.result.diff)
        };
        let rows = align_for_display(&lines);
        let stats = DiffStats::from_lines(&lines);

        Self {
            result: cmp.result,
            lines,
            rows,
            stats,
            left_content: cmp.left_content,
            right_content: cmp.right_content,
        }
    }

    /// View an externally produced unified diff. Such diffs may start with
    /// a filename pseudo-hunk, so the default parser filter applies. There
    /// is no file content, so the raw view is empty.
    pub fn from_patch(label: &str, text: &str) -> Self {
        let lines = Parser::new().parse(text);
        let rows = align_for_display(&lines);
        let stats = DiffStats::from_lines(&lines);

        Self {
            result: DiffResult {
                index: 0,
                file1: label.to_string(),
                file2: label.to_string(),
                diff: text.to_string(),
                identical: !stats.has_changes(),
                binary: false,
            },
            lines,
            rows,
            stats,
            left_content: String::new(),
            right_content: String::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.result.index
    }

    pub fn is_identical(&self) -> bool {
        self.result.identical
    }

    /// Whole files side by side, regardless of the diff
    pub fn raw_rows(&self) -> PaneRows {
        align_raw(&self.left_content, &self.right_content)
    }
}

/// A pair that could not be compared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairError {
    pub index: usize,
    pub file1: String,
    pub file2: String,
    pub error: String,
}

/// Result of comparing a list of pairs, ordered by index
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub pairs: Vec<PairView>,
    pub errors: Vec<PairError>,
    pub totals: DiffStats,
}

impl BatchReport {
    pub fn identical_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_identical()).count()
    }

    pub fn different_count(&self) -> usize {
        self.pairs.len() - self.identical_count()
    }

    pub fn file_count(&self) -> usize {
        self.pairs.len() + self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn filtered(&self, filter: Filter) -> impl Iterator<Item = &PairView> {
        self.pairs.iter().filter(move |p| filter.matches(p))
    }
}

/// Which pairs to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Changed,
    Identical,
}

impl Filter {
    pub fn matches(self, pair: &PairView) -> bool {
        match self {
            Self::All => true,
            Self::Changed => !pair.is_identical(),
            Self::Identical => pair.is_identical(),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Changed,
            Self::Changed => Self::Identical,
            Self::Identical => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Changed => "changed",
            Self::Identical => "identical",
        }
    }
}

/// Compare every pair on its own thread and collect the results
pub fn run(comparator: &Comparator, pairs: Vec<FilePair>) -> BatchReport {
    let outcomes: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = pairs
            .iter()
            .map(|pair| s.spawn(move || comparator.compare(pair)))
            .collect();

        pairs
            .iter()
            .zip(handles)
            .map(|(pair, handle)| {
                let outcome = match handle.join() {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(_) => Err("comparison panicked".to_string()),
                };
                (pair, outcome)
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for (pair, outcome) in outcomes {
        match outcome {
            Ok(cmp) => {
                let view = PairView::from_comparison(cmp);
                // Totals count displayed rows across all pairs
                report.totals += DiffStats::from_rows(&view.rows);
                report.pairs.push(view);
            }
            Err(e) => {
                log::warn!(
                    "Failed to compare {} with {}: {}",
                    pair.file1.display(),
                    pair.file2.display(),
                    e
                );
                report.errors.push(PairError {
                    index: pair.index,
                    file1: pair.file1.display().to_string(),
                    file2: pair.file2.display().to_string(),
                    error: e,
                });
            }
        }
    }

    report.pairs.sort_by_key(|p| p.index());
    report.errors.sort_by_key(|e| e.index);
    log::info!(
        "Compared {} pairs: {} identical, {} different, {} failed",
        report.file_count(),
        report.identical_count(),
        report.different_count(),
        report.errors.len()
    );
    report
}
