use serde::Serialize;
use std::ops::AddAssign;

use super::align::{PaneRows, RowKind};
use super::parser::{DiffLine, LineKind};

/// Diff statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
    pub context: usize,
}

impl DiffStats {
    pub fn from_lines(lines: &[DiffLine]) -> Self {
        let mut stats = Self::default();
        for line in lines {
            match line.kind {
                LineKind::Addition => stats.additions += 1,
                LineKind::Deletion => stats.deletions += 1,
                LineKind::Context => stats.context += 1,
            }
        }
        stats
    }

    /// Count rendered rows, as batch totals do. Context rows appear on both
    /// panes but count once.
    pub fn from_rows(rows: &PaneRows) -> Self {
        let mut stats = Self::default();
        for (left, right) in rows.pairs() {
            match left.kind {
                RowKind::Deletion => stats.deletions += 1,
                RowKind::Context => stats.context += 1,
                _ => {}
            }
            if right.kind == RowKind::Addition {
                stats.additions += 1;
            }
        }
        stats
    }

    /// Lines that were modified rather than purely added or removed
    pub fn changes(&self) -> usize {
        self.additions.min(self.deletions)
    }

    pub fn has_changes(&self) -> bool {
        self.additions > 0 || self.deletions > 0
    }
}

impl AddAssign for DiffStats {
    fn add_assign(&mut self, other: Self) {
        self.additions += other.additions;
        self.deletions += other.deletions;
        self.context += other.context;
    }
}

/// Format large numbers with K/M suffixes
pub fn format_count(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{}K", n / 1000)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1000.0)
    } else {
        n.to_string()
    }
}
