//! Unified diff processing
//!
//! Turns unified diff text into typed lines (`parser`), aligns those lines
//! into two equal-length panes for side-by-side display (`align`), and
//! derives counts (`stats`) and the single-pane view (`unified`).

pub mod align;
pub mod parser;
pub mod stats;
pub mod unified;

pub use align::{align_for_display, align_raw, DisplayRow, PaneRows, RowKind};
pub use parser::{is_binary, parse_diff, DiffLine, HunkHeader, LineKind, Parser};
pub use stats::{format_count, DiffStats};
pub use unified::{next_change, prev_change, unified_rows, UnifiedRow};
