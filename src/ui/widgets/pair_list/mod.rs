use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};
use std::path::Path;

use crate::batch::{BatchReport, Filter, PairView};
use crate::config::Colors;
use crate::diff::format_count;
use crate::event::KeyInput;

use super::{Action, ScrollState};

/// Outcome shown next to a pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    Identical,
    Different { additions: usize, deletions: usize },
    Binary,
    Failed(String),
}

/// One row of the pair list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    pub index: usize,
    pub label: String,
    pub status: PairStatus,
}

impl PairEntry {
    fn from_view(view: &PairView) -> Self {
        let status = if view.result.identical {
            PairStatus::Identical
        } else if view.result.binary {
            PairStatus::Binary
        } else {
            PairStatus::Different {
                additions: view.stats.additions,
                deletions: view.stats.deletions,
            }
        };
        Self {
            index: view.index(),
            label: pair_label(&view.result.file1, &view.result.file2),
            status,
        }
    }
}

/// `name` when both sides share a file name, `left ↔ right` otherwise
fn pair_label(file1: &str, file2: &str) -> String {
    let name = |p: &str| {
        Path::new(p)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| p.to_string())
    };
    let (left, right) = (name(file1), name(file2));
    if left == right {
        left
    } else {
        format!("{} \u{2194} {}", left, right)
    }
}

/// Pair list widget state
#[derive(Debug, Default)]
pub struct PairListState {
    pub entries: Vec<PairEntry>,
    pub scroll: ScrollState,
    pub filter: Filter,
}

impl PairListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild entries for the current filter, keeping the selected pair
    /// when it is still visible
    pub fn set_report(&mut self, report: &BatchReport) {
        let selected = self.selected_index();

        let mut entries: Vec<PairEntry> = report
            .filtered(self.filter)
            .map(PairEntry::from_view)
            .collect();
        // Failures are never identical
        if self.filter != Filter::Identical {
            entries.extend(report.errors.iter().map(|e| PairEntry {
                index: e.index,
                label: pair_label(&e.file1, &e.file2),
                status: PairStatus::Failed(e.error.clone()),
            }));
        }
        entries.sort_by_key(|e| e.index);

        self.entries = entries;
        self.scroll.set_len(self.entries.len());
        if let Some(index) = selected {
            self.select_index(index);
        }
    }

    pub fn cycle_filter(&mut self, report: &BatchReport) {
        self.filter = self.filter.next();
        self.set_report(report);
    }

    pub fn selected(&self) -> Option<&PairEntry> {
        self.entries.get(self.scroll.cursor)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected().map(|e| e.index)
    }

    pub fn select_index(&mut self, index: usize) {
        if let Some(pos) = self.entries.iter().position(|e| e.index == index) {
            self.scroll.cursor = pos;
        }
    }

    /// Handle key input, return action for App to dispatch
    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        let before = self.selected_index();

        if KeyInput::is_down(key) {
            self.scroll.move_down();
        } else if KeyInput::is_up(key) {
            self.scroll.move_up();
        } else if KeyInput::is_fast_down(key) {
            self.scroll.move_down_n(5);
        } else if KeyInput::is_fast_up(key) {
            self.scroll.move_up_n(5);
        } else if KeyInput::is_top(key) {
            self.scroll.go_top();
        } else if KeyInput::is_bottom(key) {
            self.scroll.go_bottom();
        } else if KeyInput::is_enter(key) {
            return match self.selected_index() {
                Some(index) => Action::OpenPair(index),
                None => Action::None,
            };
        } else if KeyInput::is_cycle_filter(key) {
            return Action::CycleFilter;
        } else {
            return Action::Ignored;
        }

        match self.selected_index() {
            Some(index) if before != Some(index) => Action::PairSelected(index),
            _ => Action::None,
        }
    }
}

/// Pair list widget
pub struct PairList<'a> {
    colors: &'a Colors,
    focused: bool,
    loading: bool,
}

impl<'a> PairList<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self {
            colors,
            focused: false,
            loading: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

impl<'a> StatefulWidget for PairList<'a> {
    type State = PairListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let mut title = format!("Pairs [{}]", state.filter.label());
        if self.loading {
            title.push_str(" \u{2026}");
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(self.focused))
            .title(Span::styled(title, self.colors.style_header()));

        let inner = block.inner(area);
        block.render(area, buf);

        if state.entries.is_empty() {
            let msg = if self.loading { "Comparing\u{2026}" } else { "No pairs" };
            let line = Line::from(Span::styled(msg, self.colors.style_muted()));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        state.scroll.ensure_visible(inner.height as usize);

        let visible = state
            .entries
            .iter()
            .enumerate()
            .skip(state.scroll.offset)
            .take(inner.height as usize);

        for (i, (idx, entry)) in visible.enumerate() {
            let y = inner.y + i as u16;
            let line = render_entry(entry, idx == state.scroll.cursor, self.colors);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}

fn render_entry(entry: &PairEntry, selected: bool, colors: &Colors) -> Line<'static> {
    let cursor = if selected { ">" } else { " " };
    let name_style = if selected {
        colors.style_selected()
    } else {
        colors.style_text()
    };

    let mut spans = vec![
        Span::raw(cursor.to_string()),
        Span::styled(format!("{:>3} ", entry.index + 1), colors.style_muted()),
        Span::styled(entry.label.clone(), name_style),
        Span::raw(" ".to_string()),
    ];

    match &entry.status {
        PairStatus::Identical => {
            spans.push(Span::styled("=".to_string(), colors.style_identical()));
        }
        PairStatus::Binary => {
            spans.push(Span::styled("bin".to_string(), colors.style_muted()));
        }
        PairStatus::Different { additions, deletions } => {
            spans.push(Span::styled(format!("+{}", format_count(*additions)), colors.style_added()));
            spans.push(Span::raw(" ".to_string()));
            spans.push(Span::styled(format!("-{}", format_count(*deletions)), colors.style_removed()));
        }
        PairStatus::Failed(_) => {
            spans.push(Span::styled("!".to_string(), colors.style_error()));
        }
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::PairError;
    use crate::compare::DiffResult;
    use crate::diff::{DiffStats, PaneRows};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn view(index: usize, identical: bool, additions: usize) -> PairView {
        PairView {
            result: DiffResult {
                index,
                file1: format!("left/f{}.txt", index),
                file2: format!("right/f{}.txt", index),
                diff: String::new(),
                identical,
                binary: false,
            },
            lines: Vec::new(),
            rows: PaneRows::default(),
            stats: DiffStats {
                additions,
                deletions: 0,
                context: 0,
            },
            left_content: String::new(),
            right_content: String::new(),
        }
    }

    fn report() -> BatchReport {
        BatchReport {
            pairs: vec![view(0, false, 2), view(2, true, 0), view(3, false, 1)],
            errors: vec![PairError {
                index: 1,
                file1: "a".into(),
                file2: "b".into(),
                error: "file not found: a".into(),
            }],
            totals: DiffStats::default(),
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    // --- Entries ---

    #[test]
    fn entries_include_errors_in_index_order() {
        let mut state = PairListState::new();
        state.set_report(&report());
        let indices: Vec<_> = state.entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(state.entries[0].label, "f0.txt");
        assert!(matches!(state.entries[1].status, PairStatus::Failed(_)));
        assert_eq!(state.entries[1].label, "a \u{2194} b");
    }

    #[test]
    fn filter_cycles_and_keeps_selection() {
        let report = report();
        let mut state = PairListState::new();
        state.set_report(&report);
        state.select_index(3);

        state.cycle_filter(&report);
        assert_eq!(state.filter, Filter::Changed);
        let indices: Vec<_> = state.entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
        assert_eq!(state.selected_index(), Some(3));

        state.cycle_filter(&report);
        assert_eq!(state.filter, Filter::Identical);
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.selected_index(), Some(2));
    }

    // --- Keys ---

    #[test]
    fn moving_reports_selection() {
        let mut state = PairListState::new();
        state.set_report(&report());
        assert_eq!(state.handle_key(&press(KeyCode::Char('j'))), Action::PairSelected(1));
        assert_eq!(state.handle_key(&press(KeyCode::Char('k'))), Action::PairSelected(0));
        // already at top
        assert_eq!(state.handle_key(&press(KeyCode::Char('k'))), Action::None);
        assert_eq!(state.handle_key(&press(KeyCode::Enter)), Action::OpenPair(0));
        assert_eq!(state.handle_key(&press(KeyCode::Char('f'))), Action::CycleFilter);
        assert_eq!(state.handle_key(&press(KeyCode::Char('z'))), Action::Ignored);
    }

    #[test]
    fn empty_list_is_safe() {
        let mut state = PairListState::new();
        state.set_report(&BatchReport::default());
        assert!(state.selected().is_none());
        assert_eq!(state.handle_key(&press(KeyCode::Enter)), Action::None);
        assert_eq!(state.handle_key(&press(KeyCode::Char('j'))), Action::None);
    }
}
