use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthChar;

use crate::batch::PairView;
use crate::config::{Colors, ViewSettings};
use crate::diff::{
    align_raw, next_change, prev_change, unified_rows, DisplayRow, LineKind, PaneRows, RowKind,
    UnifiedRow,
};
use crate::event::KeyInput;
use crate::text::expand_tabs;
use crate::ui::syntax::{HighlightMap, Highlighter, StyledLine};

use super::{Action, ScrollState};

/// Diff view mode: split (side-by-side) or unified (single pane)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffViewMode {
    #[default]
    Split,
    Unified,
}

/// Minimum width for split view (below this, auto-switch to unified)
const SPLIT_VIEW_MIN_WIDTH: u16 = 100;
/// Minimum width change to reset manual mode override
const RESIZE_THRESHOLD: u16 = 4;
const NUM_WIDTH: usize = 4;
const SEPARATOR: &str = " \u{2502} ";

/// The pair currently shown
#[derive(Debug, Clone)]
struct Shown {
    index: usize,
    left_path: PathBuf,
    right_path: PathBuf,
    identical: bool,
    binary: bool,
    rows: PaneRows,
    unified: Vec<UnifiedRow>,
    raw_rows: PaneRows,
}

/// Diff view widget state
#[derive(Debug, Default)]
pub struct DiffViewState {
    shown: Option<Shown>,
    pub scroll: ScrollState,
    pub view_mode: DiffViewMode,
    pub wrap: bool,
    pub line_numbers: bool,
    pub raw: bool,
    /// User manually set the view mode (don't auto-switch)
    manual_mode: bool,
    /// Last width seen (for detecting significant resize)
    last_width: u16,
    /// Inner height at last render, used for paging
    page_height: usize,
    highlighted_left: HighlightMap,
    highlighted_right: HighlightMap,
}

impl DiffViewState {
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            wrap: settings.word_wrap,
            line_numbers: settings.line_numbers,
            view_mode: if settings.unified {
                DiffViewMode::Unified
            } else {
                DiffViewMode::Split
            },
            manual_mode: settings.unified,
            ..Self::default()
        }
    }

    /// Show a pair. Reloading the pair already shown keeps the cursor.
    pub fn set_pair(&mut self, view: &PairView, highlighter: Option<&Highlighter>) {
        let same_pair = self.shown_index() == Some(view.index());

        let left_path = PathBuf::from(&view.result.file1);
        let right_path = PathBuf::from(&view.result.file2);
        self.highlighted_left.clear();
        self.highlighted_right.clear();
        if let Some(h) = highlighter.filter(|_| !view.result.binary) {
            self.highlighted_left = h.highlight(&view.left_content, &left_path);
            self.highlighted_right = h.highlight(&view.right_content, &right_path);
        }

        self.shown = Some(Shown {
            index: view.index(),
            left_path,
            right_path,
            identical: view.result.identical,
            binary: view.result.binary,
            rows: view.rows.clone(),
            unified: unified_rows(&view.lines),
            raw_rows: align_raw(&view.left_content, &view.right_content),
        });

        if !same_pair {
            self.scroll = ScrollState::new();
        }
        self.sync_len();
    }

    pub fn clear(&mut self) {
        self.shown = None;
        self.highlighted_left.clear();
        self.highlighted_right.clear();
        self.scroll = ScrollState::new();
    }

    pub fn shown_index(&self) -> Option<usize> {
        self.shown.as_ref().map(|s| s.index)
    }

    fn sync_len(&mut self) {
        let len = self.row_count();
        self.scroll.set_len(len);
        if len == 0 {
            self.scroll.go_top();
        }
    }

    fn uses_unified(&self) -> bool {
        self.view_mode == DiffViewMode::Unified && !self.raw
    }

    /// Rows in the current presentation
    pub fn row_count(&self) -> usize {
        match &self.shown {
            None => 0,
            Some(s) if self.raw => s.raw_rows.len(),
            Some(s) if self.uses_unified() => s.unified.len(),
            Some(s) => s.rows.len(),
        }
    }

    fn pane_rows(&self) -> Option<&PaneRows> {
        let s = self.shown.as_ref()?;
        Some(if self.raw { &s.raw_rows } else { &s.rows })
    }

    pub fn title(&self) -> String {
        match &self.shown {
            None => "Diff".to_string(),
            Some(s) => {
                let name = |p: &Path| p.display().to_string();
                format!("{} \u{2194} {}", name(&s.left_path), name(&s.right_path))
            }
        }
    }

    /// File and line under the cursor. Prefers the left file; rows that
    /// only exist on the right report the right file.
    pub fn cursor_location(&self) -> Option<(PathBuf, usize)> {
        let s = self.shown.as_ref()?;
        let cursor = self.scroll.cursor;

        if self.uses_unified() {
            return match s.unified.get(cursor)? {
                UnifiedRow::HunkBreak(_) => None,
                UnifiedRow::Line(line) => match (line.left_num, line.right_num) {
                    (Some(l), _) => Some((s.left_path.clone(), l)),
                    (None, Some(r)) => Some((s.right_path.clone(), r)),
                    (None, None) => None,
                },
            };
        }

        let (left, right) = self.pane_rows()?.get(cursor)?;
        match (left.line_number, right.line_number) {
            (Some(l), _) => Some((s.left_path.clone(), l)),
            (None, Some(r)) => Some((s.right_path.clone(), r)),
            (None, None) => None,
        }
    }

    pub fn move_down(&mut self) {
        self.scroll.move_down();
    }

    pub fn move_up(&mut self) {
        self.scroll.move_up();
    }

    fn page(&self) -> usize {
        self.page_height.max(1)
    }

    pub fn next_change(&mut self) -> bool {
        let target = if self.uses_unified() {
            self.shown
                .as_ref()
                .and_then(|s| unified_next_change(&s.unified, self.scroll.cursor))
        } else {
            self.pane_rows().and_then(|rows| next_change(rows, self.scroll.cursor))
        };
        self.jump(target)
    }

    pub fn prev_change(&mut self) -> bool {
        let target = if self.uses_unified() {
            self.shown
                .as_ref()
                .and_then(|s| unified_prev_change(&s.unified, self.scroll.cursor))
        } else {
            self.pane_rows().and_then(|rows| prev_change(rows, self.scroll.cursor))
        };
        self.jump(target)
    }

    fn jump(&mut self, target: Option<usize>) -> bool {
        match target {
            Some(idx) => {
                self.scroll.cursor = idx;
                true
            }
            None => false,
        }
    }

    /// Toggle between split and unified view modes (manual override)
    pub fn toggle_view_mode(&mut self) {
        let location = self.cursor_location();
        self.view_mode = match self.view_mode {
            DiffViewMode::Split => DiffViewMode::Unified,
            DiffViewMode::Unified => DiffViewMode::Split,
        };
        self.manual_mode = true;
        self.relocate(location);
    }

    pub fn toggle_raw(&mut self) {
        let location = self.cursor_location();
        self.raw = !self.raw;
        self.relocate(location);
    }

    /// Keep the cursor on the same source line after switching presentation
    fn relocate(&mut self, location: Option<(PathBuf, usize)>) {
        self.sync_len();
        let Some((path, line)) = location else {
            self.scroll.go_top();
            return;
        };
        let Some(s) = &self.shown else {
            return;
        };
        let on_left = path == s.left_path;

        let found = if self.uses_unified() {
            s.unified.iter().position(|row| match row {
                UnifiedRow::Line(l) if on_left => l.left_num == Some(line),
                UnifiedRow::Line(l) => l.right_num == Some(line) && l.left_num.is_none(),
                UnifiedRow::HunkBreak(_) => false,
            })
        } else {
            self.pane_rows().and_then(|rows| {
                let side = if on_left { &rows.left } else { &rows.right };
                side.iter().position(|r| r.line_number == Some(line))
            })
        };
        match found {
            Some(idx) => self.scroll.cursor = idx,
            None => self.scroll.go_top(),
        }
    }

    /// Auto-adjust view mode based on available width (unless user manually set it)
    pub fn auto_adjust_view_mode(&mut self, width: u16) {
        // Reset manual mode on significant resize
        if self.manual_mode && self.last_width > 0 && width.abs_diff(self.last_width) >= RESIZE_THRESHOLD {
            self.manual_mode = false;
        }
        self.last_width = width;

        if self.manual_mode {
            return;
        }
        let mode = if width < SPLIT_VIEW_MIN_WIDTH {
            DiffViewMode::Unified
        } else {
            DiffViewMode::Split
        };
        if mode != self.view_mode {
            let location = self.cursor_location();
            self.view_mode = mode;
            self.relocate(location);
        }
    }

    /// Handle key input, return action for App to dispatch
    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        if KeyInput::is_down(key) {
            self.scroll.move_down();
        } else if KeyInput::is_up(key) {
            self.scroll.move_up();
        } else if KeyInput::is_fast_down(key) {
            self.scroll.move_down_n(5);
        } else if KeyInput::is_fast_up(key) {
            self.scroll.move_up_n(5);
        } else if KeyInput::is_page_down(key) {
            self.scroll.move_down_n(self.page());
        } else if KeyInput::is_page_up(key) {
            self.scroll.move_up_n(self.page());
        } else if KeyInput::is_top(key) {
            self.scroll.go_top();
        } else if KeyInput::is_bottom(key) {
            self.scroll.go_bottom();
        } else if KeyInput::is_next_change(key) {
            self.next_change();
        } else if KeyInput::is_prev_change(key) {
            self.prev_change();
        } else if KeyInput::is_toggle_view_mode(key) {
            self.toggle_view_mode();
        } else if KeyInput::is_toggle_wrap(key) {
            self.wrap = !self.wrap;
        } else if KeyInput::is_toggle_line_numbers(key) {
            self.line_numbers = !self.line_numbers;
        } else if KeyInput::is_toggle_raw(key) {
            self.toggle_raw();
        } else {
            return Action::Ignored;
        }
        Action::None
    }

    /// Adjust offset so the cursor row is fully visible when rows can
    /// span several screen lines
    fn ensure_visible(&mut self, height: usize, row_height: impl Fn(usize) -> usize) {
        let cursor = self.scroll.cursor;
        if cursor < self.scroll.offset {
            self.scroll.offset = cursor;
            return;
        }
        let mut used: usize = (self.scroll.offset..=cursor).map(&row_height).sum();
        while used > height && self.scroll.offset < cursor {
            used -= row_height(self.scroll.offset);
            self.scroll.offset += 1;
        }
    }
}

fn unified_is_change(rows: &[UnifiedRow], idx: usize) -> bool {
    matches!(rows.get(idx), Some(UnifiedRow::Line(l)) if l.is_change())
}

fn unified_next_change(rows: &[UnifiedRow], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx < rows.len() && unified_is_change(rows, idx) {
        idx += 1;
    }
    (idx..rows.len()).find(|&i| unified_is_change(rows, i))
}

fn unified_prev_change(rows: &[UnifiedRow], from: usize) -> Option<usize> {
    let run_start = |mut i: usize| {
        while i > 0 && unified_is_change(rows, i - 1) {
            i -= 1;
        }
        i
    };
    let mut idx = from.min(rows.len());
    if unified_is_change(rows, idx) {
        idx = run_start(idx);
    }
    let end = (0..idx).rev().find(|&i| unified_is_change(rows, i))?;
    Some(run_start(end))
}

/// Diff view widget
pub struct DiffView<'a> {
    colors: &'a Colors,
    focused: bool,
}

impl<'a> DiffView<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self {
            colors,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

/// Widths of the parts of one pane
#[derive(Debug, Clone, Copy)]
struct PaneGeometry {
    numbers: bool,
    content: usize,
}

impl PaneGeometry {
    fn new(pane_width: usize, numbers: bool) -> Self {
        let gutter = if numbers { NUM_WIDTH + 1 } else { 0 };
        Self {
            numbers,
            content: pane_width.saturating_sub(gutter).max(1),
        }
    }
}

impl<'a> StatefulWidget for DiffView<'a> {
    type State = DiffViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let mut mode = match (state.raw, state.view_mode) {
            (true, _) => "[raw]".to_string(),
            (false, DiffViewMode::Split) => "[split]".to_string(),
            (false, DiffViewMode::Unified) => "[unified]".to_string(),
        };
        if state.wrap {
            mode.push_str("[wrap]");
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(self.focused))
            .title(Span::styled(
                format!("{} {}", state.title(), mode),
                self.colors.style_header(),
            ));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }
        let height = inner.height as usize;
        state.page_height = height;

        if let Some(msg) = empty_message(state) {
            let line = Line::from(Span::styled(msg.0, self.colors.style_muted()));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            if !msg.1.is_empty() && inner.height > 2 {
                let hint = Line::from(Span::styled(msg.1, self.colors.style_muted()));
                buf.set_line(inner.x, inner.y + 2, &hint, inner.width);
            }
            return;
        }

        let width = inner.width as usize;
        let rendered: Vec<Line<'static>> = if state.uses_unified() {
            self.render_unified(state, width, height)
        } else {
            self.render_split(state, width, height)
        };

        for (i, line) in rendered.into_iter().take(height).enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

impl<'a> DiffView<'a> {
    fn render_split(&self, state: &mut DiffViewState, width: usize, height: usize) -> Vec<Line<'static>> {
        let pane_width = width.saturating_sub(SEPARATOR.chars().count()) / 2;
        let geo = PaneGeometry::new(pane_width, state.line_numbers);
        let wrap = state.wrap;

        let Some(rows) = state.pane_rows().cloned() else {
            return Vec::new();
        };
        let row_height = |idx: usize| {
            if !wrap {
                return 1;
            }
            rows.get(idx)
                .map(|(l, r)| {
                    cell_height(&l.text, geo.content).max(cell_height(&r.text, geo.content))
                })
                .unwrap_or(1)
        };
        state.ensure_visible(height, row_height);

        let mut out = Vec::with_capacity(height);
        for idx in state.scroll.offset..rows.len() {
            if out.len() >= height {
                break;
            }
            let Some((left, right)) = rows.get(idx) else {
                break;
            };
            let cursor = self.focused && idx == state.scroll.cursor;
            let left_cells = self.render_cell(left, state.highlighted_left.get(&line_key(left)), geo, wrap, cursor);
            let right_cells =
                self.render_cell(right, state.highlighted_right.get(&line_key(right)), geo, wrap, cursor);

            let lines = left_cells.len().max(right_cells.len());
            let mut left_cells = left_cells.into_iter();
            let mut right_cells = right_cells.into_iter();
            for _ in 0..lines {
                let mut spans = left_cells
                    .next()
                    .unwrap_or_else(|| blank_cell(pane_width));
                spans.push(Span::styled(SEPARATOR, self.colors.style_muted()));
                spans.extend(right_cells.next().unwrap_or_else(|| blank_cell(pane_width)));
                out.push(Line::from(spans));
            }
        }
        out
    }

    /// One pane of one row, as one or more screen lines
    fn render_cell(
        &self,
        row: &DisplayRow,
        highlight: Option<&StyledLine>,
        geo: PaneGeometry,
        wrap: bool,
        cursor: bool,
    ) -> Vec<Vec<Span<'static>>> {
        let (base, bg) = match row.kind {
            RowKind::Addition => (self.colors.style_added(), Some(self.colors.added_bg)),
            RowKind::Deletion => (self.colors.style_removed(), Some(self.colors.removed_bg)),
            RowKind::Context => (self.colors.style_text(), None),
            RowKind::Empty => (self.colors.style_muted(), None),
        };

        let fragments: StyledLine = match highlight {
            Some(hl) if !row.is_empty() => hl.clone(),
            _ => vec![(row.text.clone(), base)],
        };
        let content = fit_fragments(&fragments, geo.content, wrap, bg, cursor);

        content
            .into_iter()
            .enumerate()
            .map(|(i, mut spans)| {
                if geo.numbers {
                    let num = match row.line_number {
                        Some(n) if i == 0 => format!("{:>width$} ", n, width = NUM_WIDTH),
                        _ => " ".repeat(NUM_WIDTH + 1),
                    };
                    spans.insert(0, Span::styled(num, self.colors.style_muted()));
                }
                spans
            })
            .collect()
    }

    fn render_unified(&self, state: &mut DiffViewState, width: usize, height: usize) -> Vec<Line<'static>> {
        let numbers = state.line_numbers;
        let gutter = (if numbers { NUM_WIDTH + 1 } else { 0 }) + 1;
        let content_width = width.saturating_sub(gutter).max(1);
        let wrap = state.wrap;

        let Some(rows) = state.shown.as_ref().map(|s| s.unified.clone()) else {
            return Vec::new();
        };
        let row_height = |idx: usize| match rows.get(idx) {
            Some(UnifiedRow::Line(l)) if wrap => cell_height(&l.text, content_width),
            _ => 1,
        };
        state.ensure_visible(height, row_height);

        let mut out = Vec::with_capacity(height);
        for idx in state.scroll.offset..rows.len() {
            if out.len() >= height {
                break;
            }
            let cursor = self.focused && idx == state.scroll.cursor;
            let line = match &rows[idx] {
                UnifiedRow::HunkBreak(_) => {
                    let mut style = self.colors.style_muted();
                    if cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    out.push(Line::from(Span::styled("\u{2508}".repeat(width), style)));
                    continue;
                }
                UnifiedRow::Line(line) => line,
            };

            let (prefix, num, hl, base, bg) = match line.kind {
                LineKind::Addition => (
                    "+",
                    line.right_num,
                    line.right_num.and_then(|n| state.highlighted_right.get(&n)),
                    self.colors.style_added(),
                    Some(self.colors.added_bg),
                ),
                LineKind::Deletion => (
                    "-",
                    line.left_num,
                    line.left_num.and_then(|n| state.highlighted_left.get(&n)),
                    self.colors.style_removed(),
                    Some(self.colors.removed_bg),
                ),
                LineKind::Context => (
                    " ",
                    line.right_num.or(line.left_num),
                    line.right_num.and_then(|n| state.highlighted_right.get(&n)),
                    self.colors.style_text(),
                    None,
                ),
            };

            let fragments = match hl {
                Some(hl) => hl.clone(),
                None => vec![(line.text.clone(), base)],
            };
            let mut prefix_style = base;
            if cursor {
                prefix_style = prefix_style.add_modifier(Modifier::REVERSED);
            }

            for (i, content) in fit_fragments(&fragments, content_width, wrap, bg, cursor)
                .into_iter()
                .enumerate()
            {
                let mut spans = Vec::with_capacity(content.len() + 2);
                if numbers {
                    let num = match num {
                        Some(n) if i == 0 => format!("{:>width$} ", n, width = NUM_WIDTH),
                        _ => " ".repeat(NUM_WIDTH + 1),
                    };
                    spans.push(Span::styled(num, self.colors.style_muted()));
                }
                let marker = if i == 0 { prefix } else { " " };
                spans.push(Span::styled(marker, prefix_style));
                spans.extend(content);
                out.push(Line::from(spans));
            }
        }
        out
    }
}

fn line_key(row: &DisplayRow) -> usize {
    row.line_number.unwrap_or(0)
}

fn empty_message(state: &DiffViewState) -> Option<(&'static str, &'static str)> {
    let Some(shown) = &state.shown else {
        return Some(("Select a pair to view diff", "Press ? for help"));
    };
    if state.raw {
        return (shown.raw_rows.is_empty()).then_some(("Both files are empty", ""));
    }
    if shown.binary {
        return Some(("Binary files differ", ""));
    }
    if shown.identical {
        return Some(("Files are identical", "Press R to view whole files"));
    }
    if shown.rows.is_empty() {
        return Some(("No changes", ""));
    }
    None
}

fn blank_cell(width: usize) -> Vec<Span<'static>> {
    vec![Span::raw(" ".repeat(width))]
}

fn cell_height(text: &str, width: usize) -> usize {
    let w: usize = expand_tabs(text).chars().map(|c| c.width().unwrap_or(0)).sum();
    w.div_ceil(width.max(1)).max(1)
}

/// Lay styled fragments out in `width` columns: wrapped onto several lines,
/// or truncated with an ellipsis. Every line is padded to `width`.
fn fit_fragments(
    fragments: &[(String, Style)],
    width: usize,
    wrap: bool,
    bg: Option<ratatui::style::Color>,
    cursor: bool,
) -> Vec<Vec<Span<'static>>> {
    let decorate = |style: Style| {
        let mut style = style;
        if let Some(bg) = bg {
            style = style.bg(bg);
        }
        if cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        style
    };

    let chars: Vec<(char, Style)> = fragments
        .iter()
        .flat_map(|(text, style)| expand_tabs(text).chars().map(|c| (c, *style)).collect::<Vec<_>>())
        .collect();
    let total: usize = chars.iter().map(|(c, _)| c.width().unwrap_or(0)).sum();
    let limit = if !wrap && total > width {
        width.saturating_sub(1)
    } else {
        width
    };

    let mut lines: Vec<Vec<Span<'static>>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;
    let mut used = 0;

    let close_run = |spans: &mut Vec<Span<'static>>, run: &mut String, style: Option<Style>| {
        if let (false, Some(style)) = (run.is_empty(), style) {
            spans.push(Span::styled(std::mem::take(run), decorate(style)));
        }
    };

    for (c, style) in chars {
        let cw = c.width().unwrap_or(0);
        if used + cw > limit {
            if !wrap {
                break;
            }
            if used > 0 {
                close_run(&mut spans, &mut run, run_style);
                spans.push(Span::styled(" ".repeat(width.saturating_sub(used)), decorate(Style::default())));
                lines.push(std::mem::take(&mut spans));
                used = 0;
            }
        }
        if run_style != Some(style) {
            close_run(&mut spans, &mut run, run_style);
            run_style = Some(style);
        }
        run.push(c);
        used += cw;
    }
    close_run(&mut spans, &mut run, run_style);

    if !wrap && total > width && width > 0 {
        spans.push(Span::styled("\u{2026}", decorate(run_style.unwrap_or_default())));
        used += 1;
    }
    spans.push(Span::styled(" ".repeat(width.saturating_sub(used)), decorate(Style::default())));
    lines.push(spans);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::PairView;
    use crate::compare::DiffResult;
    use crate::diff::{align_for_display, DiffStats, Parser};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn pair(index: usize, diff: &str, left: &str, right: &str) -> PairView {
        let lines = Parser::new().suppress_filename_hunk(false).parse(diff);
        PairView {
            result: DiffResult {
                index,
                file1: "old.txt".into(),
                file2: "new.txt".into(),
                diff: diff.into(),
                identical: diff.is_empty(),
                binary: false,
            },
            rows: align_for_display(&lines),
            stats: DiffStats::from_lines(&lines),
            lines,
            left_content: left.into(),
            right_content: right.into(),
        }
    }

    fn sample() -> PairView {
        pair(
            0,
            "@@ -1,5 +1,6 @@\n a\n-b\n+B\n c\n d\n+e\n f\n",
            "a\nb\nc\nd\nf\n",
            "a\nB\nc\nd\ne\nf\n",
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn text_of(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    // --- State ---

    #[test]
    fn set_pair_resets_cursor_only_for_new_pairs() {
        let mut state = DiffViewState::new(ViewSettings::default());
        state.set_pair(&sample(), None);
        state.scroll.go_bottom();
        assert_eq!(state.scroll.cursor, 5);

        state.set_pair(&sample(), None);
        assert_eq!(state.scroll.cursor, 5);

        state.set_pair(&pair(1, "@@ -1,1 +1,1 @@\n-x\n+y\n", "x\n", "y\n"), None);
        assert_eq!(state.scroll.cursor, 0);
        assert_eq!(state.row_count(), 1);
    }

    #[test]
    fn change_navigation_in_both_modes() {
        let mut state = DiffViewState::new(ViewSettings::default());
        state.set_pair(&sample(), None);
        assert_eq!(state.handle_key(&press(KeyCode::Char(']'))), Action::None);
        assert_eq!(state.scroll.cursor, 1);
        state.next_change();
        assert_eq!(state.scroll.cursor, 4);
        assert!(!state.next_change());
        state.prev_change();
        assert_eq!(state.scroll.cursor, 1);

        state.toggle_view_mode();
        assert_eq!(state.view_mode, DiffViewMode::Unified);
        // unified rows: a -b +B c d +e f
        assert_eq!(state.row_count(), 7);
        assert_eq!(state.scroll.cursor, 1);
        state.next_change();
        assert_eq!(state.scroll.cursor, 5);
        state.prev_change();
        assert_eq!(state.scroll.cursor, 1);
    }

    #[test]
    fn cursor_location_prefers_left_file() {
        let mut state = DiffViewState::new(ViewSettings::default());
        state.set_pair(&sample(), None);
        state.scroll.cursor = 1;
        assert_eq!(state.cursor_location(), Some((PathBuf::from("old.txt"), 2)));
        // "+e" has no left line
        state.scroll.cursor = 4;
        assert_eq!(state.cursor_location(), Some((PathBuf::from("new.txt"), 5)));
    }

    #[test]
    fn raw_mode_shows_whole_files_and_keeps_line() {
        let mut state = DiffViewState::new(ViewSettings::default());
        state.set_pair(&sample(), None);
        state.scroll.cursor = 3; // d, left line 4
        state.handle_key(&KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT));
        assert!(state.raw);
        assert_eq!(state.row_count(), 6);
        assert_eq!(state.cursor_location(), Some((PathBuf::from("old.txt"), 4)));
    }

    #[test]
    fn identical_pair_has_raw_view_only() {
        let mut state = DiffViewState::new(ViewSettings::default());
        state.set_pair(&pair(0, "", "same\n", "same\n"), None);
        assert_eq!(state.row_count(), 0);
        assert_eq!(empty_message(&state).map(|m| m.0), Some("Files are identical"));
        state.toggle_raw();
        assert_eq!(state.row_count(), 1);
        assert!(empty_message(&state).is_none());
    }

    #[test]
    fn auto_view_mode_respects_manual_choice() {
        let mut state = DiffViewState::new(ViewSettings::default());
        state.auto_adjust_view_mode(80);
        assert_eq!(state.view_mode, DiffViewMode::Unified);
        state.auto_adjust_view_mode(150);
        assert_eq!(state.view_mode, DiffViewMode::Split);

        state.toggle_view_mode();
        state.auto_adjust_view_mode(151);
        assert_eq!(state.view_mode, DiffViewMode::Unified);
        // large resize drops the manual override
        state.auto_adjust_view_mode(120);
        assert_eq!(state.view_mode, DiffViewMode::Split);
    }

    #[test]
    fn toggles_flip_settings() {
        let mut state = DiffViewState::new(ViewSettings::default());
        state.handle_key(&press(KeyCode::Char('w')));
        state.handle_key(&press(KeyCode::Char('n')));
        assert!(state.wrap);
        assert!(!state.line_numbers);
        assert_eq!(state.handle_key(&press(KeyCode::Char('x'))), Action::Ignored);
    }

    // --- Layout ---

    #[test]
    fn fit_fragments_truncates_or_wraps() {
        let frags = vec![("abcdef".to_string(), Style::default())];
        let cut = fit_fragments(&frags, 4, false, None, false);
        assert_eq!(cut.len(), 1);
        assert_eq!(text_of(&cut[0]), "abc\u{2026}");

        let wrapped = fit_fragments(&frags, 4, true, None, false);
        assert_eq!(wrapped.len(), 2);
        assert_eq!(text_of(&wrapped[0]), "abcd");
        assert_eq!(text_of(&wrapped[1]), "ef  ");
    }

    #[test]
    fn fit_fragments_keeps_styles_per_fragment() {
        let red = Style::default().fg(ratatui::style::Color::Red);
        let frags = vec![("ab".to_string(), Style::default()), ("cd".to_string(), red)];
        let line = &fit_fragments(&frags, 6, false, None, false)[0];
        assert_eq!(text_of(line), "abcd  ");
        assert_eq!(line[1].content, "cd");
        assert_eq!(line[1].style.fg, Some(ratatui::style::Color::Red));
    }

    #[test]
    fn cell_height_counts_wrapped_lines() {
        assert_eq!(cell_height("", 10), 1);
        assert_eq!(cell_height("abcdefghij", 10), 1);
        assert_eq!(cell_height("abcdefghijk", 10), 2);
    }

    #[test]
    fn split_render_fills_buffer() {
        let colors = Colors::dark();
        let mut state = DiffViewState::new(ViewSettings::default());
        state.set_pair(&sample(), None);
        let area = Rect::new(0, 0, 120, 10);
        let mut buf = Buffer::empty(area);
        DiffView::new(&colors).focused(true).render(area, &mut buf, &mut state);

        let row: String = (0..area.width)
            .map(|x| buf[(x, 2)].symbol().to_string())
            .collect();
        assert!(row.contains('b'));
        assert!(row.contains('B'));
        assert!(row.contains('\u{2502}'));
    }
}
