use anyhow::{Context, Result};
use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Position, Rect},
    text::{Line, Span},
    Frame,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::async_loader::BatchLoader;
use crate::batch::{BatchReport, Filter, PairView};
use crate::compare::{Comparator, FilePair};
use crate::config::Config;
use crate::diff::format_count;
use crate::event::KeyInput;
use crate::ui::{
    centered_rect, Action, AppLayout, DiffView, DiffViewState, FocusTarget, HelpModal,
    Highlighter, LayoutAreas, PairList, PairListState,
};

/// How long a status message stays visible
const MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Which window is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedWindow {
    PairList,
    Preview,
}

impl FocusedWindow {
    pub fn next(self) -> Self {
        match self {
            Self::PairList => Self::Preview,
            Self::Preview => Self::PairList,
        }
    }

    pub fn prev(self) -> Self {
        self.next()
    }
}

/// Command to execute after handling input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    OpenEditor { path: String, line: Option<usize> },
}

/// What the app displays
#[derive(Debug, Clone)]
pub enum Source {
    /// Compare these pairs
    Pairs {
        comparator: Comparator,
        pairs: Vec<FilePair>,
    },
    /// Show a unified diff read from a file
    Patch { path: PathBuf },
}

/// Main application state
pub struct App {
    pub running: bool,
    pub config: Config,
    source: Source,

    pub focused: FocusedWindow,
    pub show_help: bool,
    pub pending_command: AppCommand,
    message: Option<(String, Instant)>,

    pub report: BatchReport,
    loader: BatchLoader,

    pub pair_list_state: PairListState,
    pub diff_view_state: DiffViewState,
    last_areas: Option<LayoutAreas>,

    highlighter: Highlighter,
}

impl App {
    pub fn new(config: Config, source: Source) -> Result<Self> {
        let highlighter = Highlighter::for_theme(config.theme);
        let diff_view_state = DiffViewState::new(config.view);
        let mut app = Self {
            running: true,
            config,
            source,
            focused: FocusedWindow::PairList,
            show_help: false,
            pending_command: AppCommand::None,
            message: None,
            report: BatchReport::default(),
            loader: BatchLoader::new(),
            pair_list_state: PairListState::new(),
            diff_view_state,
            last_areas: None,
            highlighter,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Compare again (or re-read the patch)
    pub fn refresh(&mut self) -> Result<()> {
        match &self.source {
            Source::Pairs { comparator, pairs } => {
                self.loader.load(comparator.clone(), pairs.clone());
            }
            Source::Patch { path } => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read patch: {}", path.display()))?;
                let view = PairView::from_patch(&path.display().to_string(), &text);
                let report = BatchReport {
                    totals: view.stats,
                    pairs: vec![view],
                    errors: Vec::new(),
                };
                self.apply_report(report);
            }
        }
        Ok(())
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.pair_list_state.filter = filter;
        self.pair_list_state.set_report(&self.report);
        self.update_preview();
    }

    fn apply_report(&mut self, report: BatchReport) {
        self.report = report;
        self.pair_list_state.set_report(&self.report);
        self.update_preview();
    }

    /// Handle tick event - periodic updates
    pub fn handle_tick(&mut self) {
        if let Some(report) = self.loader.poll() {
            self.apply_report(report);
            if self.loader.take_queued() {
                if let Err(e) = self.refresh() {
                    log::warn!("Refresh failed: {}", e);
                }
            }
        }

        if self
            .message
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() >= MESSAGE_TTL)
        {
            self.message = None;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some((msg.into(), Instant::now()));
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Help modal takes priority
        if self.show_help {
            if KeyInput::is_help(&key) || KeyInput::is_escape(&key) {
                self.show_help = false;
            }
            return Ok(());
        }

        // Global keys
        let global = if KeyInput::is_quit(&key) {
            Action::Quit
        } else if KeyInput::is_help(&key) {
            Action::ToggleHelp
        } else if KeyInput::is_refresh(&key) {
            Action::Refresh
        } else if KeyInput::is_tab(&key) {
            Action::ChangeFocus(FocusTarget::Next)
        } else if KeyInput::is_shift_tab(&key) {
            Action::ChangeFocus(FocusTarget::Prev)
        } else if KeyInput::is_escape(&key) && self.focused == FocusedWindow::Preview {
            Action::ChangeFocus(FocusTarget::PairList)
        } else if KeyInput::is_yank(&key) {
            Action::YankLocation
        } else if KeyInput::is_open(&key) {
            Action::OpenInEditor
        } else if KeyInput::is_cycle_filter(&key) {
            Action::CycleFilter
        } else {
            Action::Ignored
        };
        if global != Action::Ignored {
            return self.dispatch(global);
        }

        // Window-specific keys - delegate to widget, dispatch action
        let action = match self.focused {
            FocusedWindow::PairList => self.pair_list_state.handle_key(&key),
            FocusedWindow::Preview => self.diff_view_state.handle_key(&key),
        };
        self.dispatch(action)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let Some(areas) = self.last_areas else {
            return Ok(());
        };
        let pos = Position::new(mouse.column, mouse.row);
        let in_list = areas.pair_list.contains(pos);
        let in_preview = areas.preview.contains(pos);

        match mouse.kind {
            MouseEventKind::ScrollDown if in_preview => self.diff_view_state.move_down(),
            MouseEventKind::ScrollUp if in_preview => self.diff_view_state.move_up(),
            MouseEventKind::ScrollDown if in_list => {
                self.pair_list_state.scroll.move_down();
                self.update_preview();
            }
            MouseEventKind::ScrollUp if in_list => {
                self.pair_list_state.scroll.move_up();
                self.update_preview();
            }
            MouseEventKind::Down(MouseButton::Left) if in_list => {
                self.focused = FocusedWindow::PairList;
                // -1 for the top border
                let row = mouse.row.saturating_sub(areas.pair_list.y + 1) as usize;
                self.pair_list_state.scroll.click_at(row);
                self.update_preview();
            }
            MouseEventKind::Down(MouseButton::Left) if in_preview => {
                self.focused = FocusedWindow::Preview;
            }
            _ => {}
        }
        Ok(())
    }

    /// Dispatch an action from a widget
    fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::None | Action::Ignored => {}

            Action::Quit => {
                self.running = false;
            }

            Action::Refresh => {
                self.refresh()?;
            }

            Action::ToggleHelp => {
                self.show_help = !self.show_help;
            }

            Action::ChangeFocus(target) => {
                self.focused = match target {
                    FocusTarget::PairList => FocusedWindow::PairList,
                    FocusTarget::Preview => FocusedWindow::Preview,
                    FocusTarget::Next => self.focused.next(),
                    FocusTarget::Prev => self.focused.prev(),
                };
            }

            Action::PairSelected(_) => {
                self.update_preview();
            }

            Action::OpenPair(_) => {
                self.update_preview();
                self.focused = FocusedWindow::Preview;
            }

            Action::CycleFilter => {
                self.pair_list_state.cycle_filter(&self.report);
                self.set_message(format!("Filter: {}", self.pair_list_state.filter.label()));
                self.update_preview();
            }

            Action::YankLocation => {
                self.yank_location();
            }

            Action::OpenInEditor => {
                self.open_in_editor();
            }
        }

        Ok(())
    }

    fn selected_view(&self) -> Option<&PairView> {
        let index = self.pair_list_state.selected_index()?;
        self.report.pairs.iter().find(|p| p.index() == index)
    }

    fn update_preview(&mut self) {
        let index = self.pair_list_state.selected_index();
        match index.and_then(|i| self.report.pairs.iter().find(|p| p.index() == i)) {
            Some(view) => self.diff_view_state.set_pair(view, Some(&self.highlighter)),
            None => self.diff_view_state.clear(),
        }
    }

    /// `file:line` under the diff cursor, or the left file of the pair
    fn current_location(&self) -> Option<(PathBuf, Option<usize>)> {
        if self.focused == FocusedWindow::Preview {
            if let Some((path, line)) = self.diff_view_state.cursor_location() {
                return Some((path, Some(line)));
            }
        }
        let view = self.selected_view()?;
        Some((PathBuf::from(&view.result.file1), None))
    }

    fn yank_location(&mut self) {
        let Some((path, line)) = self.current_location() else {
            return;
        };
        let text = match line {
            Some(line) => format!("{}:{}", path.display(), line),
            None => path.display().to_string(),
        };

        let copied = arboard::Clipboard::new().and_then(|mut c| c.set_text(text.clone()));
        match copied {
            Ok(()) => self.set_message(format!("Copied {}", text)),
            Err(e) => {
                log::warn!("Clipboard unavailable: {}", e);
                self.set_message("Clipboard unavailable");
            }
        }
    }

    fn open_in_editor(&mut self) {
        if matches!(self.source, Source::Patch { .. }) {
            return;
        }
        let Some((path, line)) = self.current_location() else {
            return;
        };
        let path = match &self.source {
            Source::Pairs { comparator, .. } => comparator
                .resolve(&path)
                .unwrap_or(path),
            Source::Patch { .. } => path,
        };
        self.pending_command = AppCommand::OpenEditor {
            path: path.to_string_lossy().to_string(),
            line,
        };
    }

    /// Take pending command (clears it)
    pub fn take_command(&mut self) -> AppCommand {
        std::mem::replace(&mut self.pending_command, AppCommand::None)
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let areas = AppLayout::default().compute(area);
        self.last_areas = Some(areas);
        self.diff_view_state.auto_adjust_view_mode(areas.preview.width);

        let colors = &self.config.colors;

        let pair_list = PairList::new(colors)
            .focused(self.focused == FocusedWindow::PairList)
            .loading(self.loader.is_loading());
        frame.render_stateful_widget(pair_list, areas.pair_list, &mut self.pair_list_state);

        let diff_view = DiffView::new(colors).focused(self.focused == FocusedWindow::Preview);
        frame.render_stateful_widget(diff_view, areas.preview, &mut self.diff_view_state);

        self.render_status_bar(frame, areas.status_bar);

        if self.show_help {
            let help_area = centered_rect(60, 80, area);
            frame.render_widget(HelpModal::new(&self.config.colors), help_area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.config.colors;
        let style = colors.style_status_bar();
        let report = &self.report;

        let mut left = vec![Span::styled(
            format!(
                " {} files  {} identical  {} different",
                report.file_count(),
                report.identical_count(),
                report.different_count()
            ),
            style,
        )];
        if report.has_errors() {
            left.push(Span::styled(
                format!("  {} failed", report.errors.len()),
                style.patch(colors.style_error()),
            ));
        }
        left.push(Span::styled("  ", style));
        left.push(Span::styled(
            format!("+{}", format_count(report.totals.additions)),
            style.patch(colors.style_added()),
        ));
        left.push(Span::styled(" ", style));
        left.push(Span::styled(
            format!("-{}", format_count(report.totals.deletions)),
            style.patch(colors.style_removed()),
        ));
        left.push(Span::styled(
            format!(" ~{}", format_count(report.totals.changes())),
            style,
        ));

        let right = match &self.message {
            Some((msg, _)) => format!("{} ", msg),
            None if self.loader.is_loading() => "comparing\u{2026} ".to_string(),
            None => format!("[{}]  ? help ", self.pair_list_state.filter.label()),
        };

        let left_width: usize = left.iter().map(|s| s.width()).sum();
        let padding = (area.width as usize).saturating_sub(left_width + right.chars().count());
        left.push(Span::styled(" ".repeat(padding), style));
        left.push(Span::styled(right, style));

        frame.render_widget(Line::from(left), area);
    }
}
