use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Layout configuration
pub struct AppLayout {
    /// Below this width the pair list stacks above the diff
    pub breakpoint: u16,
    pub left_ratio: u16,
    /// Stacked list height when narrow
    pub stacked_list_height: u16,
}

impl Default for AppLayout {
    fn default() -> Self {
        Self {
            breakpoint: 120,
            left_ratio: 25,
            stacked_list_height: 8,
        }
    }
}

/// Computed layout areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutAreas {
    pub pair_list: Rect,
    pub preview: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn compute(&self, area: Rect) -> LayoutAreas {
        let [main_area, status_bar] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .areas(area);

        let (pair_list, preview) = if area.width >= self.breakpoint {
            let [list, preview] = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(self.left_ratio),
                    Constraint::Percentage(100 - self.left_ratio),
                ])
                .areas(main_area);
            (list, preview)
        } else {
            let [list, preview] = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(self.stacked_list_height),
                    Constraint::Min(0),
                ])
                .areas(main_area);
            (list, preview)
        };

        LayoutAreas {
            pair_list,
            preview,
            status_bar,
        }
    }
}

/// Calculate centered rect for modal
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .areas(area);

    let [_, center, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .areas(middle);
    center
}
