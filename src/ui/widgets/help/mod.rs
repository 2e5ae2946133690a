use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::config::Colors;

/// Help modal widget
pub struct HelpModal<'a> {
    colors: &'a Colors,
}

impl<'a> HelpModal<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self { colors }
    }

    fn section(&self, title: &'static str, bindings: &[(&'static str, &'static str)]) -> Vec<Line<'a>> {
        let mut lines = vec![Line::from(Span::styled(title, self.colors.style_header()))];
        lines.extend(
            bindings
                .iter()
                .map(|(key, desc)| format_binding(key, desc, self.colors)),
        );
        lines.push(Line::from(""));
        lines
    }
}

impl<'a> Widget for HelpModal<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(true))
            .title(Span::styled("diffie - keys", self.colors.style_header()))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let mut help_text = vec![Line::from("")];
        help_text.extend(self.section(
            "Navigation",
            &[
                ("j/k", "Move up/down"),
                ("J/K", "Move fast (5 lines)"),
                ("Ctrl-d/u", "Page down/up"),
                ("g/G", "Jump to top/bottom"),
                ("Tab", "Switch between pairs and diff"),
                ("Enter", "Open selected pair"),
                ("Esc", "Back to pair list"),
            ],
        ));
        help_text.extend(self.section(
            "Diff View",
            &[
                ("]/[", "Next/previous change"),
                ("s", "Toggle split/unified view"),
                ("w", "Toggle word wrap"),
                ("n", "Toggle line numbers"),
                ("R", "Toggle raw (whole files)"),
            ],
        ));
        help_text.extend(self.section(
            "Actions",
            &[
                ("f", "Cycle filter: all/changed/identical"),
                ("o", "Open left file in $EDITOR"),
                ("y", "Copy file:line to clipboard"),
                ("r", "Compare again"),
                ("q", "Quit"),
            ],
        ));
        help_text.push(Line::from(Span::styled(
            "Press ? or Esc to close",
            self.colors.style_muted(),
        )));

        Paragraph::new(help_text)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

fn format_binding<'a>(key: &'a str, desc: &'a str, colors: &Colors) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:>12}", key), colors.style_header()),
        Span::raw("  "),
        Span::styled(desc, colors.style_text()),
    ])
}
