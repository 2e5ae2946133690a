use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;
use std::path::Path;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::theme::ThemeMode;

/// Styled fragments of one source line
pub type StyledLine = Vec<(String, Style)>;

/// Highlighted lines keyed by 1-based line number
pub type HighlightMap = HashMap<usize, StyledLine>;

const THEME_NAME: &str = "base16-eighties.dark";

/// Syntax highlighter using syntect
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
    theme_mode: ThemeMode,
}

impl Highlighter {
    pub fn for_theme(mode: ThemeMode) -> Self {
        // One dark theme for both modes; light mode darkens the colors
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(THEME_NAME)
            .or_else(|| themes.into_values().next());
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            theme_mode: mode,
        }
    }

    fn syntax_for(&self, path: &Path, first_line: &str) -> &SyntaxReference {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mapped = match extension.as_str() {
            // No TypeScript grammar in the default set
            "ts" | "tsx" | "mts" | "cts" | "jsx" | "mjs" | "cjs" => "js",
            "yml" => "yaml",
            "markdown" => "md",
            ext => ext,
        };

        self.syntax_set
            .find_syntax_by_extension(mapped)
            .or_else(|| self.syntax_set.find_syntax_by_extension(&extension))
            .or_else(|| self.syntax_set.find_syntax_by_first_line(first_line))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight a whole file. Highlighting the file rather than diff
    /// fragments keeps multi-line constructs (strings, comments) correct.
    pub fn highlight(&self, content: &str, path: &Path) -> HighlightMap {
        let Some(theme) = &self.theme else {
            return HighlightMap::new();
        };
        let syntax = self.syntax_for(path, content.lines().next().unwrap_or(""));
        let mut highlighter = HighlightLines::new(syntax, theme);
        let is_light = self.theme_mode == ThemeMode::Light;

        let mut result = HighlightMap::new();
        for (idx, line) in content.lines().enumerate() {
            let ranges = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(r) => r,
                Err(e) => {
                    log::debug!("Highlighting stopped at {}:{}: {}", path.display(), idx + 1, e);
                    break;
                }
            };
            let styled = ranges
                .into_iter()
                .map(|(style, text)| (text.to_string(), convert_style(&style, is_light)))
                .collect();
            result.insert(idx + 1, styled);
        }
        result
    }
}

/// Foreground and font style only; diff backgrounds are applied on top
fn convert_style(style: &syntect::highlighting::Style, is_light: bool) -> Style {
    let fg = if is_light {
        darken(style.foreground)
    } else {
        Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b)
    };

    let mut out = Style::reset().fg(fg);
    for (font, modifier) in [
        (FontStyle::BOLD, Modifier::BOLD),
        (FontStyle::ITALIC, Modifier::ITALIC),
        (FontStyle::UNDERLINE, Modifier::UNDERLINED),
    ] {
        if style.font_style.contains(font) {
            out = out.add_modifier(modifier);
        }
    }
    out
}

/// Bright colors meant for dark backgrounds become readable on light ones
fn darken(color: syntect::highlighting::Color) -> Color {
    let lum = (0.299 * f32::from(color.r) + 0.587 * f32::from(color.g) + 0.114 * f32::from(color.b)) / 255.0;
    if lum > 0.5 {
        let scale = |c: u8| (f32::from(c) * 0.35) as u8;
        Color::Rgb(scale(color.r), scale(color.g), scale(color.b))
    } else {
        Color::Rgb(color.r, color.g, color.b)
    }
}
