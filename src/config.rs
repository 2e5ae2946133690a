use ratatui::style::{Color, Modifier, Style};
use std::path::PathBuf;

use crate::theme::ThemeMode;

/// Application configuration
pub struct Config {
    pub colors: Colors,
    pub theme: ThemeMode,
    pub view: ViewSettings,
    /// Confine relative pair paths to this directory
    pub base_path: Option<PathBuf>,
    /// Context lines around each hunk
    pub context_lines: u32,
}

/// Initial diff view toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    pub word_wrap: bool,
    pub line_numbers: bool,
    pub unified: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            word_wrap: false,
            line_numbers: true,
            unified: false,
        }
    }
}

pub const DEFAULT_CONTEXT_LINES: u32 = 3;

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Read DIFFIE_* variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Probing the terminal is up to the caller
        let theme = lookup("DIFFIE_THEME")
            .and_then(|v| ThemeMode::parse(&v))
            .unwrap_or_default();

        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| {
                    let parsed = parse_bool(&v);
                    if parsed.is_none() {
                        log::warn!("Ignoring invalid {}={}", key, v);
                    }
                    parsed
                })
                .unwrap_or(default)
        };

        let defaults = ViewSettings::default();
        let view = ViewSettings {
            word_wrap: flag("DIFFIE_WORD_WRAP", defaults.word_wrap),
            line_numbers: flag("DIFFIE_LINE_NUMBERS", defaults.line_numbers),
            unified: defaults.unified,
        };

        let context_lines = lookup("DIFFIE_CONTEXT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_CONTEXT_LINES);

        let base_path = lookup("DIFFIE_BASE_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            colors: Colors::for_theme(theme),
            theme,
            view,
            base_path,
            context_lines,
        }
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
        self.colors = Colors::for_theme(theme);
    }
}

/// Color palette - adapts to theme
pub struct Colors {
    pub added: Color,
    pub removed: Color,
    pub added_bg: Color,
    pub removed_bg: Color,
    pub identical: Color,
    pub error: Color,
    pub header: Color,
    pub muted: Color,
    pub text: Color,
    pub border: Color,
    pub border_focused: Color,
    pub status_bar: Color,
    pub status_bar_text: Color,
}

impl Colors {
    pub fn for_theme(theme: ThemeMode) -> Self {
        match theme {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Dark theme (Catppuccin Mocha inspired)
    pub fn dark() -> Self {
        Self {
            added: Color::Rgb(166, 227, 161),
            removed: Color::Rgb(243, 139, 168),
            added_bg: Color::Rgb(30, 50, 40),
            removed_bg: Color::Rgb(50, 30, 35),
            identical: Color::Rgb(148, 226, 213),
            error: Color::Rgb(250, 179, 135),
            header: Color::Rgb(137, 180, 250),
            muted: Color::Rgb(108, 112, 134),
            text: Color::Rgb(205, 214, 244),
            border: Color::Rgb(69, 71, 90),
            border_focused: Color::Rgb(137, 180, 250),
            status_bar: Color::Rgb(49, 50, 68),
            status_bar_text: Color::Rgb(205, 214, 244),
        }
    }

    /// Light theme (high contrast for light backgrounds)
    pub fn light() -> Self {
        Self {
            added: Color::Rgb(0, 110, 0),
            removed: Color::Rgb(180, 0, 30),
            added_bg: Color::Rgb(210, 245, 210),
            removed_bg: Color::Rgb(255, 215, 220),
            identical: Color::Rgb(0, 100, 110),
            error: Color::Rgb(160, 80, 0),
            header: Color::Rgb(0, 60, 180),
            muted: Color::Rgb(60, 60, 70),
            text: Color::Rgb(10, 10, 15),
            border: Color::Rgb(150, 155, 170),
            border_focused: Color::Rgb(0, 60, 180),
            status_bar: Color::Rgb(220, 225, 235),
            status_bar_text: Color::Rgb(10, 10, 15),
        }
    }

    pub fn style_added(&self) -> Style {
        Style::default().fg(self.added)
    }

    pub fn style_removed(&self) -> Style {
        Style::default().fg(self.removed)
    }

    pub fn style_identical(&self) -> Style {
        Style::default().fg(self.identical)
    }

    pub fn style_error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn style_text(&self) -> Style {
        Style::reset().fg(self.text)
    }

    pub fn style_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn style_header(&self) -> Style {
        Style::default().fg(self.header).add_modifier(Modifier::BOLD)
    }

    pub fn style_selected(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn style_status_bar(&self) -> Style {
        Style::default().bg(self.status_bar).fg(self.status_bar_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn env_overrides_view_settings() {
        let config = config_with(&[
            ("DIFFIE_THEME", "light"),
            ("DIFFIE_WORD_WRAP", "true"),
            ("DIFFIE_LINE_NUMBERS", "off"),
            ("DIFFIE_CONTEXT", "7"),
            ("DIFFIE_BASE_PATH", "/srv/files"),
        ]);
        assert_eq!(config.theme, ThemeMode::Light);
        assert!(config.view.word_wrap);
        assert!(!config.view.line_numbers);
        assert_eq!(config.context_lines, 7);
        assert_eq!(config.base_path, Some(PathBuf::from("/srv/files")));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_with(&[
            ("DIFFIE_THEME", "dark"),
            ("DIFFIE_WORD_WRAP", "maybe"),
            ("DIFFIE_CONTEXT", "lots"),
            ("DIFFIE_BASE_PATH", ""),
        ]);
        assert_eq!(config.view, ViewSettings::default());
        assert_eq!(config.context_lines, DEFAULT_CONTEXT_LINES);
        assert_eq!(config.base_path, None);
    }

    #[test]
    fn set_theme_swaps_palette() {
        let mut config = config_with(&[("DIFFIE_THEME", "dark")]);
        config.set_theme(ThemeMode::Light);
        assert_eq!(config.colors.text, Colors::light().text);
    }
}
