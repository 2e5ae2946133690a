//! Terminal theme detection
//!
//! Picks a light or dark palette. Checked in order:
//! 1. DIFFIE_THEME (explicit override)
//! 2. OSC 11 background color query
//! 3. COLORFGBG
//! 4. Terminal profile hints (iTerm2, Kitty, VS Code)

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn detect() -> Self {
        std::env::var("DIFFIE_THEME")
            .ok()
            .and_then(|v| Self::parse(&v))
            .or_else(query_background)
            .or_else(|| std::env::var("COLORFGBG").ok().and_then(|v| from_colorfgbg(&v)))
            .or_else(from_profile_hints)
            .unwrap_or_default()
    }

    fn from_luminance(r: u8, g: u8, b: u8) -> Self {
        // ITU-R BT.709
        let luminance = 0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b);
        if luminance > 128.0 {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

/// `fg;bg` or `fg;default;bg`; ANSI 7 and 9+ are light backgrounds
fn from_colorfgbg(value: &str) -> Option<ThemeMode> {
    let bg: u8 = value.rsplit(';').next()?.parse().ok()?;
    (bg == 7 || bg > 8).then_some(ThemeMode::Light)
}

fn from_profile_hints() -> Option<ThemeMode> {
    ["ITERM_PROFILE", "KITTY_THEME", "VSCODE_TERMINAL_THEME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|name| {
            let name = name.to_lowercase();
            if name.contains("light") {
                Some(ThemeMode::Light)
            } else if name.contains("dark") {
                Some(ThemeMode::Dark)
            } else {
                None
            }
        })
}

/// Extract the background color from `ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL`.
/// Components may be 2 or 4 hex digits.
fn parse_osc11(response: &str) -> Option<ThemeMode> {
    let start = response.find("rgb:")? + 4;
    let rest = &response[start..];
    let end = rest.find(['\x07', '\x1b']).unwrap_or(rest.len());

    let mut channels = rest[..end].split('/').map(|part| {
        let value = u16::from_str_radix(part, 16).ok()?;
        Some(if part.len() > 2 { (value >> 8) as u8 } else { value as u8 })
    });
    let r = channels.next()??;
    let g = channels.next()??;
    let b = channels.next()??;
    if channels.next().is_some() {
        return None;
    }
    Some(ThemeMode::from_luminance(r, g, b))
}

#[cfg(unix)]
fn query_background() -> Option<ThemeMode> {
    use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, LocalFlags, SetArg};
    use std::io::{IsTerminal, Write};

    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return None;
    }

    let saved = tcgetattr(&stdin).ok()?;
    let mut raw = saved.clone();
    cfmakeraw(&mut raw);
    raw.local_flags.insert(LocalFlags::ISIG);
    tcsetattr(&stdin, SetArg::TCSANOW, &raw).ok()?;

    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x1b]11;?\x07");
    let _ = stdout.flush();
    let response = read_reply(&stdin, Duration::from_millis(300));

    let _ = tcsetattr(&stdin, SetArg::TCSANOW, &saved);
    parse_osc11(&response)
}

#[cfg(not(unix))]
fn query_background() -> Option<ThemeMode> {
    None
}

/// Read until BEL or ST, or until `timeout` passes
#[cfg(unix)]
fn read_reply(stdin: &std::io::Stdin, timeout: Duration) -> String {
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
    use std::io::Read;
    use std::os::fd::AsFd;
    use std::time::Instant;

    let deadline = Instant::now() + timeout;
    let mut reply = Vec::new();
    let mut byte = [0u8; 1];
    let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let ms = remaining.as_millis().min(u128::from(u16::MAX)) as u16;
        if poll(&mut fds, PollTimeout::from(ms)).unwrap_or(0) == 0 {
            break;
        }
        if std::io::stdin().read(&mut byte).unwrap_or(0) != 1 {
            continue;
        }
        reply.push(byte[0]);
        if byte[0] == 0x07 || reply.ends_with(b"\x1b\\") {
            break;
        }
    }

    String::from_utf8_lossy(&reply).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc11_four_digit_components() {
        assert_eq!(parse_osc11("\x1b]11;rgb:ffff/ffff/ffff\x07"), Some(ThemeMode::Light));
        assert_eq!(parse_osc11("\x1b]11;rgb:0000/0000/0000\x1b\\"), Some(ThemeMode::Dark));
    }

    #[test]
    fn osc11_two_digit_components() {
        assert_eq!(parse_osc11("\x1b]11;rgb:ee/ee/e0\x07"), Some(ThemeMode::Light));
        assert_eq!(parse_osc11("\x1b]11;rgb:1e/1e/2e\x07"), Some(ThemeMode::Dark));
    }

    #[test]
    fn osc11_garbage() {
        assert_eq!(parse_osc11(""), None);
        assert_eq!(parse_osc11("rgb:ff/ff"), None);
        assert_eq!(parse_osc11("rgb:zz/ff/ff"), None);
    }

    #[test]
    fn colorfgbg_light_backgrounds() {
        assert_eq!(from_colorfgbg("0;15"), Some(ThemeMode::Light));
        assert_eq!(from_colorfgbg("0;default;7"), Some(ThemeMode::Light));
        assert_eq!(from_colorfgbg("15;0"), None);
        assert_eq!(from_colorfgbg("nonsense"), None);
    }

    #[test]
    fn parse_theme_names() {
        assert_eq!(ThemeMode::parse(" Light "), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::parse("dark"), Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::parse("solarized"), None);
    }
}
