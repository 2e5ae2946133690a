//! Display-width helpers shared by the TUI and the text report

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TAB: &str = "    ";

pub fn expand_tabs(s: &str) -> String {
    s.replace('\t', TAB)
}

/// Truncate with an ellipsis or pad with spaces to exactly `width` columns
pub fn truncate_or_pad(s: &str, width: usize) -> String {
    let w = s.width();
    if w <= width {
        let mut out = String::with_capacity(s.len() + width - w);
        out.push_str(s);
        out.push_str(&" ".repeat(width - w));
        return out;
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let cw = c.width().unwrap_or(0);
        if used + cw > width - 1 {
            break;
        }
        out.push(c);
        used += cw;
    }
    out.push('\u{2026}');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}
