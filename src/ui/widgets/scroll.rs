/// Cursor plus viewport offset over a list of `len` rows.
#[derive(Debug, Default, Clone)]
pub struct ScrollState {
    pub cursor: usize,
    pub offset: usize,
    len: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set the row count, clamping cursor and offset into range
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        let last = len.saturating_sub(1);
        self.cursor = self.cursor.min(last);
        self.offset = self.offset.min(last);
    }

    pub fn move_down(&mut self) {
        self.move_down_n(1);
    }

    pub fn move_up(&mut self) {
        self.move_up_n(1);
    }

    pub fn move_down_n(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_add(n).min(self.len.saturating_sub(1));
    }

    pub fn move_up_n(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
    }

    pub fn go_top(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn go_bottom(&mut self) {
        self.cursor = self.len.saturating_sub(1);
    }

    /// Slide the viewport so the cursor is inside `height` rows
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }

    /// Move the cursor to a row relative to the viewport top
    pub fn click_at(&mut self, visible_row: usize) {
        let target = self.offset + visible_row;
        if target < self.len {
            self.cursor = target;
        }
    }

    /// Viewport position for a title, empty when everything fits
    pub fn scroll_percent(&self, height: usize) -> String {
        if self.len <= height {
            return String::new();
        }
        let percent = self.offset * 100 / (self.len - height);
        format!("{}%", percent.min(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_len(len: usize) -> ScrollState {
        let mut s = ScrollState::new();
        s.set_len(len);
        s
    }

    #[test]
    fn movement_stays_in_bounds() {
        let mut s = with_len(3);
        s.move_up();
        assert_eq!(s.cursor, 0);
        s.move_down_n(10);
        assert_eq!(s.cursor, 2);
        s.move_down();
        assert_eq!(s.cursor, 2);
        s.go_top();
        assert_eq!(s.cursor, 0);
        s.go_bottom();
        assert_eq!(s.cursor, 2);
    }

    #[test]
    fn empty_list_keeps_cursor_at_zero() {
        let mut s = with_len(5);
        s.go_bottom();
        s.set_len(0);
        assert_eq!(s.cursor, 0);
        assert!(s.is_empty());
        s.move_down();
        assert_eq!(s.cursor, 0);
    }

    #[test]
    fn shrinking_clamps_cursor() {
        let mut s = with_len(10);
        s.move_down_n(8);
        s.set_len(4);
        assert_eq!(s.cursor, 3);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn viewport_follows_cursor() {
        let mut s = with_len(20);
        s.move_down_n(7);
        s.ensure_visible(5);
        assert_eq!(s.offset, 3);
        s.move_up_n(6);
        s.ensure_visible(5);
        assert_eq!(s.offset, 1);
    }

    #[test]
    fn click_is_relative_to_offset() {
        let mut s = with_len(20);
        s.offset = 4;
        s.click_at(2);
        assert_eq!(s.cursor, 6);
        s.click_at(30);
        assert_eq!(s.cursor, 6);
    }

    #[test]
    fn percent_only_when_overflowing() {
        let mut s = with_len(5);
        assert_eq!(s.scroll_percent(10), "");
        s.set_len(20);
        s.offset = 10;
        assert_eq!(s.scroll_percent(10), "100%");
        s.offset = 5;
        assert_eq!(s.scroll_percent(10), "50%");
    }
}
