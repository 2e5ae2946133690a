//! Unified diff parsing
//!
//! Walks diff text line by line and produces `DiffLine` records with
//! 1-based line numbers for both files. Never fails: malformed input
//! degrades to fewer or oddly numbered lines, empty input to no lines.

/// Kind of a parsed diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Addition,
    Deletion,
}

/// One content line from a hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line number in the first file (Context and Deletion)
    pub left_num: Option<usize>,
    /// Line number in the second file (Context and Addition)
    pub right_num: Option<usize>,
    /// Content with the leading marker stripped
    pub text: String,
    /// Ordinal of the hunk this line belongs to
    pub hunk: usize,
    /// An unrecognized line (`\ No newline at end of file`) sat between this
    /// line and the previous one in the same hunk
    pub breaks_run: bool,
}

impl DiffLine {
    pub fn context(left: usize, right: usize, text: impl Into<String>, hunk: usize) -> Self {
        Self {
            kind: LineKind::Context,
            left_num: Some(left),
            right_num: Some(right),
            text: text.into(),
            hunk,
            breaks_run: false,
        }
    }

    pub fn deletion(left: usize, text: impl Into<String>, hunk: usize) -> Self {
        Self {
            kind: LineKind::Deletion,
            left_num: Some(left),
            right_num: None,
            text: text.into(),
            hunk,
            breaks_run: false,
        }
    }

    pub fn addition(right: usize, text: impl Into<String>, hunk: usize) -> Self {
        Self {
            kind: LineKind::Addition,
            left_num: None,
            right_num: Some(right),
            text: text.into(),
            hunk,
            breaks_run: false,
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind != LineKind::Context
    }

    fn breaking_run(mut self, breaks: bool) -> Self {
        self.breaks_run = breaks;
        self
    }
}

/// Parsed `@@ -old_start,old_lines +new_start,new_lines @@` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
}

impl HunkHeader {
    /// Parse a hunk header. Lengths may be omitted (`@@ -3 +3 @@`), in which
    /// case they default to 1. Trailing section text after the closing `@@`
    /// is allowed.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("@@ -")?;
        let (old, rest) = rest.split_once(" +")?;
        let (new, _) = rest.split_once(" @@")?;

        let (old_start, old_lines) = parse_range(old)?;
        let (new_start, new_lines) = parse_range(new)?;

        Some(Self {
            old_start,
            old_lines,
            new_start,
            new_lines,
        })
    }
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    let (start, len) = match range.split_once(',') {
        Some((start, len)) => (start, Some(len)),
        None => (range, None),
    };
    let start = parse_digits(start)?;
    let len = match len {
        Some(len) => parse_digits(len)?,
        None => 1,
    };
    Some((start, len))
}

fn parse_digits(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Check if content appears to be binary
pub fn is_binary(content: &str) -> bool {
    // Check first ~8KB for null bytes, but ensure we don't slice mid-character
    content.chars().take(8192).any(|c| c == '\0')
}

/// Configurable unified diff parser
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    suppress_filename_hunk: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            suppress_filename_hunk: true,
        }
    }

    /// Drop a leading `-name`/`+name` hunk produced when a diff library is
    /// asked to diff two files under blank names.
    pub fn suppress_filename_hunk(mut self, suppress: bool) -> Self {
        self.suppress_filename_hunk = suppress;
        self
    }

    pub fn parse(&self, content: &str) -> Vec<DiffLine> {
        let lines: Vec<&str> = content.split('\n').collect();
        let skip_first_hunk = self.suppress_filename_hunk && has_filename_hunk(&lines);

        let mut out = Vec::new();
        // Everything before the first hunk marker is preamble: `diff`, `index`,
        // `---`/`+++` and git's extended headers (`new file mode`, `rename from`)
        let mut in_header = true;
        let mut left = 0usize;
        let mut right = 0usize;
        // Hunks seen so far; the current hunk ordinal is `hunks - 1`
        let mut hunks = 0usize;
        let mut skipping = false;
        let mut pending_break = false;

        for line in lines {
            if line.starts_with("@@") {
                in_header = false;
                pending_break = false;
                hunks += 1;
                skipping = skip_first_hunk && hunks == 1;
                if skipping {
                    log::debug!("Suppressing filename-only first hunk: {}", line);
                    continue;
                }
                match HunkHeader::parse(line) {
                    Some(header) => {
                        left = header.old_start.saturating_sub(1);
                        right = header.new_start.saturating_sub(1);
                    }
                    None => {
                        log::debug!("Malformed hunk header, keeping counters: {}", line);
                    }
                }
                continue;
            }

            if in_header || skipping {
                continue;
            }

            let hunk = hunks - 1;
            let parsed = if let Some(text) = line.strip_prefix('-') {
                left += 1;
                DiffLine::deletion(left, text, hunk)
            } else if let Some(text) = line.strip_prefix('+') {
                right += 1;
                DiffLine::addition(right, text, hunk)
            } else if let Some(text) = line.strip_prefix(' ') {
                left += 1;
                right += 1;
                DiffLine::context(left, right, text, hunk)
            } else {
                pending_break = true;
                continue;
            };
            out.push(parsed.breaking_run(std::mem::take(&mut pending_break)));
        }

        out
    }
}

/// Parse a unified diff into DiffLines, suppressing a filename-only first hunk
pub fn parse_diff(content: &str) -> Vec<DiffLine> {
    Parser::new().parse(content)
}

/// Inspect the three lines after the first hunk header: one deletion, one
/// addition, then end of input or another hunk.
fn has_filename_hunk(lines: &[&str]) -> bool {
    let Some(pos) = lines.iter().position(|l| l.starts_with("@@")) else {
        return false;
    };
    let at = |i: usize| lines.get(pos + i).copied().unwrap_or("");
    at(1).starts_with('-') && at(2).starts_with('+') && (at(3).starts_with("@@") || at(3).is_empty())
}
