use git2::{DiffOptions, Patch};
use std::path::Path;

use super::CompareError;

/// Build unified diff text for two in-memory buffers using libgit2
pub fn diff_text(
    old: &[u8],
    new: &[u8],
    old_label: &str,
    new_label: &str,
    context_lines: u32,
) -> Result<String, CompareError> {
    let mut opts = DiffOptions::new();
    opts.context_lines(context_lines);

    let mut patch = Patch::from_buffers(
        old,
        Some(Path::new(old_label)),
        new,
        Some(Path::new(new_label)),
        Some(&mut opts),
    )?;

    let mut result = String::new();
    patch.print(&mut |_delta, hunk, line| {
        match line.origin() {
            'F' => {
                // File header
                result.push_str(&format!("--- {}\n+++ {}\n", old_label, new_label));
            }
            'H' => {
                // Hunk header, always with explicit lengths
                if let Some(h) = hunk {
                    result.push_str(&format!(
                        "@@ -{},{} +{},{} @@\n",
                        h.old_start(),
                        h.old_lines(),
                        h.new_start(),
                        h.new_lines()
                    ));
                }
            }
            origin @ ('+' | '-' | ' ') => {
                result.push(origin);
                result.push_str(&String::from_utf8_lossy(line.content()));
                if !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            // End-of-file newline markers
            _ => {}
        }
        true
    })?;

    Ok(result)
}
