//! Sources of file pairs: CLI arguments, JSON files, directory walks

use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::FilePair;

/// Parse a `file1,file2` argument
pub fn pair_from_arg(index: usize, arg: &str) -> Result<FilePair> {
    let (file1, file2) = arg
        .split_once(',')
        .with_context(|| format!("Expected FILE1,FILE2 but got: {}", arg))?;
    let (file1, file2) = (file1.trim(), file2.trim());
    if file1.is_empty() || file2.is_empty() {
        bail!("Both file paths are required: {}", arg);
    }
    Ok(FilePair::new(index, file1, file2))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PairsFile {
    List(Vec<FilePair>),
    Wrapped {
        #[serde(rename = "filePairs")]
        file_pairs: Vec<FilePair>,
    },
}

/// Parse pairs from JSON: either a list of `{file1, file2}` objects or an
/// object with a `filePairs` list. Indices are reassigned in file order.
pub fn parse_pairs_json(json: &str) -> Result<Vec<FilePair>> {
    let parsed: PairsFile = serde_json::from_str(json).context("Invalid pairs file")?;
    let pairs = match parsed {
        PairsFile::List(pairs) | PairsFile::Wrapped { file_pairs: pairs } => pairs,
    };
    Ok(pairs
        .into_iter()
        .enumerate()
        .map(|(i, p)| FilePair { index: i, ..p })
        .collect())
}

pub fn load_pairs_file(path: &Path) -> Result<Vec<FilePair>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pairs file: {}", path.display()))?;
    parse_pairs_json(&json)
}

/// Files under `root`, relative to it. Honors .gitignore.
fn relative_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }
    let mut files = BTreeSet::new();
    for entry in WalkBuilder::new(root).hidden(false).build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if entry.file_type().is_some_and(|t| t.is_file()) {
            if let Ok(rel) = entry.path().strip_prefix(root) {
                // .git internals are not part of either tree
                if rel.components().next().is_some_and(|c| c.as_os_str() == ".git") {
                    continue;
                }
                files.insert(rel.to_path_buf());
            }
        }
    }
    Ok(files)
}

/// Pair files in two directory trees by relative path. A file present on
/// one side only is still paired so its absence is reported.
pub fn pairs_from_dirs(left: &Path, right: &Path) -> Result<Vec<FilePair>> {
    let mut all = relative_files(left)?;
    all.extend(relative_files(right)?);

    Ok(all
        .into_iter()
        .enumerate()
        .map(|(i, rel)| FilePair::new(i, left.join(&rel), right.join(&rel)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn pair_from_arg_splits_on_comma() {
        let pair = pair_from_arg(2, "sample1.txt, lorem/ipsum.txt").unwrap();
        assert_eq!(pair, FilePair::new(2, "sample1.txt", "lorem/ipsum.txt"));
        assert!(pair_from_arg(0, "only-one").is_err());
        assert!(pair_from_arg(0, "a,").is_err());
    }

    #[test]
    fn pairs_json_list_and_wrapped() {
        let list = r#"[{"file1": "a", "file2": "b", "index": 7}, {"file1": "c", "file2": "d"}]"#;
        let pairs = parse_pairs_json(list).unwrap();
        assert_eq!(pairs, vec![FilePair::new(0, "a", "b"), FilePair::new(1, "c", "d")]);

        let wrapped = r#"{"filePairs": [{"file1": "x", "file2": "y"}]}"#;
        assert_eq!(parse_pairs_json(wrapped).unwrap(), vec![FilePair::new(0, "x", "y")]);

        assert!(parse_pairs_json("{}").is_err());
    }

    #[test]
    fn dirs_are_paired_by_relative_path() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        fs::create_dir_all(left.path().join("sub")).unwrap();
        fs::create_dir_all(right.path().join("sub")).unwrap();
        fs::write(left.path().join("a.txt"), "a").unwrap();
        fs::write(right.path().join("a.txt"), "a").unwrap();
        fs::write(left.path().join("sub/only_left.txt"), "x").unwrap();
        fs::write(right.path().join("sub/only_right.txt"), "y").unwrap();

        let pairs = pairs_from_dirs(left.path(), right.path()).unwrap();
        let rels: Vec<_> = pairs
            .iter()
            .map(|p| p.file1.strip_prefix(left.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rels,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("sub/only_left.txt"),
                PathBuf::from("sub/only_right.txt"),
            ]
        );
        assert_eq!(pairs[2].index, 2);
        assert_eq!(pairs[2].file2, right.path().join("sub/only_right.txt"));
    }

    #[test]
    fn dirs_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pairs_from_dirs(&dir.path().join("nope"), dir.path()).is_err());
    }
}
