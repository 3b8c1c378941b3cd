//! Working-tree walks: directory structure and extension histogram.
//!
//! Both walks prune the `.git` directory before descending into it, so internal metadata is
//! never read.

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::{Component, Path};

use tracing::{debug, error, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::ScribeError;
use crate::snapshot::{FileTree, LanguageHistogram, ROOT_KEY};

/// Directory name of version-control metadata.
pub const VCS_DIR: &str = ".git";

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == VCS_DIR
}

/// Case-insensitive name order, ties broken by raw bytes.
fn compare_names(a: &OsStr, b: &OsStr) -> Ordering {
    let (a, b) = (a.to_string_lossy(), b.to_string_lossy());
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(&b))
}

fn pruned_walk(root: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| compare_names(a.file_name(), b.file_name()))
        .into_iter()
        .filter_entry(|entry| {
            if is_vcs_dir(entry) {
                debug!(path = %entry.path().display(), "Pruning version-control directory");
                false
            } else {
                true
            }
        })
}

fn walk_error(root: &Path, e: walkdir::Error) -> ScribeError {
    let path = e.path().unwrap_or(root).to_path_buf();
    error!(error = %e, path = %path.display(), "Failed to walk repository tree");
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"));
    ScribeError::io(path, source)
}

/// Key used in [`FileTree`] for a directory relative to `root`.
pub fn tree_key(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ROOT_KEY.to_string()
    } else {
        parts.join("/")
    }
}

/// Map every directory under `root` (the root itself as `"/"`) to the files it directly holds.
pub fn walk_file_tree(root: &Path) -> Result<FileTree, ScribeError> {
    let mut tree = FileTree::new();
    for entry in pruned_walk(root) {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.file_type().is_dir() {
            tree.entry(tree_key(root, entry.path())).or_default();
            continue;
        }
        let parent = entry.path().parent().unwrap_or(root);
        tree.entry(tree_key(root, parent))
            .or_default()
            .push(entry.file_name().to_string_lossy().into_owned());
    }
    info!(
        directories = tree.len(),
        files = tree.values().map(Vec::len).sum::<usize>(),
        "[SNAPSHOT] Walked file tree"
    );
    Ok(tree)
}

/// Lowercased extension of a file name including the leading dot, or `None` without one.
pub fn extension_key(file_name: &OsStr) -> Option<String> {
    let ext = Path::new(file_name).extension()?;
    Some(format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Count files per lowercase extension. Files without an extension are not counted.
///
/// `.git` is pruned here too, so hook and pack files never show up in the histogram.
pub fn detect_languages(root: &Path) -> Result<LanguageHistogram, ScribeError> {
    let mut histogram = LanguageHistogram::new();
    for entry in pruned_walk(root) {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Some(ext) = extension_key(entry.file_name()) {
            *histogram.entry(ext).or_insert(0) += 1;
        }
    }
    info!(
        extensions = histogram.len(),
        "[SNAPSHOT] Built language histogram"
    );
    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn extension_key_lowercases_and_skips_dotfiles() {
        assert_eq!(extension_key(OsStr::new("Main.PY")).as_deref(), Some(".py"));
        assert_eq!(extension_key(OsStr::new("archive.tar.gz")).as_deref(), Some(".gz"));
        assert_eq!(extension_key(OsStr::new("README")), None);
        assert_eq!(extension_key(OsStr::new(".bashrc")), None);
    }

    #[test]
    fn tree_key_uses_sentinel_for_root() {
        let root = Path::new("/repo");
        assert_eq!(tree_key(root, root), "/");
        assert_eq!(tree_key(root, &root.join("src").join("bin")), "src/bin");
    }

    #[test]
    fn file_tree_prunes_git_directory() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        fs::write(root.join(".git/objects/pack.idx"), "").unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/lib.rs"), "").unwrap();
        fs::write(root.join("Cargo.toml"), "").unwrap();

        let tree = walk_file_tree(root).unwrap();
        assert_eq!(tree.get("/").unwrap(), &vec!["Cargo.toml".to_string()]);
        assert_eq!(tree.get("src").unwrap(), &vec!["lib.rs".to_string()]);
        assert!(tree.keys().all(|k| !k.contains(".git")));
        assert!(tree.values().flatten().all(|f| f != "HEAD" && f != "pack.idx"));
    }

    #[test]
    fn empty_directories_are_listed() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("docs/empty")).unwrap();
        let tree = walk_file_tree(tmp.path()).unwrap();
        assert_eq!(tree.get("docs/empty"), Some(&Vec::new()));
    }

    #[test]
    fn histogram_never_has_empty_key() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.sample"), "").unwrap();
        fs::write(root.join("a.py"), "").unwrap();
        fs::write(root.join("B.PY"), "").unwrap();
        fs::write(root.join("Makefile"), "").unwrap();
        fs::write(root.join(".env"), "").unwrap();

        let histogram = detect_languages(root).unwrap();
        assert_eq!(histogram.get(".py"), Some(&2));
        assert!(!histogram.contains_key(""));
        assert!(!histogram.contains_key(".sample"));
        assert_eq!(histogram.len(), 1);
    }
}
