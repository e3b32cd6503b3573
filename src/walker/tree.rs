//! Depth-first walker over one directory tree
//!
//! The walker keeps an explicit stack of open directory listings instead of
//! recursing, so deep trees cannot overflow the thread stack. Entry types are
//! taken from the directory listing without following symbolic links, which
//! means symlinked directories are yielded as leaves and cycles are impossible.
//!
//! A directory that cannot be listed ends the walk with an error: silently
//! skipping the subtree would make the comparison look complete when it is not.

use crate::error::TraversalError;
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Lazy, non-restartable iterator over the leaves of a directory tree
pub struct TreeWalker {
    /// Resolved root
    root: PathBuf,

    /// Open directory listings, innermost last
    stack: Vec<(PathBuf, ReadDir)>,

    /// Paths yielded so far
    yielded: u64,

    /// Set after an error; the iterator is fused from then on
    failed: bool,
}

impl TreeWalker {
    /// Resolve `root` and open its listing
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, TraversalError> {
        let root = root.as_ref();
        let root = fs::canonicalize(root).map_err(|source| TraversalError::Root {
            path: root.to_path_buf(),
            source,
        })?;

        let listing = fs::read_dir(&root).map_err(|source| TraversalError::ReadDir {
            path: root.clone(),
            source,
        })?;

        Ok(Self {
            stack: vec![(root.clone(), listing)],
            root,
            yielded: 0,
            failed: false,
        })
    }

    /// The resolved root every yielded path starts with
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of paths yielded so far
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    fn fail(&mut self, err: TraversalError) -> Option<Result<PathBuf, TraversalError>> {
        self.failed = true;
        self.stack.clear();
        Some(Err(err))
    }
}

impl Iterator for TreeWalker {
    type Item = Result<PathBuf, TraversalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let (dir, next) = match self.stack.last_mut() {
                Some((dir, listing)) => (dir.clone(), listing.next()),
                None => return None,
            };

            let entry = match next {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Ok(entry)) => entry,
                Some(Err(source)) => {
                    return self.fail(TraversalError::Entry { path: dir, source });
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(source) => return self.fail(TraversalError::Entry { path, source }),
            };

            if file_type.is_dir() {
                match fs::read_dir(&path) {
                    Ok(listing) => {
                        trace!(path = %path.display(), "Descending");
                        self.stack.push((path, listing));
                        continue;
                    }
                    Err(source) => return self.fail(TraversalError::ReadDir { path, source }),
                }
            }

            self.yielded += 1;
            return Some(Ok(path));
        }
    }
}

impl std::iter::FusedIterator for TreeWalker {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn collect(root: &Path) -> Vec<PathBuf> {
        TreeWalker::new(root)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_yields_files_not_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("top.txt"), b"1").unwrap();
        fs::write(root.join("a/one.txt"), b"2").unwrap();
        fs::write(root.join("a/b/c/deep.txt"), b"3").unwrap();

        let paths = collect(root);
        assert_eq!(paths.len(), 3);

        let canonical = fs::canonicalize(root).unwrap();
        let relative: BTreeSet<_> = paths
            .iter()
            .map(|p| {
                assert!(p.is_absolute());
                assert!(!p.is_dir());
                p.strip_prefix(&canonical).unwrap().to_path_buf()
            })
            .collect();

        let expected: BTreeSet<_> = ["top.txt", "a/one.txt", "a/b/c/deep.txt"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(relative, expected);
    }

    #[test]
    fn test_depth_first_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/x"), b"").unwrap();
        fs::write(root.join("sub/y"), b"").unwrap();

        let mut walker = TreeWalker::new(root).unwrap();
        let first = walker.next().unwrap().unwrap();
        let second = walker.next().unwrap().unwrap();
        assert_eq!(first.parent(), second.parent());
        assert!(walker.next().is_none());
        assert_eq!(walker.yielded(), 2);
    }

    #[test]
    fn test_empty_root() {
        let dir = tempdir().unwrap();
        assert!(collect(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_root() {
        let err = TreeWalker::new("/nonexistent/csum-walker/root").err().unwrap();
        assert!(matches!(err, TraversalError::Root { .. }));
    }

    #[test]
    fn test_directory_removed_before_descent_fails_walk() {
        let dir = tempdir().unwrap();
        for name in ["d1", "d2"] {
            fs::create_dir(dir.path().join(name)).unwrap();
            fs::write(dir.path().join(name).join("f"), b"x").unwrap();
        }

        let mut walker = TreeWalker::new(dir.path()).unwrap();
        let first = walker.next().unwrap().unwrap();

        // The root listing is already read; drop the sibling not yet entered
        let entered = first.parent().unwrap().file_name().unwrap().to_owned();
        let other = if entered == "d1" { "d2" } else { "d1" };
        fs::remove_dir_all(dir.path().join(other)).unwrap();

        let err = walker.find_map(|r| r.err()).unwrap();
        assert!(matches!(
            err,
            TraversalError::ReadDir { .. } | TraversalError::Entry { .. }
        ));
        assert!(walker.next().is_none());
        assert_eq!(walker.yielded(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_a_leaf() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("real")).unwrap();
        fs::write(root.join("real/f"), b"").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("loop")).unwrap();
        std::os::unix::fs::symlink(root, root.join("real/up")).unwrap();

        let paths = collect(root);
        // real/f, real/up, loop
        assert_eq!(paths.len(), 3);
    }
}
