//! Per-entry comparison outcomes

use crate::error::FileError;
use std::fmt;
use std::fs::FileType;
use std::path::{Path, PathBuf};

/// The pair of paths one walker entry maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPaths {
    /// Path under the old root, as yielded by the walker
    pub old: PathBuf,

    /// Same relative path under the new root
    pub new: PathBuf,

    /// Relative path, used as the key in the stats file
    pub relative: String,
}

impl EntryPaths {
    /// Pair `relative` (a path under both roots) with its two absolute paths
    pub fn new(old_root: &Path, new_root: &Path, relative: &Path) -> Self {
        Self {
            old: old_root.join(relative),
            new: new_root.join(relative),
            relative: path_key(relative),
        }
    }
}

/// Render a path as a stats-file key without losing bytes
///
/// Valid UTF-8 is kept as is, except that `\` is doubled. Bytes that are not
/// UTF-8 become `\xNN`, so two distinct paths never share a key.
pub fn path_key(path: &Path) -> String {
    #[cfg(unix)]
    {
        use std::fmt::Write;
        use std::os::unix::ffi::OsStrExt;

        let mut key = String::new();
        for chunk in path.as_os_str().as_bytes().utf8_chunks() {
            key.push_str(&chunk.valid().replace('\\', "\\\\"));
            for b in chunk.invalid() {
                let _ = write!(key, "\\x{b:02x}");
            }
        }
        key
    }

    #[cfg(not(unix))]
    {
        path.to_string_lossy().into_owned()
    }
}

/// Outcome of comparing one entry
#[derive(Debug)]
pub enum ComparisonResult {
    /// Digests match (and bytes, when verification is on)
    Identical,

    /// Digests differ
    Different {
        old_digest: String,
        new_digest: String,
        /// Byte verification ran and disagreed as well
        verify_mismatch: bool,
    },

    /// Digests match but byte verification found a difference
    VerifyMismatch,

    /// Not compared: one side is not a regular file
    Skipped(SkipReason),

    /// Not compared: a per-file error occurred
    Errored(FileError),
}

/// Why an entry was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The old entry disappeared after it was listed
    OldMissing,

    /// The old entry is not a regular file
    OldNotRegular(EntryKind),

    /// Nothing exists at the relative path under the new root
    NewMissing,

    /// The new entry exists but is not a regular file
    NewNotRegular(EntryKind),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OldMissing => f.write_str("old entry vanished"),
            SkipReason::OldNotRegular(kind) => write!(f, "old entry is a {}", kind),
            SkipReason::NewMissing => f.write_str("no counterpart in new root"),
            SkipReason::NewNotRegular(kind) => write!(f, "new entry is a {}", kind),
        }
    }
}

/// Type of a filesystem entry, without following symbolic links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl EntryKind {
    /// Classify a `std::fs::FileType`
    pub fn from_file_type(ft: FileType) -> Self {
        if ft.is_file() {
            return EntryKind::File;
        }
        if ft.is_dir() {
            return EntryKind::Directory;
        }
        if ft.is_symlink() {
            return EntryKind::Symlink;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return EntryKind::BlockDevice;
            }
            if ft.is_char_device() {
                return EntryKind::CharDevice;
            }
            if ft.is_fifo() {
                return EntryKind::Fifo;
            }
            if ft.is_socket() {
                return EntryKind::Socket;
            }
        }

        EntryKind::Unknown
    }

    /// Check if this is a regular file
    pub fn is_file(&self) -> bool {
        *self == EntryKind::File
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::File => "regular file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symbolic link",
            EntryKind::BlockDevice => "block device",
            EntryKind::CharDevice => "character device",
            EntryKind::Fifo => "fifo",
            EntryKind::Socket => "socket",
            EntryKind::Unknown => "special file",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_paths_share_relative_part() {
        let paths = EntryPaths::new(Path::new("/old"), Path::new("/new"), Path::new("d/f.txt"));
        assert_eq!(paths.old, PathBuf::from("/old/d/f.txt"));
        assert_eq!(paths.new, PathBuf::from("/new/d/f.txt"));
        assert_eq!(paths.relative, "d/f.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_path_key_is_lossless() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let ff = Path::new(OsStr::from_bytes(b"d/\xff"));
        let fe = Path::new(OsStr::from_bytes(b"d/\xfe"));
        assert_eq!(path_key(ff), "d/\\xff");
        assert_ne!(path_key(ff), path_key(fe));

        // A UTF-8 name spelling out the escape stays distinct
        assert_eq!(path_key(Path::new("d/\\xff")), "d/\\\\xff");
        assert_eq!(path_key(Path::new("plain/name")), "plain/name");
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::OldNotRegular(EntryKind::Symlink);
        assert_eq!(reason.to_string(), "old entry is a symbolic link");
        assert_eq!(SkipReason::NewMissing.to_string(), "no counterpart in new root");
    }
}
