//! Local filesystem tree walker
//!
//! Enumerates every non-directory entry under a root, depth-first, as
//! absolute paths. Directories are expanded in place and never yielded.
//!
//! ```text
//!   root/
//!   ├── a.txt          -> yielded
//!   ├── sub/           -> expanded
//!   │   └── b.txt      -> yielded
//!   └── link -> sub    -> yielded as a leaf (not followed)
//! ```

pub mod tree;

pub use tree::TreeWalker;
