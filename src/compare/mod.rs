//! Tree comparison
//!
//! # Architecture
//!
//! ```text
//!   TreeWalker (old root)
//!        │ one path at a time
//!        ▼
//!   Comparator ──────────────▶ RunStats ──every N entries──▶ StatsWriter
//!        │  ▲                                                 (JSON file)
//!  submit│  │wait both
//!        ▼  │
//!   DigestPool: digest(old) ∥ digest(new)
//!        │
//!        └─▶ optional byte verification
//! ```

pub mod driver;
pub mod outcome;
pub mod pool;

pub use driver::{CompareReport, Comparator};
pub use outcome::{ComparisonResult, EntryKind, EntryPaths, SkipReason};
pub use pool::{DigestPool, PendingDigest};
