//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the comparison core and an
//! external system (time, filesystem, source-control host).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod host;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use host::{CommitInfo, EntryKind, RepoHost, TreeEntry};
