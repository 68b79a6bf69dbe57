//! Live adapters talking to the real clock, disk and GitHub.

pub mod clock;
pub mod filesystem;
pub mod host;

pub use clock::LiveClock;
pub use filesystem::LiveFileSystem;
pub use host::GitHubHost;
