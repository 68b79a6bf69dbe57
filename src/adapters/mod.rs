//! Port implementations.
//!
//! `live` talks to the real world, `recording` wraps live adapters and
//! captures their traffic to cassettes, `replaying` serves that traffic
//! back without touching the network or disk.

pub mod live;
pub mod recording;
pub mod replaying;
