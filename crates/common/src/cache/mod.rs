//! Concurrent secret cache
//!
//! [`SecretMap`] holds the most recently fetched secret set. Readers (the
//! filesystem layer) look entries up on every file operation; the refresh
//! driver builds a brand new map per cycle and swaps it in with
//! [`SecretMap::overwrite`].
//!
//! # Architecture
//!
//! - `SecretMap`: name → entry mapping behind a copy-on-write snapshot
//! - `SecretEntry`: a secret plus the time the map stamped it
//! - `Clock`: time source for stamps, swappable in tests

mod clock;
mod entry;
mod secret_map;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::SecretEntry;
pub use secret_map::{SecretMap, Snapshot};
