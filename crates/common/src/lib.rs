//! Core data structures for secretfs
//!
//! - [`secret`]: the decoded secret record and its JSON decoder
//! - [`cache`]: the concurrent, atomically swappable secret cache

pub mod cache;
pub mod secret;

pub mod prelude {
    pub use crate::cache::{Clock, ManualClock, SecretEntry, SecretMap, Snapshot, SystemClock};
    pub use crate::secret::{parse_secret, parse_secret_list, Secret, SecretError};
}
