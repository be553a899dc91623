//! Refresh driver
//!
//! Periodically pulls the complete secret set from a [`SecretSource`],
//! builds a brand new [`SecretMap`] from it and swaps it into the live map
//! with a single overwrite. A failed cycle leaves the live map exactly as
//! it was, so the filesystem keeps serving the last good set.
//!
//! [`SecretSource`]: crate::source::SecretSource
//! [`SecretMap`]: common::cache::SecretMap

mod events;
mod refresher;

pub use events::{RefreshEvent, RefreshReport};
pub use refresher::{RefreshConfig, RefreshError, RefreshHandle, Refresher};
