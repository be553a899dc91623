// Refresh driver and filesystem view
pub mod config;
pub mod fs;
pub mod logging;
pub mod refresh;
pub mod source;

pub use config::{Config, ConfigError};
pub use fs::{FileAttr, Ownership, SecretFs};
pub use refresh::{RefreshConfig, RefreshEvent, RefreshHandle, RefreshReport, Refresher};
pub use source::{FileSource, MemorySource, SecretSource, SourceError};
