//! Filesystem view over the secret cache
//!
//! Turns cache entries into what a FUSE driver needs: inode numbers, file
//! attributes, byte ranges and a directory listing. All secrets live flat in
//! the root directory, one file per secret.
//!
//! # Architecture
//!
//! - `SecretFs`: read-only view over the live `SecretMap`
//! - `InodeTable`: bidirectional inode ↔ secret name mapping
//! - `Ownership`: uid/gid assignment for secret files

mod inode_table;
mod ownership;
mod secret_fs;

pub use inode_table::InodeTable;
pub use ownership::Ownership;
pub use secret_fs::{DirEntry, FileAttr, FileKind, SecretFs};
