use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use common::cache::{SecretEntry, SecretMap};
use parking_lot::Mutex;

use super::inode_table::InodeTable;
use super::ownership::Ownership;

const ROOT_PERM: u16 = 0o755;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    RegularFile,
}

/// Attributes of a file or the root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    pub ino: u64,
    pub size: u64,
    pub kind: FileKind,
    /// Permission bits only; see [`FileAttr::mode`] for the full mode
    pub perm: u16,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    /// When the secret was last confirmed current by a refresh
    pub mtime: SystemTime,
    /// When the secret was created on the server
    pub ctime: SystemTime,
}

impl FileAttr {
    /// Permission bits combined with the file type bits
    pub fn mode(&self) -> u32 {
        let kind = match self.kind {
            FileKind::Directory => S_IFDIR,
            FileKind::RegularFile => S_IFREG,
        };
        kind | self.perm as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub ino: u64,
    pub name: String,
    pub kind: FileKind,
}

/// Read-only filesystem view over the live secret map
///
/// Every call reads the map as it is right now; nothing here caches secret
/// data or blocks on a refresh.
#[derive(Debug)]
pub struct SecretFs {
    secrets: Arc<SecretMap>,
    inodes: Mutex<InodeTable>,
    ownership: Ownership,
    attr_ttl: Duration,
}

impl SecretFs {
    pub fn new(secrets: Arc<SecretMap>, ownership: Ownership, attr_ttl: Duration) -> Self {
        Self {
            secrets,
            inodes: Mutex::new(InodeTable::new()),
            ownership,
            attr_ttl,
        }
    }

    /// How long the kernel may cache attributes and lookups
    pub fn attr_ttl(&self) -> Duration {
        self.attr_ttl
    }

    pub fn root_attr(&self) -> FileAttr {
        FileAttr {
            ino: InodeTable::ROOT_INODE,
            size: 0,
            kind: FileKind::Directory,
            perm: ROOT_PERM,
            nlink: 2,
            uid: self.ownership.uid,
            gid: self.ownership.gid,
            mtime: self.secrets.last_modified(),
            ctime: self.secrets.created_at(),
        }
    }

    /// Attributes for a path, `None` if no such secret exists
    pub fn lookup(&self, path: &str) -> Option<FileAttr> {
        let name = InodeTable::normalize(path);
        if name.is_empty() {
            return Some(self.root_attr());
        }

        let entry = self.secrets.get(name)?;
        let ino = self.inodes.lock().get_or_create(name);
        Some(self.file_attr(ino, &entry))
    }

    /// Attributes for an inode handed out by an earlier lookup
    pub fn getattr(&self, ino: u64) -> Option<FileAttr> {
        if ino == InodeTable::ROOT_INODE {
            return Some(self.root_attr());
        }

        let name = self.inodes.lock().get_name(ino)?.to_string();
        let entry = self.secrets.get(&name)?;
        Some(self.file_attr(ino, &entry))
    }

    /// Name of the secret behind an inode
    pub fn name_of(&self, ino: u64) -> Option<String> {
        self.inodes.lock().get_name(ino).map(str::to_string)
    }

    /// Read up to `size` bytes of a secret starting at `offset`
    ///
    /// Reads past the end return an empty buffer. Secrets cached from a
    /// listing without content read empty, and their size is zero to match.
    pub fn read(&self, path: &str, offset: u64, size: u32) -> Option<Bytes> {
        let entry = self.secrets.get(InodeTable::normalize(path))?;
        let content = &entry.secret().content;

        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(content.len());
        let end = start.saturating_add(size as usize).min(content.len());
        Some(content.slice(start..end))
    }

    /// Root directory listing: `.` and `..`, then secrets sorted by name
    pub fn readdir(&self) -> Vec<DirEntry> {
        let names = self.secrets.names();

        let mut entries = Vec::with_capacity(names.len() + 2);
        entries.push(DirEntry {
            ino: InodeTable::ROOT_INODE,
            name: ".".to_string(),
            kind: FileKind::Directory,
        });
        entries.push(DirEntry {
            ino: InodeTable::ROOT_INODE,
            name: "..".to_string(),
            kind: FileKind::Directory,
        });

        let mut inodes = self.inodes.lock();
        for name in names {
            let ino = inodes.get_or_create(&name);
            entries.push(DirEntry {
                ino,
                name,
                kind: FileKind::RegularFile,
            });
        }
        entries
    }

    /// Drop inodes of secrets that are no longer cached
    ///
    /// Meant to run after each refresh; returns how many were dropped.
    pub fn forget_stale(&self) -> usize {
        let snapshot = self.secrets.snapshot();
        let live: HashSet<&str> = snapshot.iter().map(|(name, _)| name).collect();
        let dropped = self.inodes.lock().retain_names(&live);
        if dropped > 0 {
            tracing::debug!("forgot {} stale inodes", dropped);
        }
        dropped
    }

    fn file_attr(&self, ino: u64, entry: &SecretEntry) -> FileAttr {
        let secret = entry.secret();
        let owner = self.ownership.resolve(secret);
        FileAttr {
            ino,
            size: secret.len() as u64,
            kind: FileKind::RegularFile,
            perm: secret.mode_value() as u16,
            nlink: 1,
            uid: owner.uid,
            gid: owner.gid,
            mtime: entry.time(),
            ctime: SystemTime::from(secret.created_at),
        }
    }
}
