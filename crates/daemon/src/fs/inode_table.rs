//! Bidirectional inode ↔ name mapping
//!
//! FUSE identifies files by 64-bit inode numbers. A name keeps its inode
//! for as long as the secret exists, across any number of refreshes.

use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct InodeTable {
    name_to_inode: HashMap<String, u64>,
    inode_to_name: HashMap<u64, String>,
    /// Next available inode number (1 is the root directory)
    next_inode: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// Root inode number (always 1 in FUSE)
    pub const ROOT_INODE: u64 = 1;

    pub fn new() -> Self {
        Self {
            name_to_inode: HashMap::new(),
            inode_to_name: HashMap::new(),
            next_inode: Self::ROOT_INODE + 1,
        }
    }

    /// Get or assign the inode for a secret name
    pub fn get_or_create(&mut self, name: &str) -> u64 {
        if let Some(&inode) = self.name_to_inode.get(name) {
            return inode;
        }

        let inode = self.next_inode;
        self.next_inode += 1;
        self.name_to_inode.insert(name.to_string(), inode);
        self.inode_to_name.insert(inode, name.to_string());
        inode
    }

    pub fn get_inode(&self, name: &str) -> Option<u64> {
        self.name_to_inode.get(name).copied()
    }

    pub fn get_name(&self, inode: u64) -> Option<&str> {
        self.inode_to_name.get(&inode).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.name_to_inode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_inode.is_empty()
    }

    /// Forget every name not in `live`, returning how many were dropped
    ///
    /// Inode numbers are never reused, so a secret that comes back later
    /// gets a fresh one.
    pub fn retain_names(&mut self, live: &HashSet<&str>) -> usize {
        let before = self.name_to_inode.len();
        self.name_to_inode.retain(|name, _| live.contains(name.as_str()));
        let name_to_inode = &self.name_to_inode;
        self.inode_to_name
            .retain(|_, name| name_to_inode.contains_key(name));
        before - self.name_to_inode.len()
    }

    /// Strip slashes so "/foo", "foo" and "foo/" address the same secret
    pub fn normalize(path: &str) -> &str {
        path.trim().trim_matches('/')
    }
}
