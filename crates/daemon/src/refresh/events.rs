//! Refresh notifications
//!
//! Emitted after every cycle so the filesystem layer can drop inodes and
//! kernel cache entries for secrets that went away.

use std::collections::HashSet;

use common::cache::Snapshot;

/// How a refresh changed the set of names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Names present only in the new set
    pub added: Vec<String>,
    /// Names present only in the old set
    pub removed: Vec<String>,
    /// Number of names present in both
    pub retained: usize,
    /// Size of the new set
    pub total: usize,
}

impl RefreshReport {
    pub(crate) fn between(old: &Snapshot, new: &Snapshot) -> Self {
        let old_names: HashSet<&str> = old.iter().map(|(name, _)| name).collect();
        let new_names: HashSet<&str> = new.iter().map(|(name, _)| name).collect();

        let mut added: Vec<String> = new_names
            .difference(&old_names)
            .map(|name| name.to_string())
            .collect();
        let mut removed: Vec<String> = old_names
            .difference(&new_names)
            .map(|name| name.to_string())
            .collect();
        added.sort();
        removed.sort();

        Self {
            added,
            removed,
            retained: old_names.intersection(&new_names).count(),
            total: new.len(),
        }
    }

    /// True when no name appeared or disappeared
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Events emitted by the refresher
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    /// A new secret set is live
    Refreshed { report: RefreshReport },

    /// A cycle failed; the previous set is still live
    Failed { error: String },
}
