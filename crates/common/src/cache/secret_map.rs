//! Name → entry mapping with atomic wholesale replacement
//!
//! The mapping lives behind an `Arc` that is only ever swapped or cloned
//! on write, never edited while shared. Readers grab the current `Arc`
//! under a short read lock and work on that immutable snapshot, so a
//! reader sees either the whole set from before an [`SecretMap::overwrite`]
//! or the whole set from after it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

use super::clock::{Clock, SystemClock};
use super::entry::SecretEntry;
use crate::secret::Secret;

type Entries = HashMap<String, SecretEntry>;

/// Smallest step between two stamps issued by the same map.
/// Microseconds survive every platform's `SystemTime` resolution.
const STAMP_STEP: Duration = Duration::from_micros(1);

#[derive(Debug)]
struct State {
    entries: Arc<Entries>,
    /// Latest stamp issued or adopted by this map
    high_water: SystemTime,
}

/// Concurrent cache of secrets keyed by name
pub struct SecretMap {
    state: RwLock<State>,
    clock: Arc<dyn Clock>,
    created_at: SystemTime,
}

impl Default for SecretMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretMap {
    /// Create an empty map stamping entries with the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty map stamping entries with the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let created_at = clock.now();
        Self::with_clock_after(clock, created_at)
    }

    /// Create an empty map whose stamps all come after `floor`
    ///
    /// Donor maps built this way from the live map's
    /// [`last_modified`](SecretMap::last_modified) keep per-name stamps
    /// increasing across overwrites, whatever the clock does.
    pub fn with_clock_after(clock: Arc<dyn Clock>, floor: SystemTime) -> Self {
        let created_at = clock.now();
        Self {
            state: RwLock::new(State {
                entries: Arc::new(HashMap::new()),
                high_water: created_at.max(floor),
            }),
            clock,
            created_at,
        }
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Latest stamp this map has issued or adopted
    ///
    /// Moves forward on every write, which makes it usable as the mtime of
    /// the directory holding the secrets.
    pub fn last_modified(&self) -> SystemTime {
        self.state.read().high_water
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an entry by name
    pub fn get(&self, name: &str) -> Option<SecretEntry> {
        self.state.read().entries.get(name).cloned()
    }

    /// All current entries, in no particular order
    pub fn values(&self) -> Vec<SecretEntry> {
        self.snapshot().values()
    }

    /// All current names, sorted
    pub fn names(&self) -> Vec<String> {
        self.snapshot().names()
    }

    /// Immutable view of the current mapping
    ///
    /// Later writes to the map are not reflected in the snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Arc::clone(&self.state.read().entries))
    }

    /// Insert or replace the entry for `name`, stamping it now
    pub fn put(&self, name: impl Into<String>, secret: Secret) {
        let mut state = self.state.write();
        let entry = SecretEntry::new(secret, self.next_stamp(&mut state));
        Arc::make_mut(&mut state.entries).insert(name.into(), entry);
    }

    /// Insert the entry for `name` only if there is none
    ///
    /// Returns whether the secret was inserted. An existing entry keeps
    /// both its secret and its stamp.
    pub fn put_if_absent(&self, name: impl Into<String>, secret: Secret) -> bool {
        let name = name.into();
        let mut state = self.state.write();
        if state.entries.contains_key(&name) {
            return false;
        }

        let entry = SecretEntry::new(secret, self.next_stamp(&mut state));
        Arc::make_mut(&mut state.entries).insert(name, entry);
        true
    }

    /// Drop the entry for `name`, returning it if present
    ///
    /// The refresh path never needs this; stale names disappear through
    /// [`SecretMap::overwrite`].
    pub fn remove(&self, name: &str) -> Option<SecretEntry> {
        let mut state = self.state.write();
        if !state.entries.contains_key(name) {
            return None;
        }

        self.next_stamp(&mut state);
        Arc::make_mut(&mut state.entries).remove(name)
    }

    /// Replace the whole mapping with the donor's current mapping
    ///
    /// Entries are adopted as-is, stamps included. The donor is read once,
    /// so later writes to it do not leak into this map.
    pub fn overwrite(&self, donor: &SecretMap) {
        if std::ptr::eq(self, donor) {
            return;
        }

        let (entries, donor_high_water) = {
            let donor = donor.state.read();
            (Arc::clone(&donor.entries), donor.high_water)
        };

        let mut state = self.state.write();
        let previous = state.entries.len();
        state.entries = entries;
        state.high_water = state.high_water.max(donor_high_water);

        tracing::trace!(
            previous,
            current = state.entries.len(),
            "secret map overwritten"
        );
    }

    /// Next stamp: the clock reading, pushed past anything issued before
    fn next_stamp(&self, state: &mut State) -> SystemTime {
        let now = self.clock.now();
        let stamp = if now > state.high_water {
            now
        } else {
            state.high_water + STAMP_STEP
        };
        state.high_water = stamp;
        stamp
    }
}

impl std::fmt::Debug for SecretMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SecretMap")
            .field("len", &state.entries.len())
            .field("created_at", &self.created_at)
            .field("last_modified", &state.high_water)
            .field("clock", &self.clock)
            .finish()
    }
}

/// Point-in-time view of a [`SecretMap`]
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<Entries>);

impl Snapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SecretEntry> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretEntry)> {
        self.0.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn values(&self) -> Vec<SecretEntry> {
        self.0.values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.keys().cloned().collect();
        names.sort();
        names
    }
}
