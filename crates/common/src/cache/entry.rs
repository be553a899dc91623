use std::time::{Duration, SystemTime};

use crate::secret::Secret;

/// A cached secret and the time the map stamped it
///
/// Entries are only built by [`SecretMap`](super::SecretMap); the stamp
/// records when the secret was last established as current, whether or
/// not its content changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEntry {
    secret: Secret,
    time: SystemTime,
}

impl SecretEntry {
    pub(crate) fn new(secret: Secret, time: SystemTime) -> Self {
        Self { secret, time }
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn time(&self) -> SystemTime {
        self.time
    }

    pub fn into_secret(self) -> Secret {
        self.secret
    }

    /// Time elapsed since the entry was stamped, zero if `now` is earlier
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.time).unwrap_or_default()
    }

    /// Whether the entry was stamped less than `max_age` before `now`
    pub fn is_fresh(&self, now: SystemTime, max_age: Duration) -> bool {
        self.age(now) < max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness() {
        let stamped = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let entry = SecretEntry::new(Secret::default(), stamped);

        assert!(entry.is_fresh(stamped + Duration::from_secs(5), Duration::from_secs(10)));
        assert!(!entry.is_fresh(stamped + Duration::from_secs(10), Duration::from_secs(10)));
        // clock skew never makes an entry look older
        assert_eq!(entry.age(stamped - Duration::from_secs(1)), Duration::ZERO);
    }
}
