//! Cache behaviour as seen by the refresh driver and the filesystem layer

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use common::prelude::*;

fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read(path).unwrap()
}

fn secret_with(content: String) -> Secret {
    Secret {
        length: content.len() as u64,
        content: Bytes::from(content),
        ..Default::default()
    }
}

#[test]
fn test_secret_map_operations() {
    let s = parse_secret(&fixture("secret.json")).unwrap();

    let secret_map = SecretMap::new();
    assert_eq!(secret_map.len(), 0);
    assert!(secret_map.values().is_empty());
    assert!(secret_map.get("foo").is_none());

    secret_map.put("foo", s.clone());
    assert_eq!(secret_map.len(), 1);

    let values = secret_map.values();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].secret(), &s);

    assert_eq!(secret_map.get("foo").unwrap().secret(), &s);

    assert!(!secret_map.put_if_absent("foo", Secret::default()));
    assert_eq!(secret_map.get("foo").unwrap().secret(), &s);

    secret_map.put("foo", Secret::default());
    assert_ne!(secret_map.get("foo").unwrap().secret(), &s);
}

#[test]
fn test_secret_map_overwrite() {
    let s = parse_secret(&fixture("secret.json")).unwrap();

    let secret_map = SecretMap::new();
    secret_map.put("foo", Secret::default());

    let new_map = SecretMap::new();
    new_map.put("bar", s.clone());
    secret_map.overwrite(&new_map);

    assert_eq!(secret_map.len(), 1);
    assert!(secret_map.get("foo").is_none());
    assert_eq!(secret_map.get("bar").unwrap().secret(), &s);
    assert_eq!(secret_map.get("bar"), new_map.get("bar"));
}

#[test]
fn test_secret_map_timestamp() {
    let secret_map = SecretMap::new();
    secret_map.put("foo", Secret::default());
    let earlier = secret_map.get("foo").unwrap().time();

    secret_map.put("foo", Secret::default());
    assert!(secret_map.get("foo").unwrap().time() > earlier);
}

#[test]
fn test_values_len_matches() {
    let secret_map = SecretMap::new();
    for secret in parse_secret_list(&fixture("secret_list.json")).unwrap() {
        secret_map.put(secret.name.clone(), secret);
    }

    assert_eq!(secret_map.len(), 2);
    assert_eq!(secret_map.values().len(), secret_map.len());
    assert_eq!(
        secret_map.names(),
        vec!["General_Password..0be68f903f8b7d86", "Nobody_PgPass"]
    );
}

#[test]
fn test_refresh_scenario() {
    let secret_a = secret_with("correct horse".to_string());
    let secret_b = secret_with("battery staple".to_string());

    let live = SecretMap::new();
    live.put("db-password", secret_a);
    assert_eq!(live.len(), 1);

    let donor = SecretMap::new();
    donor.put("api-key", secret_b.clone());
    live.overwrite(&donor);

    assert!(live.get("db-password").is_none());
    assert_eq!(live.get("api-key").unwrap().secret(), &secret_b);
    assert_eq!(live.len(), 1);
}

/// Parse a writer tag of the form `writer-<w>:key-<k>:seq-<n>`
fn parse_tag(content: &str) -> Option<(usize, usize, u64)> {
    let mut parts = content.split(':');
    let writer = parts.next()?.strip_prefix("writer-")?.parse().ok()?;
    let key = parts.next()?.strip_prefix("key-")?.parse().ok()?;
    let seq = parts.next()?.strip_prefix("seq-")?.parse().ok()?;
    Some((writer, key, seq))
}

/// Writers keep putting while the overwrite lands. Every entry a reader sees
/// must be either the donor's entry verbatim or one written by a single put:
/// per writer and key, a repeated sequence number carries the same stamp and
/// a later sequence number carries a later stamp.
#[test]
fn test_concurrent_puts_and_overwrite() {
    const WRITERS: usize = 8;
    const READERS: usize = 4;
    const KEYS: usize = 16;
    const PUTS_AROUND_OVERWRITE: usize = 2_000;

    let live = Arc::new(SecretMap::new());
    for key in 0..KEYS {
        live.put(format!("key-{key}"), secret_with(format!("seed:key-{key}")));
    }

    let donor = SecretMap::new();
    for key in 0..KEYS {
        donor.put(format!("key-{key}"), secret_with(format!("donor:key-{key}")));
    }

    let done = AtomicBool::new(false);
    let puts = AtomicUsize::new(0);

    let (puts_before, puts_total) = std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let (live, done, puts) = (&live, &done, &puts);
            scope.spawn(move || {
                let mut seq = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let key = (writer + seq as usize) % KEYS;
                    live.put(
                        format!("key-{key}"),
                        secret_with(format!("writer-{writer}:key-{key}:seq-{seq}")),
                    );
                    puts.fetch_add(1, Ordering::Relaxed);
                    seq += 1;
                }
            });
        }

        for _ in 0..READERS {
            let (live, donor, done) = (&live, &donor, &done);
            scope.spawn(move || {
                let mut seen: HashMap<(usize, usize), (u64, SystemTime)> = HashMap::new();
                while !done.load(Ordering::Relaxed) {
                    for key in 0..KEYS {
                        let name = format!("key-{key}");
                        let entry = live.get(&name).unwrap();
                        let content = std::str::from_utf8(&entry.secret().content).unwrap();

                        if content.starts_with("donor:") {
                            assert_eq!(Some(entry.clone()), donor.get(&name));
                            continue;
                        }
                        if content.starts_with("seed:") {
                            continue;
                        }

                        let (writer, tagged_key, seq) = parse_tag(content).unwrap();
                        assert_eq!(tagged_key, key);
                        match seen.insert((writer, key), (seq, entry.time())) {
                            Some((prev_seq, prev_time)) if prev_seq == seq => {
                                assert_eq!(prev_time, entry.time());
                            }
                            Some((prev_seq, prev_time)) => {
                                assert!(seq > prev_seq, "writer {writer} went back on {name}");
                                assert!(entry.time() > prev_time);
                            }
                            None => {}
                        }
                    }
                }
            });
        }

        while puts.load(Ordering::Relaxed) < PUTS_AROUND_OVERWRITE {
            std::thread::yield_now();
        }
        live.overwrite(&donor);
        let puts_before = puts.load(Ordering::Relaxed);

        while puts.load(Ordering::Relaxed) < puts_before + PUTS_AROUND_OVERWRITE {
            std::thread::yield_now();
        }
        done.store(true, Ordering::Relaxed);
        (puts_before, puts.load(Ordering::Relaxed))
    });

    // the overwrite landed between puts, not after them
    assert!(puts_before >= PUTS_AROUND_OVERWRITE);
    assert!(puts_total >= puts_before + PUTS_AROUND_OVERWRITE);
    assert_eq!(live.len(), KEYS);
    assert!(live.last_modified() >= donor.last_modified());
}

#[test]
fn test_overwrite_is_all_or_nothing() {
    const KEYS: usize = 64;

    let live = Arc::new(SecretMap::new());
    for key in 0..KEYS {
        live.put(format!("old-{key}"), Secret::default());
    }

    let donor = SecretMap::new();
    for key in 0..KEYS {
        donor.put(format!("new-{key}"), Secret::default());
    }

    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let reader = scope.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                let snapshot = live.snapshot();
                let old = snapshot.iter().filter(|(n, _)| n.starts_with("old-")).count();
                let new = snapshot.iter().filter(|(n, _)| n.starts_with("new-")).count();
                assert!(
                    (old == KEYS && new == 0) || (old == 0 && new == KEYS),
                    "torn view: {old} old, {new} new"
                );
            }
        });

        std::thread::sleep(Duration::from_millis(5));
        live.overwrite(&donor);
        std::thread::sleep(Duration::from_millis(5));
        done.store(true, Ordering::Relaxed);
        reader.join().unwrap();
    });

    assert!(live.get("old-0").is_none());
    assert!(live.get("new-0").is_some());
}

#[test]
fn test_concurrent_put_if_absent_single_winner() {
    let map = SecretMap::new();
    let wins: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let map = &map;
                scope.spawn(move || map.put_if_absent("only", secret_with(format!("{i}"))))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum()
    });

    assert_eq!(wins, 1);
    assert_eq!(map.len(), 1);
}
