//! Concurrent Access Tests
//!
//! One writer publishes while readers look up and scan without locking.
//! Readers must only ever see fully built entries in sorted order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use skipmem::MemTable;

fn key_for(i: usize) -> String {
    // Interleave inserts across the key space instead of always appending.
    format!("key{:08}", (i * 7_919) % 100_003)
}

fn value_for(key: &[u8]) -> Vec<u8> {
    let mut value = key.to_vec();
    value.reverse();
    value
}

#[test]
fn test_memtable_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemTable>();
    assert_send_sync::<Arc<MemTable>>();
}

#[test]
fn test_concurrent_reads() {
    let memtable = Arc::new(MemTable::new(0));
    memtable.insert(1, "key", 1, "value").unwrap();

    let mut handles = vec![];

    for _ in 0..10 {
        let mt = Arc::clone(&memtable);
        let handle = thread::spawn(move || {
            for _ in 0..100 {
                let result = mt.find(b"key").unwrap();
                assert_eq!(result.as_deref(), Some(&b"value"[..]));
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writers_are_serialized() {
    let memtable = Arc::new(MemTable::new(0));

    let mut handles = vec![];

    for i in 0..8 {
        let mt = Arc::clone(&memtable);
        let handle = thread::spawn(move || {
            for j in 0..250 {
                // Equal sequence numbers are allowed, so every writer can use 0.
                mt.insert(0, format!("key{}_{}", i, j), 1, format!("value{}_{}", i, j))
                    .unwrap();
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.len(), 2000);
    assert_eq!(memtable.iter().count(), 2000);
    for i in 0..8 {
        for j in 0..250 {
            let key = format!("key{}_{}", i, j);
            let expected = format!("value{}_{}", i, j);
            assert_eq!(
                memtable.find(key.as_bytes()).unwrap().as_deref(),
                Some(expected.as_bytes())
            );
        }
    }
}

#[test]
fn test_readers_see_consistent_entries_during_inserts() {
    const ENTRIES: usize = 20_000;
    const READERS: usize = 4;

    let memtable = MemTable::new(0);
    let published = AtomicUsize::new(0);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        // Point readers: every acknowledged key must be found with its value.
        for reader in 0..READERS {
            let memtable = &memtable;
            let published = &published;
            let done = &done;
            s.spawn(move || {
                let mut probe = reader;
                while !done.load(Ordering::Acquire) {
                    let upto = published.load(Ordering::Acquire);
                    if upto == 0 {
                        continue;
                    }
                    let key = key_for(probe % upto);
                    let found = memtable.find(key.as_bytes()).unwrap();
                    assert_eq!(found.as_deref(), Some(value_for(key.as_bytes()).as_slice()));
                    probe = probe.wrapping_add(31);
                }
            });
        }

        // Scanners: order holds and every value matches its key.
        for _ in 0..2 {
            let memtable = &memtable;
            let done = &done;
            s.spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let mut previous: Option<&[u8]> = None;
                    let mut iter = memtable.iter();
                    while let Some(entry) = iter.next() {
                        assert_eq!(&entry.value[..], value_for(entry.key).as_slice());
                        if let Some(previous) = previous {
                            assert!(previous < entry.key, "out of order scan");
                        }
                        previous = Some(entry.key);
                    }
                    iter.close();
                }
            });
        }

        for i in 0..ENTRIES {
            let key = key_for(i);
            let value = value_for(key.as_bytes());
            memtable.insert(i as i64, key, 1, value).unwrap();
            published.store(i + 1, Ordering::Release);
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(memtable.len(), ENTRIES);
    assert_eq!(memtable.sequence_upper(), ENTRIES as i64 - 1);
    assert_eq!(memtable.iter().count(), ENTRIES);
}

#[test]
fn test_new_versions_visible_to_concurrent_readers() {
    const VERSIONS: i64 = 5_000;

    let memtable = MemTable::new(0);
    let latest = std::sync::atomic::AtomicI64::new(-1);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..3 {
            let memtable = &memtable;
            let latest = &latest;
            let done = &done;
            s.spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let floor = latest.load(Ordering::Acquire);
                    if floor < 0 {
                        continue;
                    }
                    // Versions only get newer: whatever we see is at least
                    // as new as what was acknowledged before the lookup.
                    let found = memtable.find(b"hot").unwrap().unwrap();
                    let seen: i64 = std::str::from_utf8(&found).unwrap().parse().unwrap();
                    assert!(seen >= floor);
                }
            });
        }

        for ts in 0..VERSIONS {
            memtable.insert(ts, "hot", ts, ts.to_string()).unwrap();
            latest.store(ts, Ordering::Release);
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(memtable.len(), VERSIONS as usize);
    assert_eq!(
        memtable.find(b"hot").unwrap().as_deref(),
        Some((VERSIONS - 1).to_string().as_bytes())
    );
}
