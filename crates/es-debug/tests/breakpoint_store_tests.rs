//! Concurrency tests for the breakpoint store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use es_debug::BreakpointStore;

const BASE: u32 = 0x0200_0000;
const COUNT: u32 = 500;

fn address(index: u32) -> u32 {
    BASE + index * 4
}

/// Every observed snapshot must be a contiguous run of indices with
/// matching tags; anything else would be a half-applied edit.
fn check_contiguous(entries: &[(u32, u32)]) {
    for window in entries.windows(2) {
        assert_eq!(window[1].0, window[0].0 + 4, "gap in snapshot");
    }
    for &(addr, tag) in entries {
        assert_eq!(addr, address(tag), "tag does not match address");
    }
}

#[test]
fn test_readers_never_see_partial_updates() {
    let store = Arc::new(BreakpointStore::new());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut observed = 0usize;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    check_contiguous(&store.entries());

                    let snapshot = store.snapshot();
                    let present = (0..COUNT)
                        .filter(|&i| snapshot.get(address(i)).is_some())
                        .count();
                    assert_eq!(snapshot.len(), present);

                    for i in 0..COUNT {
                        if let Some(tag) = store.lookup(address(i)) {
                            assert_eq!(tag, i);
                        }
                    }
                    observed += 1;
                    if finished {
                        break;
                    }
                }
                observed
            })
        })
        .collect();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..COUNT {
                store.add(address(i), i);
            }
            for i in 0..COUNT {
                store.remove(address(i));
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::Release);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert!(store.is_empty());
}

#[test]
fn test_concurrent_writers_lose_no_updates() {
    let store = Arc::new(BreakpointStore::new());

    let writers: Vec<_> = (0..4u32)
        .map(|writer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100 {
                    let index = writer * 100 + i;
                    store.add(address(index), index);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(store.len(), 400);
    check_contiguous(&store.entries());

    let removers: Vec<_> = (0..4u32)
        .map(|writer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in (0..100).step_by(2) {
                    store.remove(address(writer * 100 + i));
                }
            })
        })
        .collect();
    for remover in removers {
        remover.join().unwrap();
    }

    assert_eq!(store.len(), 200);
    for index in 0..400 {
        assert_eq!(store.contains(address(index)), index % 2 == 1);
    }
}
