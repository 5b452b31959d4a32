//! Lock-free breakpoint store
//!
//! The live breakpoint table is an immutable snapshot behind an atomically
//! swappable pointer. Writers copy the current snapshot, edit the copy and
//! publish it with a compare-and-swap, retrying if another writer got there
//! first. Readers load the pointer once and never block or retry, so the
//! per-instruction lookup stays cheap.
//!
//! Replaced snapshots are reclaimed through the epoch collector once no
//! reader can still hold them.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use crossbeam::epoch::{self, Atomic, Owned};
use es_core::{debugger_debug, debugger_trace};

/// Immutable view of the breakpoint table at one point in time
#[derive(Debug, Clone, Default)]
pub struct BreakpointSnapshot {
    /// Breakpoint address -> user tag
    entries: HashMap<u32, u32>,
}

impl BreakpointSnapshot {
    /// Tag for the breakpoint at `address`
    #[inline]
    pub fn get(&self, address: u32) -> Option<u32> {
        self.entries.get(&address).copied()
    }

    /// Number of breakpoints
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot has no breakpoints
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Breakpoint table shared between the execution cores and the debugger
pub struct BreakpointStore {
    current: Atomic<BreakpointSnapshot>,
}

impl BreakpointStore {
    /// Create an empty breakpoint store
    pub fn new() -> Self {
        Self {
            current: Atomic::new(BreakpointSnapshot::default()),
        }
    }

    /// Add a breakpoint, replacing the tag if one already exists at `address`
    pub fn add(&self, address: u32, tag: u32) {
        self.update(|entries| {
            entries.insert(address, tag);
        });
        debugger_debug!("Added breakpoint at 0x{:08x} (tag {})", address, tag);
    }

    /// Remove the breakpoint at `address`, returning whether one was set.
    /// Removing an absent address leaves the table unchanged.
    pub fn remove(&self, address: u32) -> bool {
        let removed = self.update(|entries| entries.remove(&address).is_some());
        if removed {
            debugger_debug!("Removed breakpoint at 0x{:08x}", address);
        }
        removed
    }

    /// Remove every breakpoint
    pub fn clear(&self) {
        self.update(|entries| entries.clear());
        debugger_debug!("Cleared all breakpoints");
    }

    /// Tag of the breakpoint at `address`, if any. Wait-free.
    #[inline]
    pub fn lookup(&self, address: u32) -> Option<u32> {
        self.with_snapshot(|snapshot| snapshot.get(address))
    }

    /// Check if there's a breakpoint at `address`
    pub fn contains(&self, address: u32) -> bool {
        self.lookup(address).is_some()
    }

    /// Number of breakpoints in the current snapshot
    pub fn len(&self) -> usize {
        self.with_snapshot(BreakpointSnapshot::len)
    }

    /// Check if the current snapshot has no breakpoints
    pub fn is_empty(&self) -> bool {
        self.with_snapshot(BreakpointSnapshot::is_empty)
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> BreakpointSnapshot {
        self.with_snapshot(BreakpointSnapshot::clone)
    }

    /// All `(address, tag)` pairs of the current snapshot, sorted by address
    pub fn entries(&self) -> Vec<(u32, u32)> {
        let mut entries: Vec<(u32, u32)> = self.with_snapshot(|snapshot| {
            snapshot
                .entries
                .iter()
                .map(|(&address, &tag)| (address, tag))
                .collect()
        });
        entries.sort_unstable_by_key(|&(address, _)| address);
        entries
    }

    fn with_snapshot<R>(&self, f: impl FnOnce(&BreakpointSnapshot) -> R) -> R {
        let guard = epoch::pin();
        let current = self.current.load(Ordering::Acquire, &guard);
        // SAFETY: the pointer is never null and a published snapshot is only
        // destroyed after every guard pinned before its replacement is dropped.
        f(unsafe { current.deref() })
    }

    /// Copy-edit-swap loop shared by every mutation. Returns what `edit`
    /// returned on the attempt that was published.
    fn update<R>(&self, edit: impl Fn(&mut HashMap<u32, u32>) -> R) -> R {
        let guard = epoch::pin();
        let mut attempts = 0u32;

        loop {
            let current = self.current.load(Ordering::Acquire, &guard);
            // SAFETY: see `with_snapshot`.
            let mut next = unsafe { current.deref() }.clone();
            let result = edit(&mut next.entries);

            match self.current.compare_exchange(
                current,
                Owned::new(next),
                Ordering::AcqRel,
                Ordering::Acquire,
                &guard,
            ) {
                Ok(_) => {
                    // SAFETY: `current` is unlinked; readers still holding it
                    // are protected by their own guards.
                    unsafe { guard.defer_destroy(current) };
                    return result;
                }
                Err(_) => {
                    attempts += 1;
                    debugger_trace!("Breakpoint update lost a race, retry {}", attempts);
                }
            }
        }
    }
}

impl Default for BreakpointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BreakpointStore {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no reader or writer can still reach the
        // current snapshot.
        unsafe {
            let guard = epoch::unprotected();
            let current = self.current.load(Ordering::Relaxed, guard);
            if !current.is_null() {
                drop(current.into_owned());
            }
        }
    }
}
