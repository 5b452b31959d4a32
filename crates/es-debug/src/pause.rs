//! Pause barrier for freezing every emulated core at once
//!
//! Cores announce arrival on one condition variable and the controller
//! announces departure on another; both share the barrier's mutex. The
//! pause-requested flag is read without the lock on the hot path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use es_core::{cpu_trace, debugger_debug, debugger_trace};
use parking_lot::{Condvar, Mutex};

/// Wakes cores that are idle or blocked outside the barrier so they reach
/// their next checkpoint promptly.
pub trait CoreWaker: Send + Sync {
    /// Wake every core
    fn wake_all(&self);
}

/// Waker for engines whose cores never idle
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWaker;

impl CoreWaker for NullWaker {
    fn wake_all(&self) {}
}

/// Whole-system pause state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    /// Cores are running
    Idle,
    /// A pause was requested and some cores are still running
    PauseRequested,
    /// Every core is parked
    AllPaused,
}

/// Barrier that parks a fixed set of cores and releases them together
pub struct PauseBarrier {
    /// Set by the first pause request of a cycle, cleared by resume
    pause_requested: AtomicBool,
    /// Per-core parked flags
    parked: Mutex<Vec<bool>>,
    /// Signalled by cores when they park
    arrived: Condvar,
    /// Signalled by the controller on resume
    released: Condvar,
    waker: Arc<dyn CoreWaker>,
}

impl PauseBarrier {
    /// Create a barrier for `core_count` cores
    pub fn new(core_count: usize) -> Self {
        Self::with_waker(core_count, Arc::new(NullWaker))
    }

    /// Create a barrier that wakes idle cores through `waker`
    pub fn with_waker(core_count: usize, waker: Arc<dyn CoreWaker>) -> Self {
        assert!(core_count > 0, "pause barrier needs at least one core");

        Self {
            pause_requested: AtomicBool::new(false),
            parked: Mutex::new(vec![false; core_count]),
            arrived: Condvar::new(),
            released: Condvar::new(),
            waker,
        }
    }

    /// Number of cores taking part in the barrier
    pub fn core_count(&self) -> usize {
        self.parked.lock().len()
    }

    /// Ask every core to park at its next checkpoint.
    ///
    /// Requests coalesce: only the call that flips the flag starts a cycle
    /// and wakes idle cores. Never blocks.
    pub fn request_pause_all(&self) {
        if self.pause_requested.swap(true, Ordering::AcqRel) {
            debugger_trace!("Pause already requested");
            return;
        }

        debugger_debug!("Pause requested for all cores");
        self.waker.wake_all();
    }

    /// Check whether a pause is pending. Lock-free.
    #[inline]
    pub fn is_pause_requested(&self) -> bool {
        self.pause_requested.load(Ordering::Acquire)
    }

    /// Block until every core has parked.
    ///
    /// Only one controller thread may wait per cycle.
    pub fn await_all_paused(&self) {
        let mut parked = self.parked.lock();
        while !parked.iter().all(|&p| p) {
            self.arrived.wait(&mut parked);
        }
        debugger_debug!("All {} cores paused", parked.len());
    }

    /// Clear every parked flag and the pause request, then release all cores
    pub fn resume_all(&self) {
        let mut parked = self.parked.lock();
        parked.iter_mut().for_each(|p| *p = false);
        self.pause_requested.store(false, Ordering::Release);
        self.released.notify_all();
        debugger_debug!("Resumed all cores");
    }

    /// Park the calling core while a pause is pending.
    ///
    /// Returns immediately if no pause is requested. Spurious wakes go back
    /// to sleep until the pause is actually lifted.
    ///
    /// # Panics
    ///
    /// Panics if `core_id` is out of range.
    pub fn pause_core(&self, core_id: u32) {
        let index = core_id as usize;
        let mut parked = self.parked.lock();
        assert!(
            index < parked.len(),
            "core id {} out of range (core count {})",
            core_id,
            parked.len()
        );

        while self.pause_requested.load(Ordering::Acquire) {
            if !parked[index] {
                parked[index] = true;
                cpu_trace!("Core {} parked", core_id);
                self.arrived.notify_all();
            }
            self.released.wait(&mut parked);
        }

        cpu_trace!("Core {} released", core_id);
    }

    /// Check if a core has parked in the current cycle
    ///
    /// # Panics
    ///
    /// Panics if `core_id` is out of range.
    pub fn is_parked(&self, core_id: u32) -> bool {
        self.parked.lock()[core_id as usize]
    }

    /// Number of cores parked in the current cycle
    pub fn parked_count(&self) -> usize {
        self.parked.lock().iter().filter(|&&p| p).count()
    }

    /// Current whole-system state
    pub fn state(&self) -> PauseState {
        let parked = self.parked.lock();
        if !self.pause_requested.load(Ordering::Acquire) {
            PauseState::Idle
        } else if parked.iter().all(|&p| p) {
            PauseState::AllPaused
        } else {
            PauseState::PauseRequested
        }
    }
}
