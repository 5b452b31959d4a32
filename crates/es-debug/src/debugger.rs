//! Shared debugger context
//!
//! One `Debugger` is built at startup and shared with the execution engine
//! (through [`ExecutionHook`](crate::hooks::ExecutionHook)) and the network
//! command handler. Teardown order: stop the cores, resume, then
//! [`Debugger::shutdown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use es_core::config::DebuggerConfig;
use es_core::error::DebuggerError;
use parking_lot::Mutex;

use crate::breakpoint::BreakpointStore;
use crate::dispatcher::Dispatcher;
use crate::message::DebugMessage;
use crate::pause::{CoreWaker, PauseBarrier, PauseState};
use crate::queue::MessageQueue;
use crate::transport::DebugTransport;

/// Debugger context
pub struct Debugger {
    /// Set once by `initialise`
    enabled: AtomicBool,
    initialised: AtomicBool,
    barrier: Arc<PauseBarrier>,
    breakpoints: BreakpointStore,
    queue: Arc<MessageQueue>,
    transport: Arc<dyn DebugTransport>,
    dispatcher: Mutex<Option<Dispatcher>>,
}

impl Debugger {
    /// Create a disabled debugger for `core_count` cores
    pub fn new(
        core_count: usize,
        transport: Arc<dyn DebugTransport>,
        waker: Arc<dyn CoreWaker>,
    ) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            initialised: AtomicBool::new(false),
            barrier: Arc::new(PauseBarrier::with_waker(core_count, waker)),
            breakpoints: BreakpointStore::new(),
            queue: Arc::new(MessageQueue::new()),
            transport,
            dispatcher: Mutex::new(None),
        }
    }

    /// Connect to the remote debugger and start the debugger thread.
    ///
    /// Debugging is enabled when the handshake succeeds or when
    /// `force_enabled` is set. Returns whether debugging ended up enabled.
    /// May only be called once, unless the debugger thread failed to start,
    /// in which case the debugger stays disabled and may be initialised again.
    pub fn initialise(&self, config: &DebuggerConfig) -> Result<bool, DebuggerError> {
        if self.initialised.swap(true, Ordering::AcqRel) {
            return Err(DebuggerError::AlreadyInitialised);
        }

        let enabled = match self.transport.connect(&config.host, config.port) {
            Ok(()) => {
                tracing::info!("Debugger connected at {}", config.endpoint());
                true
            }
            Err(e) if config.force_enabled => {
                tracing::warn!("{}, debugging forced on", e);
                true
            }
            Err(e) => {
                tracing::info!("{}, debugging disabled", e);
                false
            }
        };

        if enabled {
            let dispatcher = Dispatcher::spawn(
                Arc::clone(&self.queue),
                Arc::clone(&self.barrier),
                Arc::clone(&self.transport),
            )
            .map_err(|e| self.initialise_failed(e))?;
            *self.dispatcher.lock() = Some(dispatcher);
        }

        self.enabled.store(enabled, Ordering::Release);
        Ok(enabled)
    }

    fn initialise_failed(&self, error: DebuggerError) -> DebuggerError {
        tracing::error!("Debugger initialisation failed: {}", error);
        self.initialised.store(false, Ordering::Release);
        error
    }

    /// Check if debugging is enabled
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Post a message to the debugger thread
    pub fn notify(&self, message: DebugMessage) {
        if !self.is_enabled() {
            tracing::warn!("Dropping {}, debugging is disabled", message.name());
            return;
        }
        self.queue.post(message);
    }

    /// Pause barrier shared with the execution engine
    pub fn barrier(&self) -> &Arc<PauseBarrier> {
        &self.barrier
    }

    /// Number of cores
    pub fn core_count(&self) -> usize {
        self.barrier.core_count()
    }

    /// Ask every core to park at its next checkpoint
    pub fn request_pause_all(&self) {
        self.barrier.request_pause_all();
    }

    /// Block until every core has parked
    pub fn await_all_paused(&self) {
        self.barrier.await_all_paused();
    }

    /// Release every parked core
    pub fn resume_all(&self) {
        self.barrier.resume_all();
    }

    /// Park the calling core while a pause is pending
    pub fn pause_core(&self, core_id: u32) {
        self.barrier.pause_core(core_id);
    }

    /// Request a pause and wait for every core to park
    pub fn pause(&self) {
        self.barrier.request_pause_all();
        self.barrier.await_all_paused();
    }

    /// Resume execution on every core
    pub fn resume(&self) {
        self.barrier.resume_all();
    }

    /// Current pause state
    pub fn pause_state(&self) -> PauseState {
        self.barrier.state()
    }

    /// Breakpoint table
    pub fn breakpoints(&self) -> &BreakpointStore {
        &self.breakpoints
    }

    /// Add a breakpoint carrying `tag` at `address`
    pub fn add_breakpoint(&self, address: u32, tag: u32) {
        self.breakpoints.add(address, tag);
    }

    /// Remove the breakpoint at `address`, returning whether one was set
    pub fn remove_breakpoint(&self, address: u32) -> bool {
        self.breakpoints.remove(address)
    }

    /// Tag of the breakpoint at `address`
    pub fn breakpoint(&self, address: u32) -> Option<u32> {
        self.breakpoints.lookup(address)
    }

    /// Remove every breakpoint
    pub fn clear_breakpoints(&self) {
        self.breakpoints.clear();
    }

    /// Number of messages waiting for the debugger thread
    pub fn pending_messages(&self) -> usize {
        self.queue.len()
    }

    /// Stop the debugger thread after it has handled every queued message
    pub fn shutdown(&self) {
        if let Some(dispatcher) = self.dispatcher.lock().take() {
            dispatcher.shutdown();
        }
    }
}

impl Drop for Debugger {
    fn drop(&mut self) {
        self.shutdown();
    }
}
