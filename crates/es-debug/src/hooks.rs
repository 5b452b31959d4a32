//! Checkpoint hooks called by the execution engine

use es_core::cpu_debug;

use crate::debugger::Debugger;
use crate::message::DebugMessage;

/// Debug hook an execution engine calls from its core threads
pub trait ExecutionHook: Send + Sync {
    /// Called at every instruction or block boundary with the address about
    /// to execute. May park the calling core.
    fn on_checkpoint(&self, address: u32, core_id: u32);

    /// Called once before the program starts. Parks the calling core until
    /// the debugger resumes execution.
    fn on_pre_launch(&self, core_id: u32);
}

impl ExecutionHook for Debugger {
    #[inline]
    fn on_checkpoint(&self, address: u32, core_id: u32) {
        if !self.is_enabled() {
            return;
        }

        // Join a pause cycle that is already under way
        if self.barrier().is_pause_requested() {
            self.pause_core(core_id);
            return;
        }

        if let Some(tag) = self.breakpoints().lookup(address) {
            cpu_debug!("Core {} hit breakpoint at 0x{:08x}", core_id, address);
            self.request_pause_all();
            // Must be queued before this core parks
            self.notify(DebugMessage::BreakpointHit { core_id, tag });
            self.pause_core(core_id);
        }
    }

    fn on_pre_launch(&self, core_id: u32) {
        if !self.is_enabled() {
            return;
        }

        cpu_debug!("Core {} waiting for debugger before launch", core_id);
        self.request_pause_all();
        self.notify(DebugMessage::PreLaunch);
        self.pause_core(core_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pause::{NullWaker, PauseState};
    use crate::transport::NullTransport;
    use std::sync::Arc;

    #[test]
    fn test_disabled_hooks_are_noops() {
        let debugger = Debugger::new(2, Arc::new(NullTransport), Arc::new(NullWaker));
        debugger.add_breakpoint(0x1000, 7);

        debugger.on_checkpoint(0x1000, 0);
        debugger.on_pre_launch(1);

        assert_eq!(debugger.pause_state(), PauseState::Idle);
        assert_eq!(debugger.barrier().parked_count(), 0);
        assert_eq!(debugger.pending_messages(), 0);
    }

    #[test]
    fn test_checkpoint_miss_returns() {
        let debugger = Debugger::new(1, Arc::new(NullTransport), Arc::new(NullWaker));
        let config = es_core::config::DebuggerConfig {
            force_enabled: true,
            ..Default::default()
        };
        debugger.initialise(&config).unwrap();
        debugger.add_breakpoint(0x1000, 7);

        debugger.on_checkpoint(0x1004, 0);

        assert_eq!(debugger.pause_state(), PauseState::Idle);
        debugger.shutdown();
    }
}
