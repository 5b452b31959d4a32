//! Debugger thread
//!
//! Drains the message queue in submission order. Handling a pre-launch or
//! breakpoint message waits for the pause barrier to converge before the
//! remote debugger is told about it, so the cores never block on I/O.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use es_core::debugger_debug;
use es_core::error::DebuggerError;

use crate::message::{DebugMessage, Notification};
use crate::pause::PauseBarrier;
use crate::queue::MessageQueue;
use crate::transport::DebugTransport;

/// Handle to the running debugger thread
pub struct Dispatcher {
    queue: Arc<MessageQueue>,
    handle: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the debugger thread
    pub fn spawn(
        queue: Arc<MessageQueue>,
        barrier: Arc<PauseBarrier>,
        transport: Arc<dyn DebugTransport>,
    ) -> Result<Self, DebuggerError> {
        let handle = {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name("debugger".to_string())
                .spawn(move || run(&queue, &barrier, transport.as_ref()))
                .map_err(|e| DebuggerError::ThreadSpawn(e.to_string()))?
        };

        Ok(Self {
            queue,
            handle: Some(handle),
        })
    }

    /// Close the queue, let the thread handle what is left, and join it.
    ///
    /// A pending pre-launch or breakpoint message still waits for every core
    /// to park, so cores must not be stopped mid-cycle before shutdown.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.queue.close();
            if handle.join().is_err() {
                tracing::error!("Debugger thread panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(queue: &MessageQueue, barrier: &PauseBarrier, transport: &dyn DebugTransport) {
    tracing::info!("Debugger thread started");

    while let Some(message) = queue.pop() {
        handle_message(message, barrier, transport);
    }

    tracing::info!("Debugger thread stopped");
}

/// Handle a single message
pub fn handle_message(
    message: DebugMessage,
    barrier: &PauseBarrier,
    transport: &dyn DebugTransport,
) {
    debugger_debug!("Handling message {}", message.name());

    match message {
        DebugMessage::DebuggerDisconnected => {
            barrier.request_pause_all();
            tracing::info!("Debugger disconnected, all cores have been paused");
        }
        DebugMessage::PreLaunch => {
            barrier.await_all_paused();
            debugger_debug!("Pre-launch occurred");
            forward(transport, Notification::PreLaunch);
        }
        DebugMessage::BreakpointHit { core_id, tag } => {
            barrier.await_all_paused();
            debugger_debug!("Breakpoint hit on core #{}", core_id);
            forward(transport, Notification::BreakpointHit { core_id, tag });
        }
    }
}

fn forward(transport: &dyn DebugTransport, notification: Notification) {
    if let Err(e) = transport.notify(&notification) {
        tracing::warn!("Failed to forward '{}': {}", notification, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;
    use std::time::Duration;

    #[test]
    fn test_disconnect_requests_pause() {
        let barrier = PauseBarrier::new(2);
        let (transport, receiver) = ChannelTransport::new();

        handle_message(DebugMessage::DebuggerDisconnected, &barrier, &transport);

        assert!(barrier.is_pause_requested());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_breakpoint_forwarded_after_convergence() {
        let barrier = Arc::new(PauseBarrier::new(1));
        let (transport, receiver) = ChannelTransport::new();
        transport.connect("localhost", 0).unwrap();

        let queue = Arc::new(MessageQueue::new());
        let dispatcher =
            Dispatcher::spawn(Arc::clone(&queue), Arc::clone(&barrier), Arc::new(transport))
                .unwrap();

        barrier.request_pause_all();
        queue.post(DebugMessage::BreakpointHit { core_id: 0, tag: 3 });

        // Core 0 has not parked yet
        assert!(receiver.recv_timeout(Duration::from_millis(50)).is_err());

        let core = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || barrier.pause_core(0))
        };

        let notification = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(notification, Notification::BreakpointHit { core_id: 0, tag: 3 });
        assert!(barrier.is_parked(0));

        barrier.resume_all();
        core.join().unwrap();
        dispatcher.shutdown();
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let barrier = Arc::new(PauseBarrier::new(1));
        let queue = Arc::new(MessageQueue::new());
        let (transport, _receiver) = ChannelTransport::new();

        let dispatcher =
            Dispatcher::spawn(Arc::clone(&queue), Arc::clone(&barrier), Arc::new(transport))
                .unwrap();
        queue.post(DebugMessage::DebuggerDisconnected);
        dispatcher.shutdown();

        assert!(queue.is_empty());
        assert!(barrier.is_pause_requested());
    }
}
