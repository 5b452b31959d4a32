//! Unbounded message queue between the cores and the debugger thread

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::message::DebugMessage;

struct QueueState {
    messages: VecDeque<DebugMessage>,
    closed: bool,
}

/// Multi-producer, single-consumer FIFO of debug messages
///
/// Posting never blocks; the queue grows instead of applying backpressure.
pub struct MessageQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
}

impl MessageQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                messages: VecDeque::with_capacity(16),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Append a message. Messages posted after `close` are dropped.
    pub fn post(&self, message: DebugMessage) {
        let mut state = self.state.lock();
        if state.closed {
            tracing::warn!("Dropping {} posted after debugger shutdown", message.name());
            return;
        }
        state.messages.push_back(message);
        self.not_empty.notify_one();
    }

    /// Pop the oldest message, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<DebugMessage> {
        let mut state = self.state.lock();
        loop {
            if let Some(message) = state.messages.pop_front() {
                return Some(message);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    #[cfg(test)]
    fn try_pop(&self) -> Option<DebugMessage> {
        self.state.lock().messages.pop_front()
    }

    /// Stop accepting messages and wake the consumer
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
    }

    #[cfg(test)]
    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().messages.is_empty()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = MessageQueue::new();
        assert!(queue.is_empty());

        queue.post(DebugMessage::PreLaunch);
        queue.post(DebugMessage::BreakpointHit { core_id: 1, tag: 9 });
        queue.post(DebugMessage::DebuggerDisconnected);
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.pop(), Some(DebugMessage::PreLaunch));
        assert_eq!(queue.pop(), Some(DebugMessage::BreakpointHit { core_id: 1, tag: 9 }));
        assert_eq!(queue.try_pop(), Some(DebugMessage::DebuggerDisconnected));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_close_drains_then_ends() {
        let queue = MessageQueue::new();
        queue.post(DebugMessage::PreLaunch);
        queue.close();

        // Posts after close are dropped
        queue.post(DebugMessage::DebuggerDisconnected);

        assert!(queue.is_closed());
        assert_eq!(queue.pop(), Some(DebugMessage::PreLaunch));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_pop_blocks_until_post() {
        let queue = Arc::new(MessageQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        queue.post(DebugMessage::PreLaunch);
        assert_eq!(consumer.join().unwrap(), Some(DebugMessage::PreLaunch));
    }

    #[test]
    fn test_multiple_producers() {
        let queue = Arc::new(MessageQueue::new());

        let producers: Vec<_> = (0..4u32)
            .map(|core_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for tag in 0..100 {
                        queue.post(DebugMessage::BreakpointHit { core_id, tag });
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        // Per-producer order survives interleaving
        let mut next_tag = [0u32; 4];
        while let Some(DebugMessage::BreakpointHit { core_id, tag }) = queue.try_pop() {
            assert_eq!(tag, next_tag[core_id as usize]);
            next_tag[core_id as usize] += 1;
        }
        assert_eq!(next_tag, [100; 4]);
    }
}
