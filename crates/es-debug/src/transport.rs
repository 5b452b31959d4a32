//! Connection to the remote debugger front end

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender};
use es_core::error::DebuggerError;

use crate::message::Notification;

/// Link to a remote debugger
pub trait DebugTransport: Send + Sync {
    /// Perform the connection handshake
    fn connect(&self, host: &str, port: u16) -> Result<(), DebuggerError>;

    /// Forward a notification to the remote debugger
    fn notify(&self, notification: &Notification) -> Result<(), DebuggerError>;
}

/// Transport used when no remote debugger is available.
///
/// The handshake always fails and notifications are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl DebugTransport for NullTransport {
    fn connect(&self, host: &str, port: u16) -> Result<(), DebuggerError> {
        Err(DebuggerError::ConnectFailed {
            endpoint: format!("{}:{}", host, port),
            reason: "no transport available".to_string(),
        })
    }

    fn notify(&self, notification: &Notification) -> Result<(), DebuggerError> {
        tracing::trace!("Discarding notification: {}", notification);
        Ok(())
    }
}

/// In-process transport that forwards notifications into a channel
pub struct ChannelTransport {
    sender: Sender<Notification>,
    connected: AtomicBool,
}

impl ChannelTransport {
    /// Create a transport and the receiving end of its channel
    pub fn new() -> (Self, Receiver<Notification>) {
        let (sender, receiver) = channel::unbounded();
        let transport = Self {
            sender,
            connected: AtomicBool::new(false),
        };
        (transport, receiver)
    }

    /// Check if the handshake has completed
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl DebugTransport for ChannelTransport {
    fn connect(&self, host: &str, port: u16) -> Result<(), DebuggerError> {
        tracing::info!("Debugger channel connected as {}:{}", host, port);
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    fn notify(&self, notification: &Notification) -> Result<(), DebuggerError> {
        if !self.is_connected() {
            return Err(DebuggerError::NotConnected);
        }
        self.sender
            .send(*notification)
            .map_err(|_| DebuggerError::ChannelClosed)
    }
}
