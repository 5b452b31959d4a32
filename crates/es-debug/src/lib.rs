//! Debug control for the espresso multi-core emulator
//!
//! This crate provides:
//! - A pause barrier that freezes every emulated core and releases them together
//! - A lock-free breakpoint store with wait-free lookups
//! - An asynchronous debugger thread that relays events to a remote debugger
//! - The checkpoint hooks the execution engine calls into

pub mod breakpoint;
pub mod debugger;
pub mod dispatcher;
pub mod hooks;
pub mod message;
pub mod pause;
pub mod queue;
pub mod transport;

pub use breakpoint::{BreakpointSnapshot, BreakpointStore};
pub use debugger::Debugger;
pub use dispatcher::Dispatcher;
pub use hooks::ExecutionHook;
pub use message::{DebugMessage, Notification};
pub use pause::{CoreWaker, NullWaker, PauseBarrier, PauseState};
pub use queue::MessageQueue;
pub use transport::{ChannelTransport, DebugTransport, NullTransport};
