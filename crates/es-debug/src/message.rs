//! Debug messages and outbound notifications

use std::fmt;

/// Event posted to the debugger thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMessage {
    /// The remote debugger went away
    DebuggerDisconnected,
    /// The program is about to start
    PreLaunch,
    /// A core hit a breakpoint
    BreakpointHit {
        /// Core that hit the breakpoint
        core_id: u32,
        /// User tag attached to the breakpoint
        tag: u32,
    },
}

impl DebugMessage {
    /// Short message name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::DebuggerDisconnected => "DebuggerDisconnected",
            Self::PreLaunch => "PreLaunch",
            Self::BreakpointHit { .. } => "BreakpointHit",
        }
    }
}

/// Notification forwarded to the remote debugger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Every core is parked before the program starts
    PreLaunch,
    /// Every core is parked after `core_id` hit a breakpoint
    BreakpointHit { core_id: u32, tag: u32 },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreLaunch => write!(f, "pre-launch"),
            Self::BreakpointHit { core_id, tag } => {
                write!(f, "breakpoint hit, core={}, tag={}", core_id, tag)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_display() {
        assert_eq!(Notification::PreLaunch.to_string(), "pre-launch");
        assert_eq!(
            Notification::BreakpointHit { core_id: 2, tag: 7 }.to_string(),
            "breakpoint hit, core=2, tag=7"
        );
    }

    #[test]
    fn test_message_name() {
        let msg = DebugMessage::BreakpointHit { core_id: 1, tag: 0 };
        assert_eq!(msg.name(), "BreakpointHit");
        assert_eq!(DebugMessage::DebuggerDisconnected.name(), "DebuggerDisconnected");
    }
}
