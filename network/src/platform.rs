//! Platform collaborators.
//!
//! The interface never reaches for global state: the host passes a
//! platform object in at construction that supplies time and takes
//! user-facing messages.

use core::fmt;

/// Destination class for a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Generic,
    NetworkInfo,
    Debug,
    Warning,
    Error,
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Write-only text sink for messages and diagnostics.
pub trait MessageSink {
    fn message(&mut self, mtype: MessageType, args: fmt::Arguments<'_>);
}

/// Everything the interface needs from the host platform.
pub trait Platform: Clock + MessageSink {}

impl<T: Clock + MessageSink> Platform for T {}
