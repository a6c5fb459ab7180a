//! Generation-checked socket handles.

use core::fmt;

use crate::types::SocketNumber;

/// Reference to one connection session on a hardware socket.
///
/// The socket's generation advances every time a session ends, so a
/// handle kept past the end of its session is rejected instead of
/// silently addressing whatever connection now occupies the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketHandle {
    number: SocketNumber,
    generation: u16,
}

impl SocketHandle {
    pub(crate) const fn new(number: SocketNumber, generation: u16) -> Self {
        Self { number, generation }
    }

    pub const fn number(&self) -> SocketNumber {
        self.number
    }

    pub const fn generation(&self) -> u16 {
        self.generation
    }
}

impl fmt::Display for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket {}#{}", self.number, self.generation)
    }
}
