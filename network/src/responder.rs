//! Protocol responder collaborators.
//!
//! HTTP, FTP and Telnet payload handling lives outside the driver. The
//! interface offers each newly established connection to the responder,
//! feeds it inbound bytes and gives it a chance to send, one socket per
//! tick.
//!
//! A responder sees a connection through a [`Connection`] that only lives
//! for the duration of one callback. To act on the connection later it
//! keeps the [`SocketHandle`] and goes through the interface, which
//! rejects the handle once the session has ended.

use crate::driver::SocketChip;
use crate::error::{NetworkError, Result};
use crate::socket::SocketHandle;
use crate::types::{NetworkProtocol, SocketRole};

/// Tick-scoped view of a connected socket.
pub struct Connection<'a> {
    handle: SocketHandle,
    role: SocketRole,
    chip: &'a mut dyn SocketChip,
    close_requested: bool,
}

impl<'a> Connection<'a> {
    pub(crate) fn new(handle: SocketHandle, role: SocketRole, chip: &'a mut dyn SocketChip) -> Self {
        Self {
            handle,
            role,
            chip,
            close_requested: false,
        }
    }

    pub fn handle(&self) -> SocketHandle {
        self.handle
    }

    pub fn role(&self) -> SocketRole {
        self.role
    }

    pub fn protocol(&self) -> Option<NetworkProtocol> {
        self.role.protocol()
    }

    /// Space left in the chip's transmit buffer for this socket.
    pub fn tx_free(&mut self) -> usize {
        self.chip.tx_free(self.handle.number())
    }

    /// Queue bytes for transmission; returns how many the chip took.
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        if self.close_requested {
            return Err(NetworkError::SocketNotConnected);
        }
        Ok(self.chip.send(self.handle.number(), data)?)
    }

    /// Ask for a graceful close once this callback returns.
    pub fn close(&mut self) {
        self.close_requested = true;
    }

    pub(crate) fn close_requested(&self) -> bool {
        self.close_requested
    }
}

/// Application-level handler for connections on the interface's sockets.
pub trait Responder {
    /// Protocol has been enabled on an active interface.
    fn start(&mut self, _protocol: NetworkProtocol) {}

    /// Protocol has been disabled or the interface is going down.
    fn stop(&mut self, _protocol: NetworkProtocol) {}

    /// Offer a newly established connection. Return `true` to take it.
    ///
    /// A connection nobody takes is offered again on later polls and
    /// dropped once the accept timeout expires.
    fn accept(&mut self, handle: SocketHandle, role: SocketRole) -> bool;

    /// Inbound bytes for an accepted connection.
    fn deliver(&mut self, conn: &mut Connection<'_>, data: &[u8]);

    /// Chance to send pending output for an accepted connection.
    fn flush(&mut self, _conn: &mut Connection<'_>) {}

    /// Session is over; `handle` is no longer valid.
    fn session_ended(&mut self, _handle: SocketHandle) {}
}
