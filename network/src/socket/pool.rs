//! Fixed pool of the chip's hardware sockets.
//!
//! Socket numbers are permanently partitioned between services (see
//! [`crate::types`]). The pool enforces that partition: a socket either
//! holds the one role permitted for its number, or is free.

use core::ops::Range;

use smoltcp::time::{Duration, Instant};

use crate::driver::SocketChip;
use crate::error::{ContractViolation, NetworkError, Result};
use crate::responder::Responder;
use crate::types::{
    NetworkProtocol, Port, SocketNumber, SocketRole, DHCP_SOCKET_NUMBER, FTP_DATA_SOCKET_NUMBER,
    FTP_SOCKET_NUMBER, NUM_HTTP_SOCKETS, NUM_SOCKETS, TELNET_SOCKET_NUMBER,
};

use super::{HardwareSocket, PollOutcome, SocketHandle};

/// Listener sockets of `protocol`.
pub const fn listener_sockets(protocol: NetworkProtocol) -> Range<SocketNumber> {
    match protocol {
        NetworkProtocol::Http => 0..NUM_HTTP_SOCKETS as SocketNumber,
        NetworkProtocol::Ftp => FTP_SOCKET_NUMBER..FTP_SOCKET_NUMBER + 1,
        NetworkProtocol::Telnet => TELNET_SOCKET_NUMBER..TELNET_SOCKET_NUMBER + 1,
    }
}

pub struct SocketPool {
    sockets: [HardwareSocket; NUM_SOCKETS],
}

impl SocketPool {
    pub fn new() -> Self {
        Self {
            sockets: core::array::from_fn(|n| {
                let number = n as SocketNumber;
                if number == DHCP_SOCKET_NUMBER {
                    HardwareSocket::with_role(number, SocketRole::Dhcp)
                } else {
                    HardwareSocket::new(number)
                }
            }),
        }
    }

    pub fn get(&self, socket: SocketNumber) -> Option<&HardwareSocket> {
        self.sockets.get(socket as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HardwareSocket> {
        self.sockets.iter()
    }

    /// Give `socket` a role. Only `Free` or the socket's permitted role is
    /// accepted.
    pub fn assign(
        &mut self,
        socket: SocketNumber,
        role: SocketRole,
    ) -> core::result::Result<(), ContractViolation> {
        let slot = self
            .sockets
            .get_mut(socket as usize)
            .ok_or(ContractViolation::InvalidSocket(socket))?;
        if role != SocketRole::Free && role != SocketRole::permitted_for(socket) {
            return Err(ContractViolation::RoleNotPermitted { socket, role });
        }
        slot.set_role(role);
        Ok(())
    }

    /// Bring up the listeners of `protocol` on `port`.
    ///
    /// FTP also claims the data socket, left idle until a passive data
    /// port is opened.
    pub fn start_protocol(
        &mut self,
        protocol: NetworkProtocol,
        port: Port,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
    ) {
        let role = protocol.listener_role();
        for number in listener_sockets(protocol) {
            let socket = &mut self.sockets[number as usize];
            socket.set_role(role);
            if let Err(err) = socket.listen(chip, responder, port) {
                log::warn!("{}: socket {} will retry listening: {}", protocol, number, err);
            }
        }

        if protocol == NetworkProtocol::Ftp {
            let data = &mut self.sockets[FTP_DATA_SOCKET_NUMBER as usize];
            data.set_role(SocketRole::FtpData);
            data.release(chip, responder);
        }
    }

    /// Close every socket of `protocol` and free its roles.
    pub fn shutdown_protocol(
        &mut self,
        protocol: NetworkProtocol,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
    ) {
        for socket in self.sockets.iter_mut() {
            if socket.role().protocol() == Some(protocol) {
                socket.terminate(chip, responder);
                socket.set_role(SocketRole::Free);
            }
        }
    }

    /// Close every socket, the DHCP socket included.
    ///
    /// The DHCP socket keeps its reservation.
    pub fn terminate_all(&mut self, chip: &mut dyn SocketChip, responder: &mut dyn Responder) {
        for socket in self.sockets.iter_mut() {
            socket.terminate(chip, responder);
            if socket.number() != DHCP_SOCKET_NUMBER {
                socket.set_role(SocketRole::Free);
            }
        }
    }

    /// Poll one TCP socket.
    pub fn poll(
        &mut self,
        socket: SocketNumber,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
        now: Instant,
        accept_timeout: Duration,
    ) -> PollOutcome {
        match self.sockets.get_mut(socket as usize) {
            Some(s) if s.role() != SocketRole::Dhcp => s.poll(chip, responder, now, accept_timeout),
            _ => PollOutcome::Idle,
        }
    }

    /// Listen for a passive FTP data connection on `port`.
    pub fn open_data_port(
        &mut self,
        port: Port,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
    ) -> Result<()> {
        let data = &mut self.sockets[FTP_DATA_SOCKET_NUMBER as usize];
        if data.role() != SocketRole::FtpData {
            return Err(NetworkError::ProtocolDisabled(NetworkProtocol::Ftp));
        }
        data.listen(chip, responder, port).map_err(NetworkError::from)
    }

    /// Free the passive FTP data socket; safe to call when already free.
    pub fn release_data_port(&mut self, chip: &mut dyn SocketChip, responder: &mut dyn Responder) {
        let data = &mut self.sockets[FTP_DATA_SOCKET_NUMBER as usize];
        if data.role() == SocketRole::FtpData {
            data.release(chip, responder);
        }
    }

    /// Socket behind a live session handle.
    pub fn session(&mut self, handle: SocketHandle) -> Result<&mut HardwareSocket> {
        match self.sockets.get_mut(handle.number() as usize) {
            Some(socket) if socket.owns(handle) => Ok(socket),
            _ => Err(NetworkError::StaleSocket),
        }
    }

    pub fn session_ref(&self, handle: SocketHandle) -> Result<&HardwareSocket> {
        match self.sockets.get(handle.number() as usize) {
            Some(socket) if socket.owns(handle) => Ok(socket),
            _ => Err(NetworkError::StaleSocket),
        }
    }

    /// Whether every socket with a role is free or holds its permitted role.
    pub fn roles_consistent(&self) -> bool {
        self.sockets.iter().all(|s| {
            s.role() == SocketRole::Free || s.role() == SocketRole::permitted_for(s.number())
        })
    }

    /// Whether no socket holds an application role.
    pub fn is_free(&self) -> bool {
        self.sockets
            .iter()
            .all(|s| matches!(s.role(), SocketRole::Free | SocketRole::Dhcp))
    }
}

impl Default for SocketPool {
    fn default() -> Self {
        Self::new()
    }
}
