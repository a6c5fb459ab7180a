//! Network error types
//!
//! Two tiers: [`NetworkError`] for operational failures that callers are
//! expected to handle or report, and [`ContractViolation`] for inputs that
//! break an API precondition.

use core::fmt;

use crate::driver::ChipError;
use crate::types::{NetworkProtocol, Port, SocketNumber, SocketRole};

pub type Result<T> = core::result::Result<T, NetworkError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Platform initialisation has not finished yet.
    NotActivated,
    /// Interface is disabled.
    InterfaceDisabled,
    /// Interface is up but has not reached the active state.
    NotActive,
    /// Port is already bound by another enabled protocol.
    PortConflict {
        protocol: NetworkProtocol,
        port: Port,
    },
    /// Port number 0 or out of range.
    InvalidPort(i32),
    /// Protocol required by the operation is disabled.
    ProtocolDisabled(NetworkProtocol),
    /// Socket handle refers to a session that has ended.
    StaleSocket,
    /// Session exists but is not connected (yet, or any more).
    SocketNotConnected,
    /// TLS/secure sockets requested.
    TlsNotSupported,
    /// Unknown interface mode.
    InvalidMode(i32),
    /// Chip-level failure.
    Chip(ChipError),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotActivated => write!(f, "Network not activated"),
            Self::InterfaceDisabled => write!(f, "Network is disabled"),
            Self::NotActive => write!(f, "Network is not active"),
            Self::PortConflict { protocol, port } => {
                write!(f, "Port {} is already in use by {}", port, protocol)
            }
            Self::InvalidPort(port) => write!(f, "Invalid port number {}", port),
            Self::ProtocolDisabled(protocol) => write!(f, "{} is disabled", protocol),
            Self::StaleSocket => write!(f, "Socket is no longer valid"),
            Self::SocketNotConnected => write!(f, "Socket not connected"),
            Self::TlsNotSupported => write!(f, "This interface does not support TLS"),
            Self::InvalidMode(mode) => write!(f, "Invalid network mode {}", mode),
            Self::Chip(err) => write!(f, "Chip error: {}", err),
        }
    }
}

impl From<ChipError> for NetworkError {
    fn from(err: ChipError) -> Self {
        NetworkError::Chip(err)
    }
}

/// Broken API precondition.
///
/// These indicate a bug in the caller. They are rejected at the boundary
/// and never reach the protocol or socket tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// Protocol number outside `0..NUM_PROTOCOLS`.
    InvalidProtocol(i32),
    /// Socket number outside the chip's range.
    InvalidSocket(SocketNumber),
    /// Role may never be held by this socket.
    RoleNotPermitted {
        socket: SocketNumber,
        role: SocketRole,
    },
    /// Address tuple was not exactly four bytes.
    AddressLength(usize),
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProtocol(raw) => write!(f, "Invalid protocol parameter {}", raw),
            Self::InvalidSocket(socket) => write!(f, "Invalid socket number {}", socket),
            Self::RoleNotPermitted { socket, role } => {
                write!(f, "Socket {} cannot take role {}", socket, role)
            }
            Self::AddressLength(len) => write!(f, "Address must be 4 bytes, got {}", len),
        }
    }
}
