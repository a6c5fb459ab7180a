//! Shared data types module.
//!
//! Socket numbering, protocol identifiers and socket roles for the
//! W5500's eight hardware socket engines.
//!
//! # Socket layout
//!
//! ```text
//! ┌────────┬────────┬────────┬────────┬────────┬────────┬────────┬────────┐
//! │   0    │   1    │   2    │   3    │   4    │   5    │   6    │   7    │
//! │  HTTP  │  HTTP  │  HTTP  │  HTTP  │  FTP   │FTP data│ Telnet │  DHCP  │
//! └────────┴────────┴────────┴────────┴────────┴────────┴────────┴────────┘
//!  └──────────────────── TCP, round-robin polled ───────────────┘  UDP
//! ```

pub mod result;

pub use result::CommandResult;

use core::fmt;

use crate::error::ContractViolation;

/// Hardware socket index on the chip.
pub type SocketNumber = u8;

/// TCP/UDP port number.
pub type Port = u16;

/// Number of hardware socket engines on the W5500.
pub const NUM_SOCKETS: usize = 8;

/// Sockets 0-3 serve HTTP.
pub const NUM_HTTP_SOCKETS: usize = 4;
pub const FTP_SOCKET_NUMBER: SocketNumber = 4;
pub const FTP_DATA_SOCKET_NUMBER: SocketNumber = 5;
pub const TELNET_SOCKET_NUMBER: SocketNumber = 6;

/// Sockets below this index are TCP and take part in round-robin polling.
pub const NUM_TCP_SOCKETS: usize = 7;

/// Permanently reserved for the DHCP client (UDP).
pub const DHCP_SOCKET_NUMBER: SocketNumber = 7;

/// Local UDP port used by the DHCP client.
pub const DHCP_CLIENT_PORT: Port = 68;

/// Number of application protocols that can be enabled or disabled.
pub const NUM_PROTOCOLS: usize = 3;

// ═══════════════════════════════════════════════════════════════════════════
// Protocols
// ═══════════════════════════════════════════════════════════════════════════

/// Application protocol served on one or more hardware sockets.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkProtocol {
    Http = 0,
    Ftp = 1,
    Telnet = 2,
}

impl NetworkProtocol {
    /// Every protocol, in table order.
    pub const ALL: [NetworkProtocol; NUM_PROTOCOLS] =
        [NetworkProtocol::Http, NetworkProtocol::Ftp, NetworkProtocol::Telnet];

    /// Convert a raw protocol number supplied by a command front end.
    ///
    /// Numbers outside `0..NUM_PROTOCOLS` are a contract violation, not an
    /// operational failure.
    pub fn from_raw(raw: i32) -> Result<Self, ContractViolation> {
        match raw {
            0 => Ok(NetworkProtocol::Http),
            1 => Ok(NetworkProtocol::Ftp),
            2 => Ok(NetworkProtocol::Telnet),
            _ => Err(ContractViolation::InvalidProtocol(raw)),
        }
    }

    /// Index into per-protocol tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            NetworkProtocol::Http => "HTTP",
            NetworkProtocol::Ftp => "FTP",
            NetworkProtocol::Telnet => "TELNET",
        }
    }

    /// Well-known port used when the caller does not name one.
    pub const fn default_port(self) -> Port {
        match self {
            NetworkProtocol::Http => 80,
            NetworkProtocol::Ftp => 21,
            NetworkProtocol::Telnet => 23,
        }
    }

    /// Role taken by the listening socket(s) of this protocol.
    pub const fn listener_role(self) -> SocketRole {
        match self {
            NetworkProtocol::Http => SocketRole::Http,
            NetworkProtocol::Ftp => SocketRole::FtpControl,
            NetworkProtocol::Telnet => SocketRole::Telnet,
        }
    }
}

impl fmt::Display for NetworkProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Socket roles
// ═══════════════════════════════════════════════════════════════════════════

/// Service a hardware socket is currently assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketRole {
    Free,
    Http,
    FtpControl,
    FtpData,
    Telnet,
    Dhcp,
}

impl SocketRole {
    pub const fn name(self) -> &'static str {
        match self {
            SocketRole::Free => "free",
            SocketRole::Http => "http",
            SocketRole::FtpControl => "ftp-control",
            SocketRole::FtpData => "ftp-data",
            SocketRole::Telnet => "telnet",
            SocketRole::Dhcp => "dhcp",
        }
    }

    /// Protocol that owns this role, if any.
    pub const fn protocol(self) -> Option<NetworkProtocol> {
        match self {
            SocketRole::Http => Some(NetworkProtocol::Http),
            SocketRole::FtpControl | SocketRole::FtpData => Some(NetworkProtocol::Ftp),
            SocketRole::Telnet => Some(NetworkProtocol::Telnet),
            SocketRole::Free | SocketRole::Dhcp => None,
        }
    }

    /// The only non-free role a given socket may ever hold.
    pub const fn permitted_for(socket: SocketNumber) -> SocketRole {
        match socket {
            0..=3 => SocketRole::Http,
            FTP_SOCKET_NUMBER => SocketRole::FtpControl,
            FTP_DATA_SOCKET_NUMBER => SocketRole::FtpData,
            TELNET_SOCKET_NUMBER => SocketRole::Telnet,
            _ => SocketRole::Dhcp,
        }
    }
}

impl fmt::Display for SocketRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
