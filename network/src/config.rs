//! Interface configuration.
//!
//! Boot-time settings handed to the interface by the platform. Persisting
//! them is the platform's job.

use core::fmt;

use smoltcp::wire::EthernetAddress;

use crate::types::{NetworkProtocol, Port, NUM_PROTOCOLS};

/// Port used for each protocol when none is given.
pub const DEFAULT_PORTS: [Port; NUM_PROTOCOLS] = [
    NetworkProtocol::Http.default_port(),
    NetworkProtocol::Ftp.default_port(),
    NetworkProtocol::Telnet.default_port(),
];

/// Protocols enabled after `init`: HTTP only.
pub const DEFAULT_PROTOCOL_ENABLED: [bool; NUM_PROTOCOLS] = [true, false, false];

/// Locally administered fallback MAC.
pub const DEFAULT_MAC_ADDRESS: EthernetAddress =
    EthernetAddress([0xBE, 0xEF, 0xDE, 0xAD, 0xFE, 0xED]);

pub const MAX_HOSTNAME_LEN: usize = 32;

/// Timing parameters, all in milliseconds unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// DHCP timer granularity; the lease clock advances once per interval.
    pub dhcp_tick_ms: u64,
    /// How long an established connection may wait for a responder.
    pub responder_accept_ms: u64,
    /// Consecutive link-up probes required before the link counts as stable.
    pub link_stable_probes: u8,
}

impl Timeouts {
    pub const fn new() -> Self {
        Self {
            dhcp_tick_ms: 1000,
            responder_accept_ms: 2000,
            link_stable_probes: 2,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::new()
    }
}

/// Hostname announced to the DHCP server.
///
/// Stored inline; characters other than ASCII letters, digits and `-` are
/// dropped and anything past [`MAX_HOSTNAME_LEN`] is cut.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Hostname {
    bytes: [u8; MAX_HOSTNAME_LEN],
    len: u8,
}

impl Hostname {
    pub fn new(name: &str) -> Self {
        let mut hostname = Self {
            bytes: [0; MAX_HOSTNAME_LEN],
            len: 0,
        };
        for b in name.bytes() {
            if hostname.len as usize == MAX_HOSTNAME_LEN {
                break;
            }
            if b.is_ascii_alphanumeric() || b == b'-' {
                hostname.bytes[hostname.len as usize] = b;
                hostname.len += 1;
            }
        }
        hostname
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Hostname {
    fn default() -> Self {
        Self::new("duet")
    }
}

impl fmt::Debug for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hostname({:?})", self.as_str())
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network interface configuration.
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    /// Static IP; all zeros selects DHCP.
    pub ip: [u8; 4],
    pub netmask: [u8; 4],
    pub gateway: [u8; 4],
    pub mac: EthernetAddress,
    pub hostname: Hostname,
    /// Whether `init` leaves the interface enabled rather than disabled.
    pub start_enabled: bool,
    pub timeouts: Timeouts,
}

impl NetworkConfig {
    /// Obtain the address by DHCP.
    pub fn dhcp() -> Self {
        Self {
            ip: [0; 4],
            netmask: [0; 4],
            gateway: [0; 4],
            mac: DEFAULT_MAC_ADDRESS,
            hostname: Hostname::default(),
            start_enabled: true,
            timeouts: Timeouts::new(),
        }
    }

    /// Fixed address.
    pub fn fixed(ip: [u8; 4], netmask: [u8; 4], gateway: [u8; 4]) -> Self {
        Self {
            ip,
            netmask,
            gateway,
            ..Self::dhcp()
        }
    }

    pub fn with_mac(mut self, mac: [u8; 6]) -> Self {
        self.mac = EthernetAddress(mac);
        self
    }

    pub fn with_hostname(mut self, name: &str) -> Self {
        self.hostname = Hostname::new(name);
        self
    }

    pub fn disabled_at_boot(mut self) -> Self {
        self.start_enabled = false;
        self
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::dhcp()
    }
}
