//! IPv4 address configuration.
//!
//! Holds the interface's IP address, netmask and gateway as raw
//! network-order octets. Only the byte count is validated; whether the
//! gateway is reachable under the netmask is the caller's business.

use core::fmt;

use smoltcp::wire::{Ipv4Address, Ipv4Cidr};

use crate::error::ContractViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressStore {
    ip: Ipv4Address,
    netmask: Ipv4Address,
    gateway: Ipv4Address,
}

impl AddressStore {
    /// All-zero configuration. An unspecified IP selects DHCP at start.
    pub const fn unconfigured() -> Self {
        Self {
            ip: Ipv4Address::UNSPECIFIED,
            netmask: Ipv4Address::UNSPECIFIED,
            gateway: Ipv4Address::UNSPECIFIED,
        }
    }

    pub const fn new(ip: [u8; 4], netmask: [u8; 4], gateway: [u8; 4]) -> Self {
        Self {
            ip: Ipv4Address(ip),
            netmask: Ipv4Address(netmask),
            gateway: Ipv4Address(gateway),
        }
    }

    /// Replace all three tuples.
    pub fn set(&mut self, ip: [u8; 4], netmask: [u8; 4], gateway: [u8; 4]) {
        *self = Self::new(ip, netmask, gateway);
    }

    /// Replace all three tuples from untyped byte slices.
    ///
    /// Each slice must be exactly four bytes long; nothing is changed
    /// otherwise.
    pub fn set_from_slices(
        &mut self,
        ip: &[u8],
        netmask: &[u8],
        gateway: &[u8],
    ) -> Result<(), ContractViolation> {
        for tuple in [ip, netmask, gateway] {
            if tuple.len() != 4 {
                return Err(ContractViolation::AddressLength(tuple.len()));
            }
        }
        self.ip = Ipv4Address::from_bytes(ip);
        self.netmask = Ipv4Address::from_bytes(netmask);
        self.gateway = Ipv4Address::from_bytes(gateway);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::unconfigured();
    }

    pub fn ip(&self) -> Ipv4Address {
        self.ip
    }

    pub fn netmask(&self) -> Ipv4Address {
        self.netmask
    }

    pub fn gateway(&self) -> Ipv4Address {
        self.gateway
    }

    pub fn ip_octets(&self) -> [u8; 4] {
        self.ip.0
    }

    /// True when no IP address has been assigned.
    pub fn is_unspecified(&self) -> bool {
        self.ip.is_unspecified()
    }

    /// Prefix length, if the netmask is contiguous.
    pub fn prefix_len(&self) -> Option<u8> {
        Ipv4Cidr::from_netmask(self.ip, self.netmask)
            .ok()
            .map(|cidr| cidr.prefix_len())
    }
}

impl Default for AddressStore {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl fmt::Display for AddressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len() {
            Some(prefix) => write!(f, "{}/{}", self.ip, prefix)?,
            None => write!(f, "{} netmask {}", self.ip, self.netmask)?,
        }
        write!(f, " gateway {}", self.gateway)
    }
}
