//! Driver trait definitions.
//!
//! The register-level W5500 driver and the DHCP exchange live outside
//! this crate. These traits are the whole of what the interface asks of
//! them.

use core::fmt;

use smoltcp::wire::EthernetAddress;

use crate::address::AddressStore;
use crate::types::{Port, SocketNumber};

/// Chip-level error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipError {
    /// Chip not responding or not yet reset.
    NotReady,
    /// Socket number outside the chip's range.
    InvalidSocket,
    /// Socket is not in a state that allows the operation.
    WrongState,
    /// Peer reset the connection.
    ResetByPeer,
    /// SPI transfer or register fault.
    Fault,
}

impl fmt::Display for ChipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "chip not ready"),
            Self::InvalidSocket => write!(f, "invalid socket"),
            Self::WrongState => write!(f, "socket in wrong state"),
            Self::ResetByPeer => write!(f, "connection reset by peer"),
            Self::Fault => write!(f, "chip fault"),
        }
    }
}

/// Hardware socket status (mirrors the W5500 `Sn_SR` register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketStatus {
    /// Socket is closed
    Closed,
    /// Opened in TCP mode, not yet listening
    Init,
    /// Waiting for a connection
    Listen,
    /// Connection established
    Established,
    /// Peer has sent FIN
    CloseWait,
    /// Local close in progress (FIN_WAIT, LAST_ACK, TIME_WAIT)
    Closing,
    /// Opened in UDP mode
    Udp,
    /// Chip reported an error for this socket
    Fault,
}

impl SocketStatus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Init => "init",
            Self::Listen => "listen",
            Self::Established => "established",
            Self::CloseWait => "close-wait",
            Self::Closing => "closing",
            Self::Udp => "udp",
            Self::Fault => "fault",
        }
    }
}

/// Per-socket primitives of the Ethernet chip.
///
/// Every method MUST return immediately; the interface is polled from the
/// motion controller's main loop and cannot wait on the SPI bus.
pub trait SocketChip {
    /// Hard-reset the chip and load the common registers.
    fn reset(&mut self, mac: &EthernetAddress) -> Result<(), ChipError>;

    /// Physical link state from the PHY.
    fn link_up(&mut self) -> bool;

    /// Load IP, netmask and gateway into the chip.
    fn configure(&mut self, addresses: &AddressStore) -> Result<(), ChipError>;

    /// Open `socket` in TCP mode and start listening on `port`.
    fn open_tcp_listener(&mut self, socket: SocketNumber, port: Port) -> Result<(), ChipError>;

    /// Open `socket` in UDP mode bound to `port`.
    fn open_udp(&mut self, socket: SocketNumber, port: Port) -> Result<(), ChipError>;

    fn status(&mut self, socket: SocketNumber) -> SocketStatus;

    /// Bytes waiting in the socket's receive buffer.
    fn rx_pending(&mut self, socket: SocketNumber) -> usize;

    /// Copy received bytes into `buf`; returns the count copied.
    fn receive(&mut self, socket: SocketNumber, buf: &mut [u8]) -> Result<usize, ChipError>;

    /// Free space in the socket's transmit buffer.
    fn tx_free(&mut self, socket: SocketNumber) -> usize;

    /// Queue bytes for transmission; returns the count accepted.
    fn send(&mut self, socket: SocketNumber, data: &[u8]) -> Result<usize, ChipError>;

    /// Begin a graceful close (FIN).
    fn disconnect(&mut self, socket: SocketNumber) -> Result<(), ChipError>;

    /// Close immediately, discarding buffered data.
    fn close(&mut self, socket: SocketNumber);
}

/// Address lease granted by a DHCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhcpLease {
    pub ip: [u8; 4],
    pub netmask: [u8; 4],
    pub gateway: [u8; 4],
    /// Lease duration in seconds.
    pub lease_secs: u32,
}

impl DhcpLease {
    pub fn addresses(&self) -> AddressStore {
        AddressStore::new(self.ip, self.netmask, self.gateway)
    }
}

/// Result of running the DHCP client once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpStatus {
    /// Exchange in progress, no address yet.
    Running,
    /// First address assigned.
    Assigned(DhcpLease),
    /// Lease renewed with a different address.
    Changed(DhcpLease),
    /// Lease held (or renewed unchanged).
    Leased,
    /// Exchange failed; the client will retry.
    Failed,
    /// Client not started.
    Stopped,
}

/// DHCP exchange run over the reserved UDP socket.
///
/// Packet building and parsing is the implementor's concern.
pub trait DhcpClient {
    /// Open `socket` and begin discovery.
    fn start(
        &mut self,
        chip: &mut dyn SocketChip,
        socket: SocketNumber,
        mac: &EthernetAddress,
        hostname: &str,
    ) -> Result<(), ChipError>;

    /// Advance the lease clock by one timer interval.
    fn time_tick(&mut self);

    /// Make one step of progress.
    fn run(&mut self, chip: &mut dyn SocketChip) -> DhcpStatus;

    /// Abandon the exchange and close the socket.
    fn stop(&mut self, chip: &mut dyn SocketChip);
}
