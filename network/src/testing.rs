//! Simulated collaborators for unit tests.

extern crate std;

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use core::fmt;

use smoltcp::wire::EthernetAddress;

use crate::address::AddressStore;
use crate::config::NetworkConfig;
use crate::driver::{ChipError, DhcpClient, DhcpLease, DhcpStatus, SocketChip, SocketStatus};
use crate::platform::{Clock, MessageSink, MessageType};
use crate::responder::{Connection, Responder};
use crate::socket::SocketHandle;
use crate::stack::{NetworkInterface, W5500Interface};
use crate::state::NetworkState;
use crate::types::{NetworkProtocol, Port, SocketNumber, SocketRole, NUM_SOCKETS};

// ═══════════════════════════════════════════════════════════════════════════
// Chip
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct SimSocket {
    pub status: SocketStatus,
    pub port: Option<Port>,
    pub rx: Vec<u8>,
    pub tx: Vec<u8>,
    pub opens: u32,
    pub closes: u32,
}

impl Default for SimSocket {
    fn default() -> Self {
        Self {
            status: SocketStatus::Closed,
            port: None,
            rx: Vec::new(),
            tx: Vec::new(),
            opens: 0,
            closes: 0,
        }
    }
}

/// Chip model whose peers are driven by the test.
///
/// A graceful disconnect completes at once.
pub struct SimChip {
    pub link: bool,
    pub resets: u32,
    pub mac: Option<EthernetAddress>,
    pub configured: Option<AddressStore>,
    pub sockets: [SimSocket; NUM_SOCKETS],
    pub fail_open: bool,
    pub fail_reset: bool,
    pub fail_configure: bool,
}

impl SimChip {
    pub fn new() -> Self {
        Self {
            link: true,
            resets: 0,
            mac: None,
            configured: None,
            sockets: core::array::from_fn(|_| SimSocket::default()),
            fail_open: false,
            fail_reset: false,
            fail_configure: false,
        }
    }

    /// A peer connects to a listening socket.
    pub fn connect(&mut self, socket: SocketNumber) {
        let s = &mut self.sockets[socket as usize];
        assert_eq!(s.status, SocketStatus::Listen, "socket {} not listening", socket);
        s.status = SocketStatus::Established;
    }

    pub fn inject(&mut self, socket: SocketNumber, data: &[u8]) {
        self.sockets[socket as usize].rx.extend_from_slice(data);
    }

    pub fn peer_close(&mut self, socket: SocketNumber) {
        self.sockets[socket as usize].status = SocketStatus::CloseWait;
    }

    pub fn fault(&mut self, socket: SocketNumber) {
        self.sockets[socket as usize].status = SocketStatus::Fault;
    }

    pub fn sent(&self, socket: SocketNumber) -> &[u8] {
        &self.sockets[socket as usize].tx
    }
}

impl SocketChip for SimChip {
    fn reset(&mut self, mac: &EthernetAddress) -> Result<(), ChipError> {
        if self.fail_reset {
            return Err(ChipError::NotReady);
        }
        self.resets += 1;
        self.mac = Some(*mac);
        Ok(())
    }

    fn link_up(&mut self) -> bool {
        self.link
    }

    fn configure(&mut self, addresses: &AddressStore) -> Result<(), ChipError> {
        if self.fail_configure {
            return Err(ChipError::NotReady);
        }
        self.configured = Some(*addresses);
        Ok(())
    }

    fn open_tcp_listener(&mut self, socket: SocketNumber, port: Port) -> Result<(), ChipError> {
        if self.fail_open {
            return Err(ChipError::Fault);
        }
        let s = self.sockets.get_mut(socket as usize).ok_or(ChipError::InvalidSocket)?;
        s.status = SocketStatus::Listen;
        s.port = Some(port);
        s.rx.clear();
        s.opens += 1;
        Ok(())
    }

    fn open_udp(&mut self, socket: SocketNumber, port: Port) -> Result<(), ChipError> {
        let s = self.sockets.get_mut(socket as usize).ok_or(ChipError::InvalidSocket)?;
        s.status = SocketStatus::Udp;
        s.port = Some(port);
        s.opens += 1;
        Ok(())
    }

    fn status(&mut self, socket: SocketNumber) -> SocketStatus {
        self.sockets[socket as usize].status
    }

    fn rx_pending(&mut self, socket: SocketNumber) -> usize {
        self.sockets[socket as usize].rx.len()
    }

    fn receive(&mut self, socket: SocketNumber, buf: &mut [u8]) -> Result<usize, ChipError> {
        let s = &mut self.sockets[socket as usize];
        let n = s.rx.len().min(buf.len());
        buf[..n].copy_from_slice(&s.rx[..n]);
        s.rx.drain(..n);
        Ok(n)
    }

    fn tx_free(&mut self, _socket: SocketNumber) -> usize {
        2048
    }

    fn send(&mut self, socket: SocketNumber, data: &[u8]) -> Result<usize, ChipError> {
        let s = &mut self.sockets[socket as usize];
        match s.status {
            SocketStatus::Established | SocketStatus::CloseWait => {
                s.tx.extend_from_slice(data);
                Ok(data.len())
            }
            _ => Err(ChipError::WrongState),
        }
    }

    fn disconnect(&mut self, socket: SocketNumber) -> Result<(), ChipError> {
        self.sockets[socket as usize].status = SocketStatus::Closed;
        Ok(())
    }

    fn close(&mut self, socket: SocketNumber) {
        let s = &mut self.sockets[socket as usize];
        s.status = SocketStatus::Closed;
        s.port = None;
        s.closes += 1;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DHCP
// ═══════════════════════════════════════════════════════════════════════════

/// DHCP client that acknowledges after a fixed number of runs.
///
/// Entries pushed onto `script` are returned first, one per run.
pub struct SimDhcp {
    pub lease: DhcpLease,
    pub ack_after: u32,
    pub runs: u32,
    pub starts: u32,
    pub stops: u32,
    pub ticks: u32,
    pub hostname: String,
    pub active: bool,
    pub assigned: bool,
    pub script: VecDeque<DhcpStatus>,
}

impl SimDhcp {
    pub fn new(ack_after: u32) -> Self {
        Self {
            lease: DhcpLease {
                ip: [192, 168, 1, 50],
                netmask: [255, 255, 255, 0],
                gateway: [192, 168, 1, 1],
                lease_secs: 3600,
            },
            ack_after,
            runs: 0,
            starts: 0,
            stops: 0,
            ticks: 0,
            hostname: String::new(),
            active: false,
            assigned: false,
            script: VecDeque::new(),
        }
    }
}

impl DhcpClient for SimDhcp {
    fn start(
        &mut self,
        chip: &mut dyn SocketChip,
        socket: SocketNumber,
        _mac: &EthernetAddress,
        hostname: &str,
    ) -> Result<(), ChipError> {
        chip.open_udp(socket, crate::types::DHCP_CLIENT_PORT)?;
        self.starts += 1;
        self.runs = 0;
        self.active = true;
        self.assigned = false;
        self.hostname = String::from(hostname);
        Ok(())
    }

    fn time_tick(&mut self) {
        self.ticks += 1;
    }

    fn run(&mut self, _chip: &mut dyn SocketChip) -> DhcpStatus {
        if !self.active {
            return DhcpStatus::Stopped;
        }
        if let Some(status) = self.script.pop_front() {
            return status;
        }
        self.runs += 1;
        if self.assigned {
            DhcpStatus::Leased
        } else if self.runs >= self.ack_after {
            self.assigned = true;
            DhcpStatus::Assigned(self.lease)
        } else {
            DhcpStatus::Running
        }
    }

    fn stop(&mut self, chip: &mut dyn SocketChip) {
        chip.close(crate::types::DHCP_SOCKET_NUMBER);
        self.active = false;
        self.stops += 1;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Platform
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct SimPlatform {
    pub now: u64,
    pub messages: Vec<(MessageType, String)>,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, m)| m.contains(needle))
    }

    /// Everything written so far, concatenated.
    pub fn text(&self) -> String {
        self.messages.iter().map(|(_, m)| m.as_str()).collect()
    }
}

impl Clock for SimPlatform {
    fn now_ms(&self) -> u64 {
        self.now
    }
}

impl MessageSink for SimPlatform {
    fn message(&mut self, mtype: MessageType, args: fmt::Arguments<'_>) {
        self.messages.push((mtype, std::format!("{}", args)));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Responder
// ═══════════════════════════════════════════════════════════════════════════

/// Records everything it sees and echoes inbound bytes by default.
pub struct EchoResponder {
    pub accepting: bool,
    pub echo: bool,
    pub close_after_flush: bool,
    pub accepted: Vec<SocketHandle>,
    pub roles: Vec<SocketRole>,
    pub received: Vec<u8>,
    pub ended: Vec<SocketHandle>,
    pub started: Vec<NetworkProtocol>,
    pub stopped: Vec<NetworkProtocol>,
    pub outbox: Vec<u8>,
}

impl EchoResponder {
    pub fn new() -> Self {
        Self {
            accepting: true,
            echo: true,
            close_after_flush: false,
            accepted: Vec::new(),
            roles: Vec::new(),
            received: Vec::new(),
            ended: Vec::new(),
            started: Vec::new(),
            stopped: Vec::new(),
            outbox: Vec::new(),
        }
    }
}

impl Responder for EchoResponder {
    fn start(&mut self, protocol: NetworkProtocol) {
        self.started.push(protocol);
    }

    fn stop(&mut self, protocol: NetworkProtocol) {
        self.stopped.push(protocol);
    }

    fn accept(&mut self, handle: SocketHandle, role: SocketRole) -> bool {
        if self.accepting {
            self.accepted.push(handle);
            self.roles.push(role);
        }
        self.accepting
    }

    fn deliver(&mut self, conn: &mut Connection<'_>, data: &[u8]) {
        self.received.extend_from_slice(data);
        if self.echo {
            let _ = conn.send(data);
        }
    }

    fn flush(&mut self, conn: &mut Connection<'_>) {
        if !self.outbox.is_empty() {
            if let Ok(n) = conn.send(&self.outbox) {
                self.outbox.drain(..n);
            }
        }
        if self.close_after_flush {
            conn.close();
        }
    }

    fn session_ended(&mut self, handle: SocketHandle) {
        self.ended.push(handle);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Interface fixtures
// ═══════════════════════════════════════════════════════════════════════════

pub type SimInterface = W5500Interface<SimChip, SimDhcp, SimPlatform, EchoResponder>;

/// Activated interface, not yet started.
pub fn interface(config: NetworkConfig, ack_after: u32) -> SimInterface {
    let mut iface = W5500Interface::new(
        SimChip::new(),
        SimDhcp::new(ack_after),
        SimPlatform::new(),
        EchoResponder::new(),
        config,
    );
    iface.activate();
    iface
}

/// Run full ticks until `state` is reached, 100 ms apart.
pub fn spin_until(iface: &mut SimInterface, state: NetworkState) {
    for _ in 0..64 {
        if iface.state() == state {
            return;
        }
        tick(iface, true);
    }
    panic!("interface stuck in {}", iface.state());
}

pub fn tick(iface: &mut SimInterface, full: bool) {
    iface.platform_mut().now += 100;
    iface.spin(full);
}

/// Started DHCP interface brought all the way up.
pub fn active_interface() -> SimInterface {
    let mut iface = interface(NetworkConfig::dhcp(), 1);
    iface.start();
    spin_until(&mut iface, NetworkState::Active);
    iface
}
