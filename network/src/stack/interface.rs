//! W5500 network interface.
//!
//! Owns every table the driver keeps and advances them from the host's
//! control loop:
//! - link bring-up and loss detection
//! - static or DHCP addressing over the reserved UDP socket
//! - protocol enable/disable against the fixed socket partition
//! - one socket's worth of I/O per tick
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      W5500Interface                         │
//! │  LinkStateMachine · ProtocolTable · DataPortController      │
//! └─────────────────────────────────────────────────────────────┘
//!            │ full ticks                     │ every tick
//!            ▼                                ▼
//! ┌──────────────────────┐    ┌─────────────────────────────────┐
//! │ DhcpClient           │    │ PollScheduler → SocketPool      │
//! │ (UDP socket 7)       │    │ (TCP sockets 0-6) → Responder   │
//! └──────────────────────┘    └─────────────────────────────────┘
//!            │                                │
//!            ▼                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SocketChip (SPI registers)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use smoltcp::time::{Duration, Instant};
use smoltcp::wire::{EthernetAddress, Ipv4Address};

use crate::address::AddressStore;
use crate::config::{Hostname, NetworkConfig};
use crate::driver::{DhcpClient, DhcpLease, DhcpStatus, SocketChip};
use crate::error::{NetworkError, Result};
use crate::mainloop::{PollScheduler, TickGate};
use crate::platform::{MessageType, Platform};
use crate::protocol::ProtocolTable;
use crate::responder::Responder;
use crate::socket::{ConnState, PollOutcome, SocketHandle, SocketPool};
use crate::state::{DataPortController, LinkStateMachine, LinkTransition, NetworkState};
use crate::types::{
    CommandResult, NetworkProtocol, Port, SocketRole, DHCP_SOCKET_NUMBER, FTP_DATA_SOCKET_NUMBER,
};
use crate::utils::Reply;

use super::NetworkInterface;

/// Network interface over a W5500.
///
/// Exactly one per physical adapter, created at boot and never
/// reallocated. Every collaborator is passed in, so the same code runs
/// against real hardware and against simulations.
pub struct W5500Interface<C, D, P, R>
where
    C: SocketChip,
    D: DhcpClient,
    P: Platform,
    R: Responder,
{
    chip: C,
    dhcp: D,
    platform: P,
    responder: R,
    config: NetworkConfig,
    link: LinkStateMachine,
    sockets: SocketPool,
    protocols: ProtocolTable,
    scheduler: PollScheduler,
    data_port: DataPortController,
    /// Gates the DHCP lease clock.
    dhcp_timer: TickGate,
    addresses: AddressStore,
    mac: EthernetAddress,
    hostname: Hostname,
    activated: bool,
    using_dhcp: bool,
    /// The stored address came from a lease, not from configuration.
    leased_address: bool,
    chip_ready: bool,
    dhcp_running: bool,
    dhcp_failures: u32,
    link_losses: u32,
}

impl<C, D, P, R> W5500Interface<C, D, P, R>
where
    C: SocketChip,
    D: DhcpClient,
    P: Platform,
    R: Responder,
{
    pub fn new(chip: C, dhcp: D, platform: P, responder: R, config: NetworkConfig) -> Self {
        let mut iface = Self {
            chip,
            dhcp,
            platform,
            responder,
            config,
            link: LinkStateMachine::new(config.timeouts.link_stable_probes),
            sockets: SocketPool::new(),
            protocols: ProtocolTable::default(),
            scheduler: PollScheduler::new(),
            data_port: DataPortController::new(),
            dhcp_timer: TickGate::new(Duration::from_millis(config.timeouts.dhcp_tick_ms)),
            addresses: AddressStore::unconfigured(),
            mac: config.mac,
            hostname: config.hostname,
            activated: false,
            using_dhcp: false,
            leased_address: false,
            chip_ready: false,
            dhcp_running: false,
            dhcp_failures: 0,
            link_losses: 0,
        };
        iface.init();
        iface
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> NetworkState {
        self.link.state()
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn using_dhcp(&self) -> bool {
        self.using_dhcp
    }

    pub fn addresses(&self) -> &AddressStore {
        &self.addresses
    }

    pub fn mac_address(&self) -> EthernetAddress {
        self.mac
    }

    pub fn hostname(&self) -> &str {
        self.hostname.as_str()
    }

    pub fn protocols(&self) -> &ProtocolTable {
        &self.protocols
    }

    pub fn sockets(&self) -> &SocketPool {
        &self.sockets
    }

    pub fn data_port(&self) -> &DataPortController {
        &self.data_port
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn dhcp_failures(&self) -> u32 {
        self.dhcp_failures
    }

    pub fn link_losses(&self) -> u32 {
        self.link_losses
    }

    pub fn chip(&self) -> &C {
        &self.chip
    }

    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }

    pub fn dhcp_client(&self) -> &D {
        &self.dhcp
    }

    pub fn dhcp_client_mut(&mut self) -> &mut D {
        &mut self.dhcp
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    pub fn responder_mut(&mut self) -> &mut R {
        &mut self.responder
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Responder socket I/O
    // ═══════════════════════════════════════════════════════════════════════

    /// Send on a session outside a responder callback.
    pub fn send(&mut self, handle: SocketHandle, data: &[u8]) -> Result<usize> {
        let socket = self.sockets.session_ref(handle)?;
        if !socket.is_connected() {
            return Err(NetworkError::SocketNotConnected);
        }
        Ok(self.chip.send(socket.number(), data)?)
    }

    /// Start a graceful close of a session.
    pub fn close_connection(&mut self, handle: SocketHandle) -> Result<()> {
        let socket = self.sockets.session(handle)?;
        Ok(socket.close_session(&mut self.chip)?)
    }

    pub fn connection_state(&self, handle: SocketHandle) -> Result<ConnState> {
        Ok(self.sockets.session_ref(handle)?.state())
    }

    /// Store a static address. Loaded into the chip at once when the
    /// interface is up on static addressing, otherwise at the next start.
    ///
    /// While a DHCP lease is in use, later lease updates no longer replace
    /// the stored address. Still waiting for a lease, the interface drops
    /// DHCP and takes the static address on the next full tick.
    pub fn set_ip_address(&mut self, ip: [u8; 4], netmask: [u8; 4], gateway: [u8; 4]) {
        self.addresses.set(ip, netmask, gateway);
        self.leased_address = false;
        if self.using_dhcp
            && self.link.state() == NetworkState::ObtainingIp
            && !self.addresses.is_unspecified()
        {
            self.stop_dhcp();
            self.using_dhcp = false;
        }
        if !self.using_dhcp && self.link.state() >= NetworkState::Connected {
            self.configure_chip();
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tick internals
    // ═══════════════════════════════════════════════════════════════════════

    fn now(&self) -> Instant {
        Instant::from_millis(self.platform.now_ms() as i64)
    }

    fn step_link(&mut self, now: Instant) {
        match self.link.state() {
            NetworkState::Disabled => {}
            NetworkState::Enabled => {
                if !self.activated || !self.reset_chip() {
                    return;
                }
                let link_up = self.chip.link_up();
                if let LinkTransition::Entered(_) = self.link.probe(link_up) {
                    log::info!("link detected");
                }
            }
            NetworkState::EstablishingLink => {
                let link_up = self.chip.link_up();
                if let LinkTransition::Entered(NetworkState::ObtainingIp) = self.link.probe(link_up) {
                    if self.using_dhcp {
                        self.start_dhcp(now);
                    } else {
                        self.apply_static_address();
                    }
                }
            }
            NetworkState::ObtainingIp => {
                if !self.probe_link() {
                    return;
                }
                if self.using_dhcp {
                    self.run_dhcp(now);
                } else {
                    self.apply_static_address();
                }
            }
            NetworkState::Connected => {
                if self.probe_link() {
                    self.init_sockets();
                }
            }
            NetworkState::Active => {
                if self.probe_link() && self.using_dhcp {
                    self.run_dhcp(now);
                }
            }
        }
    }

    fn reset_chip(&mut self) -> bool {
        if self.chip_ready {
            return true;
        }
        match self.chip.reset(&self.mac) {
            Ok(()) => {
                log::debug!("chip reset, MAC {}", self.mac);
                self.chip_ready = true;
                true
            }
            Err(err) => {
                log::warn!("chip reset failed: {}", err);
                false
            }
        }
    }

    /// Returns whether the link is still up.
    fn probe_link(&mut self) -> bool {
        let link_up = self.chip.link_up();
        match self.link.probe(link_up) {
            LinkTransition::Lost(from) => {
                self.link_lost(from);
                false
            }
            _ => true,
        }
    }

    fn link_lost(&mut self, from: NetworkState) {
        self.link_losses = self.link_losses.saturating_add(1);
        log::warn!("link lost while {}", from);
        self.terminate_sockets(from == NetworkState::Active);
        self.stop_dhcp();
        self.drop_lease();
    }

    /// Forget a DHCP-derived address. Configured addresses are kept.
    fn drop_lease(&mut self) {
        if core::mem::take(&mut self.leased_address) {
            self.addresses.clear();
        }
    }

    /// Static address stored while DHCP was in charge.
    fn static_pending(&self) -> bool {
        !self.leased_address && !self.addresses.is_unspecified()
    }

    fn configure_chip(&mut self) -> bool {
        match self.chip.configure(&self.addresses) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("cannot load {} into chip: {}", self.addresses, err);
                false
            }
        }
    }

    fn apply_static_address(&mut self) {
        if self.configure_chip() {
            log::info!("static address {}", self.addresses);
            self.link.address_acquired();
        }
    }

    fn start_dhcp(&mut self, now: Instant) {
        let started = self.dhcp.start(
            &mut self.chip,
            DHCP_SOCKET_NUMBER,
            &self.mac,
            self.hostname.as_str(),
        );
        match started {
            Ok(()) => {
                log::debug!("DHCP started as {}", self.hostname);
                self.dhcp_running = true;
                self.dhcp_timer.reset(now);
            }
            Err(err) => {
                self.dhcp_failures = self.dhcp_failures.saturating_add(1);
                log::warn!("DHCP start failed: {}", err);
            }
        }
    }

    fn stop_dhcp(&mut self) {
        if core::mem::take(&mut self.dhcp_running) {
            self.dhcp.stop(&mut self.chip);
        }
    }

    fn run_dhcp(&mut self, now: Instant) {
        if !self.dhcp_running {
            self.start_dhcp(now);
            return;
        }
        if self.dhcp_timer.due(now) {
            self.dhcp.time_tick();
        }
        match self.dhcp.run(&mut self.chip) {
            DhcpStatus::Leased if self.link.state() == NetworkState::ObtainingIp => {
                // Lease held but the chip refused it last time
                if self.leased_address && self.configure_chip() {
                    self.link.address_acquired();
                }
            }
            DhcpStatus::Running | DhcpStatus::Leased => {}
            DhcpStatus::Assigned(lease) | DhcpStatus::Changed(lease) => self.lease_received(lease),
            DhcpStatus::Failed => {
                self.dhcp_failures = self.dhcp_failures.saturating_add(1);
                log::warn!("DHCP exchange failed, retrying");
            }
            DhcpStatus::Stopped => self.dhcp_running = false,
        }
    }

    fn lease_received(&mut self, lease: DhcpLease) {
        let addresses = lease.addresses();
        if self.static_pending() {
            log::debug!("DHCP lease {} ignored, static {} pending", addresses, self.addresses);
            return;
        }
        match self.link.state() {
            NetworkState::ObtainingIp => {
                self.addresses = addresses;
                self.leased_address = true;
                log::info!("DHCP lease {} for {} s", addresses, lease.lease_secs);
                if self.configure_chip() {
                    self.link.address_acquired();
                }
            }
            state @ (NetworkState::Connected | NetworkState::Active) if addresses != self.addresses => {
                log::info!("DHCP address changed from {} to {}", self.addresses.ip(), addresses.ip());
                let was_active = state == NetworkState::Active;
                self.terminate_sockets(was_active);
                self.addresses = addresses;
                self.leased_address = true;
                if !self.configure_chip() {
                    // Ask again from scratch once the chip takes writes
                    self.stop_dhcp();
                    self.link.address_lost();
                    return;
                }
                if was_active {
                    self.start_protocols();
                    self.announce();
                }
            }
            _ => {}
        }
    }

    /// Connected → Active.
    fn init_sockets(&mut self) {
        self.start_protocols();
        self.link.sockets_ready();
        self.announce();
    }

    fn announce(&mut self) {
        let ip = self.addresses.ip();
        self.platform.message(
            MessageType::NetworkInfo,
            format_args!("Network running, IP address = {}\n", ip),
        );
    }

    fn start_protocols(&mut self) {
        for protocol in NetworkProtocol::ALL {
            if self.protocols.is_enabled(protocol) {
                self.start_protocol(protocol);
            }
        }
    }

    fn start_protocol(&mut self, protocol: NetworkProtocol) {
        let port = self.protocols.port(protocol);
        self.sockets
            .start_protocol(protocol, port, &mut self.chip, &mut self.responder);
        self.responder.start(protocol);
        log::info!("{} started on port {}", protocol, port);
    }

    fn shutdown_protocol(&mut self, protocol: NetworkProtocol) {
        if protocol == NetworkProtocol::Ftp {
            self.data_port.terminate();
        }
        self.sockets
            .shutdown_protocol(protocol, &mut self.chip, &mut self.responder);
        self.responder.stop(protocol);
        log::info!("{} stopped", protocol);
    }

    /// Close every socket. `notify` tells responders their protocols
    /// stopped.
    fn terminate_sockets(&mut self, notify: bool) {
        if notify {
            for protocol in NetworkProtocol::ALL {
                if self.protocols.is_enabled(protocol) {
                    self.responder.stop(protocol);
                }
            }
        }
        self.sockets.terminate_all(&mut self.chip, &mut self.responder);
        self.data_port.terminate();
    }

    fn poll_next_socket(&mut self, now: Instant) {
        let socket = self.scheduler.next_socket();
        let accept_timeout = Duration::from_millis(self.config.timeouts.responder_accept_ms);
        let outcome = self
            .sockets
            .poll(socket, &mut self.chip, &mut self.responder, now, accept_timeout);
        match outcome {
            PollOutcome::PeerClosed if socket == FTP_DATA_SOCKET_NUMBER => {
                self.data_port.peer_closing();
            }
            PollOutcome::Reset => log::debug!("socket {} reset after chip error", socket),
            _ => {}
        }
    }
}

impl<C, D, P, R> NetworkInterface for W5500Interface<C, D, P, R>
where
    C: SocketChip,
    D: DhcpClient,
    P: Platform,
    R: Responder,
{
    fn init(&mut self) {
        let config = self.config;
        self.link = LinkStateMachine::new(config.timeouts.link_stable_probes);
        if config.start_enabled {
            self.link.start();
        }
        self.sockets = SocketPool::new();
        self.protocols = ProtocolTable::default();
        self.scheduler.reset();
        self.data_port = DataPortController::new();
        self.addresses = AddressStore::new(config.ip, config.netmask, config.gateway);
        self.mac = config.mac;
        self.hostname = config.hostname;
        self.activated = false;
        self.using_dhcp = self.addresses.is_unspecified();
        self.leased_address = false;
        self.chip_ready = false;
        self.dhcp_running = false;
        self.dhcp_failures = 0;
        self.link_losses = 0;
    }

    fn activate(&mut self) {
        if !self.activated {
            self.activated = true;
            log::info!("network activated, {}", self.link.state());
        }
    }

    fn exit(&mut self) {
        self.stop();
        self.activated = false;
    }

    fn spin(&mut self, full: bool) {
        let now = self.now();
        if full {
            self.step_link(now);
        }
        if self.link.state() == NetworkState::Active {
            self.poll_next_socket(now);
        }
    }

    fn diagnostics(&mut self, mtype: MessageType) {
        let state = self.link.state();
        let sink = &mut self.platform;
        sink.message(
            mtype,
            format_args!("= Network =\nInterface state: {} ({})\n", state, state.ordinal()),
        );
        sink.message(
            mtype,
            format_args!(
                "Activated: {}, addressing: {}\n",
                if self.activated { "yes" } else { "no" },
                if self.using_dhcp { "DHCP" } else { "static" }
            ),
        );
        sink.message(
            mtype,
            format_args!("Address: {}\nMAC address: {}\n", self.addresses, self.mac),
        );
        sink.message(
            mtype,
            format_args!(
                "Hostname: {}, DHCP failures: {}, link losses: {}\n",
                self.hostname, self.dhcp_failures, self.link_losses
            ),
        );
        match self.data_port.port() {
            Some(port) => sink.message(
                mtype,
                format_args!("FTP data port: {} on {}\n", self.data_port.status().name(), port),
            ),
            None => sink.message(
                mtype,
                format_args!("FTP data port: {}\n", self.data_port.status().name()),
            ),
        }
        for socket in self.sockets.iter() {
            if socket.role() == SocketRole::Dhcp {
                let dhcp = if self.dhcp_running { "running" } else { "idle" };
                sink.message(mtype, format_args!("Socket {}: dhcp, {}\n", socket.number(), dhcp));
                continue;
            }
            match socket.port() {
                Some(port) => sink.message(
                    mtype,
                    format_args!(
                        "Socket {}: {}, {}, port {}\n",
                        socket.number(),
                        socket.role(),
                        socket.state().name(),
                        port
                    ),
                ),
                None => sink.message(
                    mtype,
                    format_args!(
                        "Socket {}: {}, {}\n",
                        socket.number(),
                        socket.role(),
                        socket.state().name()
                    ),
                ),
            }
        }
    }

    fn start(&mut self) {
        if !self.link.start() {
            return;
        }
        self.using_dhcp = self.addresses.is_unspecified();
        self.chip_ready = false;
        log::info!(
            "network starting, {} addressing",
            if self.using_dhcp { "DHCP" } else { "static" }
        );
    }

    fn stop(&mut self) {
        let state = self.link.state();
        if state == NetworkState::Disabled {
            return;
        }
        self.terminate_sockets(state == NetworkState::Active);
        self.stop_dhcp();
        self.drop_lease();
        self.link.stop();
        self.platform
            .message(MessageType::NetworkInfo, format_args!("Network stopped\n"));
    }

    fn enable_interface(&mut self, mode: i32, ssid: &str, reply: &mut Reply<'_>) -> CommandResult {
        if mode < 0 {
            return self.get_network_state(reply);
        }

        let mut result = CommandResult::Ok;
        match mode {
            0 => {
                if self.link.state() == NetworkState::Disabled {
                    reply.copy("Network is already disabled");
                } else {
                    self.stop();
                    reply.copy("Network stopped");
                }
            }
            1 => {
                if self.link.state() == NetworkState::Disabled {
                    self.start();
                    reply.copy("Network started");
                } else {
                    self.get_network_state(reply);
                }
            }
            _ => {
                reply.printf(format_args!("{}", NetworkError::InvalidMode(mode)));
                return CommandResult::Error;
            }
        }

        if !ssid.is_empty() {
            reply.cat("; SSID ignored on a wired interface");
            result = result.worst(CommandResult::Warning);
        }
        if !self.activated {
            reply.cat("; network not activated yet");
            result = result.worst(CommandResult::Warning);
        }
        result
    }

    fn enable_protocol(
        &mut self,
        protocol: NetworkProtocol,
        port: i32,
        secure: i32,
        reply: &mut Reply<'_>,
    ) -> CommandResult {
        if secure != 0 && secure != -1 {
            reply.printf(format_args!("{}", NetworkError::TlsNotSupported));
            return CommandResult::Error;
        }

        let port = match port {
            p if p < 0 => protocol.default_port(),
            p if p == 0 || p > Port::MAX as i32 => {
                reply.printf(format_args!("{}", NetworkError::InvalidPort(p)));
                return CommandResult::Error;
            }
            p => p as Port,
        };

        if let Some(owner) = self.protocols.conflicting(protocol, port) {
            reply.printf(format_args!(
                "{}",
                NetworkError::PortConflict {
                    protocol: owner,
                    port
                }
            ));
            return CommandResult::Error;
        }

        let active = self.link.state() == NetworkState::Active;
        let was_enabled = self.protocols.is_enabled(protocol);
        let port_changed = self.protocols.set_port(protocol, port);
        if active && was_enabled && port_changed {
            self.shutdown_protocol(protocol);
        }
        self.protocols.enable(protocol);
        if active && (!was_enabled || port_changed) {
            self.start_protocol(protocol);
        }

        reply.clear();
        self.protocols.report_one(protocol, reply);
        if active {
            CommandResult::Ok
        } else {
            reply.cat(" (will start when the network is active)");
            CommandResult::Warning
        }
    }

    fn disable_protocol(&mut self, protocol: NetworkProtocol, reply: &mut Reply<'_>) -> CommandResult {
        if self.protocols.disable(protocol) && self.link.state() == NetworkState::Active {
            self.shutdown_protocol(protocol);
        }
        reply.clear();
        self.protocols.report_one(protocol, reply);
        CommandResult::Ok
    }

    fn report_protocols(&self, reply: &mut Reply<'_>) -> CommandResult {
        reply.clear();
        self.protocols.report(reply);
        CommandResult::Ok
    }

    fn get_network_state(&self, reply: &mut Reply<'_>) -> CommandResult {
        let ip = self.addresses.ip();
        match self.link.state() {
            NetworkState::Disabled => reply.copy("Network is disabled"),
            NetworkState::Enabled => reply.copy("Network is enabled but not started"),
            NetworkState::EstablishingLink => reply.copy("Network is establishing link"),
            NetworkState::ObtainingIp => reply.copy("Network is up, waiting for IP address"),
            NetworkState::Connected => {
                reply.printf(format_args!("Network is connected, IP address = {}", ip))
            }
            NetworkState::Active => reply.printf(format_args!("Network is up, IP address = {}", ip)),
        }
        CommandResult::Ok
    }

    fn enable_state(&self) -> u8 {
        self.link.state().ordinal()
    }

    fn is_wifi_interface(&self) -> bool {
        false
    }

    fn in_network_stack(&self) -> bool {
        false
    }

    fn update_hostname(&mut self, hostname: &str) {
        self.hostname = Hostname::new(hostname);
        // A running exchange restarts with the new name on the next full tick
        if self.dhcp_running {
            self.stop_dhcp();
        }
    }

    fn set_mac_address(&mut self, mac: EthernetAddress) {
        self.mac = mac;
    }

    fn ip_address(&self) -> Ipv4Address {
        self.addresses.ip()
    }

    fn open_data_port(&mut self, port: Port) -> Result<()> {
        match self.link.state() {
            NetworkState::Active => {}
            _ if !self.activated => return Err(NetworkError::NotActivated),
            NetworkState::Disabled => return Err(NetworkError::InterfaceDisabled),
            _ => return Err(NetworkError::NotActive),
        }
        if !self.protocols.is_enabled(NetworkProtocol::Ftp) {
            return Err(NetworkError::ProtocolDisabled(NetworkProtocol::Ftp));
        }
        if let Some(previous) = self.data_port.open(port) {
            log::debug!("FTP data port moves from {} to {}", previous, port);
        }
        if let Err(err) = self
            .sockets
            .open_data_port(port, &mut self.chip, &mut self.responder)
        {
            // The socket stays bound and retries from the poll loop
            log::warn!("FTP data port {}: {}", port, err);
        }
        Ok(())
    }

    fn terminate_data_port(&mut self) {
        if self.data_port.terminate() {
            self.sockets
                .release_data_port(&mut self.chip, &mut self.responder);
        }
    }

    fn data_port_closing(&mut self) {
        self.data_port.peer_closing();
    }
}
