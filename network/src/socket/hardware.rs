//! Per-socket connection state machine.
//!
//! Tracks one hardware socket engine from the driver's side: which role it
//! serves, which port it listens on, and where its current connection is
//! in its life.
//!
//! # States
//! ```text
//! Disabled → Idle → Listening → Accepting → Connected → Closing → Idle
//!                       ↑                                           │
//!                       └───────────────── reopen ──────────────────┘
//! ```
//!
//! The FTP data socket is the exception: once its connection is over it
//! stays `Idle` without a port until it is told to listen again.
//!
//! Every call to [`HardwareSocket::poll`] reads the chip's status once and
//! performs at most one unit of work: accept a pending connection, move
//! one chunk of inbound bytes to the responder, or let the responder
//! flush output.

use smoltcp::time::{Duration, Instant};

use crate::driver::{ChipError, SocketChip, SocketStatus};
use crate::responder::{Connection, Responder};
use crate::types::{Port, SocketNumber, SocketRole};

use super::SocketHandle;

/// Largest number of bytes moved from the chip per poll.
pub const RX_CHUNK: usize = 512;

/// Driver-side connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// No role, hardware socket closed
    Disabled,
    /// Role held but hardware socket closed (no port, or reopen pending)
    Idle,
    /// Waiting for a peer
    Listening,
    /// Peer connected, waiting for a responder to take it
    Accepting {
        /// When the connection was first seen
        since: Instant,
    },
    /// Responder owns the session
    Connected,
    /// Local close in progress
    Closing,
}

impl ConnState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnState::Disabled => "disabled",
            ConnState::Idle => "idle",
            ConnState::Listening => "listening",
            ConnState::Accepting { .. } => "accepting",
            ConnState::Connected => "connected",
            ConnState::Closing => "closing",
        }
    }

    /// Whether the hardware socket is open in this state.
    fn is_open(&self) -> bool {
        matches!(
            self,
            ConnState::Listening | ConnState::Accepting { .. } | ConnState::Connected | ConnState::Closing
        )
    }
}

/// What a single poll achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing to do.
    Idle,
    /// Listener (re)opened.
    Reopened,
    /// A responder took a new connection.
    Accepted,
    /// Bytes moved to the responder (may be zero if it only flushed).
    Transferred(usize),
    /// No responder took the connection in time; it was dropped.
    Rejected,
    /// Peer closed its side; local close started.
    PeerClosed,
    /// Connection fully closed and the session invalidated.
    SessionEnded,
    /// Chip error absorbed; socket reset.
    Reset,
}

/// One of the chip's socket engines.
#[derive(Debug)]
pub struct HardwareSocket {
    number: SocketNumber,
    role: SocketRole,
    port: Option<Port>,
    state: ConnState,
    generation: u16,
    session: bool,
    faults: u32,
}

impl HardwareSocket {
    pub const fn new(number: SocketNumber) -> Self {
        Self::with_role(number, SocketRole::Free)
    }

    pub const fn with_role(number: SocketNumber, role: SocketRole) -> Self {
        Self {
            number,
            role,
            port: None,
            state: ConnState::Disabled,
            generation: 0,
            session: false,
            faults: 0,
        }
    }

    pub fn number(&self) -> SocketNumber {
        self.number
    }

    pub fn role(&self) -> SocketRole {
        self.role
    }

    pub fn port(&self) -> Option<Port> {
        self.port
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Chip errors absorbed on this socket since boot.
    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnState::Connected
    }

    /// Handle for the current (or next) session.
    pub fn handle(&self) -> SocketHandle {
        SocketHandle::new(self.number, self.generation)
    }

    /// Whether `handle` names this socket's live session.
    pub fn owns(&self, handle: SocketHandle) -> bool {
        self.session && handle == self.handle()
    }

    pub(crate) fn set_role(&mut self, role: SocketRole) {
        self.role = role;
    }

    /// Listen on `port`, ending whatever the socket was doing.
    pub fn listen(
        &mut self,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
        port: Port,
    ) -> Result<(), ChipError> {
        self.shut(chip, responder);
        self.port = Some(port);
        self.reopen(chip)
    }

    /// Close the hardware socket and forget the port, keeping the role.
    pub fn release(&mut self, chip: &mut dyn SocketChip, responder: &mut dyn Responder) {
        self.shut(chip, responder);
        self.port = None;
        self.state = ConnState::Idle;
    }

    /// Close the hardware socket and disable it.
    pub fn terminate(&mut self, chip: &mut dyn SocketChip, responder: &mut dyn Responder) {
        self.shut(chip, responder);
        self.port = None;
        self.state = ConnState::Disabled;
    }

    /// Start a graceful close of the live session.
    ///
    /// The handle stays valid until the chip reports the socket closed.
    pub fn close_session(&mut self, chip: &mut dyn SocketChip) -> Result<(), ChipError> {
        match self.state {
            ConnState::Connected => {
                chip.disconnect(self.number)?;
                self.state = ConnState::Closing;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Do one unit of work on this socket.
    pub fn poll(
        &mut self,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
        now: Instant,
        accept_timeout: Duration,
    ) -> PollOutcome {
        match self.state {
            ConnState::Disabled => return PollOutcome::Idle,
            ConnState::Idle => {
                if self.port.is_some() && self.reopen(chip).is_ok() {
                    return PollOutcome::Reopened;
                }
                return PollOutcome::Idle;
            }
            _ => {}
        }

        match chip.status(self.number) {
            SocketStatus::Fault => self.fault(chip, responder, ChipError::Fault),
            SocketStatus::Closed => {
                let finished = self.state == ConnState::Closing;
                let ended = self.end_session(responder);
                self.state = ConnState::Idle;
                if self.role == SocketRole::FtpData && (finished || ended) {
                    // One connection per data port; the FTP side opens the next
                    self.port = None;
                    return PollOutcome::SessionEnded;
                }
                let _ = self.reopen(chip);
                if ended {
                    PollOutcome::SessionEnded
                } else {
                    PollOutcome::Reopened
                }
            }
            SocketStatus::Established => self.established(chip, responder, now, accept_timeout),
            SocketStatus::CloseWait => self.peer_closed(chip, responder),
            SocketStatus::Init | SocketStatus::Listen | SocketStatus::Udp | SocketStatus::Closing => {
                PollOutcome::Idle
            }
        }
    }

    fn established(
        &mut self,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
        now: Instant,
        accept_timeout: Duration,
    ) -> PollOutcome {
        match self.state {
            ConnState::Listening => {
                self.state = ConnState::Accepting { since: now };
                self.try_accept(chip, responder, now, now, accept_timeout)
            }
            ConnState::Accepting { since } => {
                self.try_accept(chip, responder, since, now, accept_timeout)
            }
            ConnState::Connected => self.service(chip, responder),
            _ => PollOutcome::Idle,
        }
    }

    fn try_accept(
        &mut self,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
        since: Instant,
        now: Instant,
        accept_timeout: Duration,
    ) -> PollOutcome {
        if responder.accept(self.handle(), self.role) {
            log::debug!("socket {}: {} connection accepted", self.number, self.role);
            self.session = true;
            self.state = ConnState::Connected;
            return match self.service(chip, responder) {
                PollOutcome::Transferred(_) => PollOutcome::Accepted,
                other => other,
            };
        }

        if now - since < accept_timeout {
            return PollOutcome::Idle;
        }

        log::warn!(
            "socket {}: no responder took the {} connection, dropping it",
            self.number,
            self.role
        );
        if let Err(err) = chip.disconnect(self.number) {
            return self.fault(chip, responder, err);
        }
        self.state = ConnState::Closing;
        PollOutcome::Rejected
    }

    fn peer_closed(&mut self, chip: &mut dyn SocketChip, responder: &mut dyn Responder) -> PollOutcome {
        match self.state {
            ConnState::Closing => return PollOutcome::Idle,
            ConnState::Connected => {
                let outcome = self.service(chip, responder);
                if outcome == PollOutcome::Reset || self.state == ConnState::Closing {
                    return outcome;
                }
                // Drain what the peer sent before its FIN over later turns
                if chip.rx_pending(self.number) > 0 {
                    return outcome;
                }
            }
            _ => {}
        }

        if let Err(err) = chip.disconnect(self.number) {
            return self.fault(chip, responder, err);
        }
        self.state = ConnState::Closing;
        PollOutcome::PeerClosed
    }

    fn service(&mut self, chip: &mut dyn SocketChip, responder: &mut dyn Responder) -> PollOutcome {
        let handle = self.handle();
        let mut moved = 0;

        if chip.rx_pending(self.number) > 0 {
            let mut buf = [0u8; RX_CHUNK];
            match chip.receive(self.number, &mut buf) {
                Ok(0) => {}
                Ok(len) => {
                    let mut conn = Connection::new(handle, self.role, &mut *chip);
                    responder.deliver(&mut conn, &buf[..len]);
                    moved = len;
                    if conn.close_requested() {
                        return self.begin_close(chip, responder, moved);
                    }
                }
                Err(err) => return self.fault(chip, responder, err),
            }
        }

        let mut conn = Connection::new(handle, self.role, &mut *chip);
        responder.flush(&mut conn);
        if conn.close_requested() {
            return self.begin_close(chip, responder, moved);
        }

        PollOutcome::Transferred(moved)
    }

    fn begin_close(
        &mut self,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
        moved: usize,
    ) -> PollOutcome {
        if let Err(err) = chip.disconnect(self.number) {
            return self.fault(chip, responder, err);
        }
        self.state = ConnState::Closing;
        PollOutcome::Transferred(moved)
    }

    fn fault(
        &mut self,
        chip: &mut dyn SocketChip,
        responder: &mut dyn Responder,
        err: ChipError,
    ) -> PollOutcome {
        log::warn!("socket {}: {}, resetting", self.number, err);
        self.faults = self.faults.saturating_add(1);
        chip.close(self.number);
        self.end_session(responder);
        self.state = ConnState::Idle;
        let _ = self.reopen(chip);
        PollOutcome::Reset
    }

    fn reopen(&mut self, chip: &mut dyn SocketChip) -> Result<(), ChipError> {
        let Some(port) = self.port else {
            self.state = ConnState::Idle;
            return Ok(());
        };
        match chip.open_tcp_listener(self.number, port) {
            Ok(()) => {
                self.state = ConnState::Listening;
                Ok(())
            }
            Err(err) => {
                log::warn!("socket {}: cannot listen on port {}: {}", self.number, port, err);
                self.state = ConnState::Idle;
                Err(err)
            }
        }
    }

    fn shut(&mut self, chip: &mut dyn SocketChip, responder: &mut dyn Responder) {
        if self.state.is_open() {
            chip.close(self.number);
        }
        self.end_session(responder);
    }

    /// Invalidate outstanding handles. Returns whether a responder session ended.
    fn end_session(&mut self, responder: &mut dyn Responder) -> bool {
        let handle = self.handle();
        self.generation = self.generation.wrapping_add(1);
        if core::mem::take(&mut self.session) {
            responder.session_ended(handle);
            true
        } else {
            false
        }
    }
}
