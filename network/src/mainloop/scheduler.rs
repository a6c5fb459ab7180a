//! Round-robin socket scheduler and elapsed-time gating.

use smoltcp::time::{Duration, Instant};

use crate::types::{SocketNumber, NUM_TCP_SOCKETS};

/// Hands out one TCP socket per tick in fixed rotation.
///
/// Over any `NUM_TCP_SOCKETS` consecutive calls every TCP socket is
/// returned exactly once, whatever the sockets are doing.
#[derive(Debug)]
pub struct PollScheduler {
    next: SocketNumber,
    turns: [u32; NUM_TCP_SOCKETS],
}

impl PollScheduler {
    pub const fn new() -> Self {
        Self {
            next: 0,
            turns: [0; NUM_TCP_SOCKETS],
        }
    }

    /// Socket whose turn it is; advances the cursor.
    pub fn next_socket(&mut self) -> SocketNumber {
        let socket = self.next;
        self.turns[socket as usize] = self.turns[socket as usize].wrapping_add(1);
        self.next = (socket + 1) % NUM_TCP_SOCKETS as SocketNumber;
        socket
    }

    /// Socket that will be polled next.
    pub fn cursor(&self) -> SocketNumber {
        self.next
    }

    /// Turns handed out per socket since the last reset.
    pub fn turns(&self) -> &[u32; NUM_TCP_SOCKETS] {
        &self.turns
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Fires at most once per call when at least `interval` has elapsed since
/// the last firing.
///
/// The reference point advances by whole intervals, so a late call does
/// not shift the phase of later ticks.
#[derive(Debug, Clone, Copy)]
pub struct TickGate {
    last: Instant,
    interval: Duration,
}

impl TickGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            last: Instant::from_millis(0),
            interval,
        }
    }

    /// Restart the interval at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.last || now - self.last < self.interval {
            return false;
        }
        self.last = self.last + self.interval;
        true
    }
}
