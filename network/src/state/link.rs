//! Interface bring-up state machine.
//!
//! # State flow
//! ```text
//! Disabled ─start─→ Enabled ─link─→ EstablishingLink ─stable─→ ObtainingIp
//!    ↑                                  ↑                          │ address
//!    └──────────── stop ────────────    │ link lost                ↓
//!                                       ├───────────────────── Connected
//!                                       │                          │ sockets up
//!                                       └───────────────────── Active
//! ```
//!
//! The machine only records state. Driving the chip, DHCP and the socket
//! pool on each transition is the interface's job.

use core::fmt;

/// Observable interface state, in bring-up order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetworkState {
    Disabled = 0,
    Enabled = 1,
    EstablishingLink = 2,
    ObtainingIp = 3,
    Connected = 4,
    Active = 5,
}

impl NetworkState {
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            NetworkState::Disabled => "disabled",
            NetworkState::Enabled => "enabled",
            NetworkState::EstablishingLink => "establishingLink",
            NetworkState::ObtainingIp => "obtainingIP",
            NetworkState::Connected => "connected",
            NetworkState::Active => "active",
        }
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of feeding a link probe to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    Unchanged,
    Entered(NetworkState),
    /// Link dropped while it was up; the machine is back in
    /// `EstablishingLink`.
    Lost(NetworkState),
}

#[derive(Debug)]
pub struct LinkStateMachine {
    state: NetworkState,
    stable_probes: u8,
    required_probes: u8,
}

impl LinkStateMachine {
    /// `required_probes` consecutive link-up probes mark the link stable.
    pub const fn new(required_probes: u8) -> Self {
        Self {
            state: NetworkState::Disabled,
            stable_probes: 0,
            required_probes,
        }
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    /// Disabled → Enabled. Returns whether the state changed.
    pub fn start(&mut self) -> bool {
        if self.state != NetworkState::Disabled {
            return false;
        }
        self.state = NetworkState::Enabled;
        self.stable_probes = 0;
        true
    }

    /// Back to Disabled from anywhere.
    pub fn stop(&mut self) {
        self.state = NetworkState::Disabled;
        self.stable_probes = 0;
    }

    /// Feed one link probe.
    pub fn probe(&mut self, link_up: bool) -> LinkTransition {
        match self.state {
            NetworkState::Disabled => LinkTransition::Unchanged,
            NetworkState::Enabled => {
                if link_up {
                    self.enter(NetworkState::EstablishingLink)
                } else {
                    LinkTransition::Unchanged
                }
            }
            NetworkState::EstablishingLink => {
                if !link_up {
                    self.stable_probes = 0;
                    return LinkTransition::Unchanged;
                }
                self.stable_probes = self.stable_probes.saturating_add(1);
                if self.stable_probes >= self.required_probes {
                    self.enter(NetworkState::ObtainingIp)
                } else {
                    LinkTransition::Unchanged
                }
            }
            from @ (NetworkState::ObtainingIp | NetworkState::Connected | NetworkState::Active) => {
                if link_up {
                    LinkTransition::Unchanged
                } else {
                    self.enter(NetworkState::EstablishingLink);
                    LinkTransition::Lost(from)
                }
            }
        }
    }

    /// ObtainingIp → Connected.
    pub fn address_acquired(&mut self) -> LinkTransition {
        if self.state == NetworkState::ObtainingIp {
            self.enter(NetworkState::Connected)
        } else {
            LinkTransition::Unchanged
        }
    }

    /// Connected → Active.
    pub fn sockets_ready(&mut self) -> LinkTransition {
        if self.state == NetworkState::Connected {
            self.enter(NetworkState::Active)
        } else {
            LinkTransition::Unchanged
        }
    }

    /// Connected or Active → ObtainingIp; the address went away but the
    /// link did not.
    pub fn address_lost(&mut self) -> LinkTransition {
        match self.state {
            NetworkState::Connected | NetworkState::Active => self.enter(NetworkState::ObtainingIp),
            _ => LinkTransition::Unchanged,
        }
    }

    fn enter(&mut self, state: NetworkState) -> LinkTransition {
        log::debug!("network state {} -> {}", self.state, state);
        self.state = state;
        self.stable_probes = 0;
        LinkTransition::Entered(state)
    }
}
