//! Per-protocol enable flags and ports.

use crate::config::{DEFAULT_PORTS, DEFAULT_PROTOCOL_ENABLED};
use crate::types::{NetworkProtocol, Port, NUM_PROTOCOLS};
use crate::utils::Reply;

/// Enable flag and port of one protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolBinding {
    pub protocol: NetworkProtocol,
    pub enabled: bool,
    pub port: Port,
}

/// Protocol table, indexed by [`NetworkProtocol::index`].
///
/// Enabled protocols never share a port.
#[derive(Debug, Clone)]
pub struct ProtocolTable {
    bindings: [ProtocolBinding; NUM_PROTOCOLS],
}

impl ProtocolTable {
    pub fn new(ports: [Port; NUM_PROTOCOLS], enabled: [bool; NUM_PROTOCOLS]) -> Self {
        let bindings = NetworkProtocol::ALL.map(|protocol| ProtocolBinding {
            protocol,
            enabled: enabled[protocol.index()],
            port: ports[protocol.index()],
        });
        Self { bindings }
    }

    pub fn binding(&self, protocol: NetworkProtocol) -> &ProtocolBinding {
        &self.bindings[protocol.index()]
    }

    pub fn is_enabled(&self, protocol: NetworkProtocol) -> bool {
        self.binding(protocol).enabled
    }

    pub fn port(&self, protocol: NetworkProtocol) -> Port {
        self.binding(protocol).port
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolBinding> {
        self.bindings.iter()
    }

    /// Another enabled protocol already bound to `port`.
    pub fn conflicting(&self, protocol: NetworkProtocol, port: Port) -> Option<NetworkProtocol> {
        self.bindings
            .iter()
            .find(|b| b.protocol != protocol && b.enabled && b.port == port)
            .map(|b| b.protocol)
    }

    /// Record the port for `protocol`. Returns whether it changed.
    pub fn set_port(&mut self, protocol: NetworkProtocol, port: Port) -> bool {
        let binding = &mut self.bindings[protocol.index()];
        let changed = binding.port != port;
        binding.port = port;
        changed
    }

    /// Returns whether the flag changed.
    pub fn enable(&mut self, protocol: NetworkProtocol) -> bool {
        debug_assert!(self.conflicting(protocol, self.port(protocol)).is_none());
        !core::mem::replace(&mut self.bindings[protocol.index()].enabled, true)
    }

    /// Returns whether the flag changed.
    pub fn disable(&mut self, protocol: NetworkProtocol) -> bool {
        core::mem::replace(&mut self.bindings[protocol.index()].enabled, false)
    }

    /// Append the one-line status of `protocol`.
    pub fn report_one(&self, protocol: NetworkProtocol, reply: &mut Reply<'_>) {
        let binding = self.binding(protocol);
        if binding.enabled {
            reply.catf(format_args!("{} is enabled on port {}", protocol, binding.port));
        } else {
            reply.catf(format_args!("{} is disabled", protocol));
        }
    }

    /// Append one status line per protocol.
    pub fn report(&self, reply: &mut Reply<'_>) {
        for (i, protocol) in NetworkProtocol::ALL.iter().enumerate() {
            if i != 0 {
                reply.cat("\n");
            }
            self.report_one(*protocol, reply);
        }
    }
}

impl Default for ProtocolTable {
    fn default() -> Self {
        Self::new(DEFAULT_PORTS, DEFAULT_PROTOCOL_ENABLED)
    }
}
