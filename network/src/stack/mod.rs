//! Network interface command surface.
//!
//! [`NetworkInterface`] is what the firmware's command front ends and main
//! loop see of a network adapter. [`W5500Interface`] implements it for the
//! WIZnet W5500 SPI Ethernet chip.
//!
//! # Usage
//!
//! ```ignore
//! use w5500_network::{NetworkConfig, NetworkInterface, W5500Interface};
//!
//! let mut iface = W5500Interface::new(chip, dhcp, platform, responder, NetworkConfig::dhcp());
//! iface.activate();
//! iface.start();
//!
//! loop {
//!     iface.spin(full_tick);
//! }
//! ```

mod interface;

pub use interface::W5500Interface;

use smoltcp::wire::{EthernetAddress, Ipv4Address};

use crate::error::{ContractViolation, Result};
use crate::platform::MessageType;
use crate::types::{CommandResult, NetworkProtocol, Port};
use crate::utils::Reply;

/// Operations every network adapter offers the rest of the firmware.
///
/// Command operations never fail with `Err`: they answer with a
/// [`CommandResult`] and a line of text in `reply`.
pub trait NetworkInterface {
    /// Reset every table to boot defaults. No hardware access.
    fn init(&mut self);

    /// Platform initialisation has finished; hardware may be touched.
    fn activate(&mut self);

    /// Shut down for good.
    fn exit(&mut self);

    /// Tick entry point. `full` ticks also run link and DHCP housekeeping.
    fn spin(&mut self, full: bool);

    /// Write a diagnostic dump to the platform's message sink.
    fn diagnostics(&mut self, mtype: MessageType);

    fn start(&mut self);
    fn stop(&mut self);

    /// `mode < 0` reports, `0` stops, `1` starts.
    fn enable_interface(&mut self, mode: i32, ssid: &str, reply: &mut Reply<'_>) -> CommandResult;

    /// Enable `protocol` on `port` (negative for the default port).
    fn enable_protocol(
        &mut self,
        protocol: NetworkProtocol,
        port: i32,
        secure: i32,
        reply: &mut Reply<'_>,
    ) -> CommandResult;

    fn disable_protocol(&mut self, protocol: NetworkProtocol, reply: &mut Reply<'_>) -> CommandResult;

    fn report_protocols(&self, reply: &mut Reply<'_>) -> CommandResult;

    fn get_network_state(&self, reply: &mut Reply<'_>) -> CommandResult;

    /// State ordinal for status reporting.
    fn enable_state(&self) -> u8;

    fn is_wifi_interface(&self) -> bool;

    /// Whether an IP stack inside the firmware serves this adapter.
    fn in_network_stack(&self) -> bool;

    fn update_hostname(&mut self, hostname: &str);

    fn set_mac_address(&mut self, mac: EthernetAddress);

    fn ip_address(&self) -> Ipv4Address;

    fn open_data_port(&mut self, port: Port) -> Result<()>;

    fn terminate_data_port(&mut self);

    /// The peer closed the passive data connection.
    fn data_port_closing(&mut self);

    /// [`enable_protocol`](Self::enable_protocol) with a protocol number
    /// straight from a front end.
    fn enable_protocol_number(
        &mut self,
        protocol: i32,
        port: i32,
        secure: i32,
        reply: &mut Reply<'_>,
    ) -> CommandResult {
        match NetworkProtocol::from_raw(protocol) {
            Ok(protocol) => self.enable_protocol(protocol, port, secure, reply),
            Err(violation) => reject(violation, reply),
        }
    }

    fn disable_protocol_number(&mut self, protocol: i32, reply: &mut Reply<'_>) -> CommandResult {
        match NetworkProtocol::from_raw(protocol) {
            Ok(protocol) => self.disable_protocol(protocol, reply),
            Err(violation) => reject(violation, reply),
        }
    }
}

/// Bad input from a front end leaves every table untouched.
fn reject(violation: ContractViolation, reply: &mut Reply<'_>) -> CommandResult {
    log::error!("rejected command: {}", violation);
    reply.printf(format_args!("{}", violation));
    CommandResult::Error
}
