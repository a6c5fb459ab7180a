//! W5500 Network Interface
//!
//! Driver-side network interface for an embedded controller that talks to
//! a WIZnet W5500 Ethernet chip over SPI. The chip carries eight hardware
//! TCP/UDP socket engines; this crate decides what each one does.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command front ends (G-code, HTTP config, ...)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ NetworkInterface
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  W5500Interface                                             │
//! │  link state · addressing · protocols · round-robin polling  │
//! └─────────────────────────────────────────────────────────────┘
//!        │ SocketChip            │ DhcpClient        │ Responder
//!        ▼                       ▼                   ▼
//! ┌──────────────┐       ┌──────────────┐    ┌──────────────────┐
//! │ SPI driver   │       │ DHCP client  │    │ HTTP/FTP/Telnet  │
//! └──────────────┘       └──────────────┘    └──────────────────┘
//! ```
//!
//! Everything runs from the host's control loop through
//! [`NetworkInterface::spin`]. Nothing blocks and nothing is allocated.

#![no_std]

pub mod address;
pub mod config;
pub mod driver;
pub mod error;
pub mod mainloop;
pub mod platform;
pub mod protocol;
pub mod responder;
pub mod socket;
pub mod stack;
pub mod state;
pub mod types;
pub mod utils;

#[cfg(test)]
mod testing;

pub use address::AddressStore;
pub use config::NetworkConfig;
pub use driver::{ChipError, DhcpClient, SocketChip};
pub use error::{ContractViolation, NetworkError, Result};
pub use platform::{Clock, MessageSink, MessageType, Platform};
pub use responder::{Connection, Responder};
pub use socket::SocketHandle;
pub use stack::{NetworkInterface, W5500Interface};
pub use state::NetworkState;
pub use types::{CommandResult, NetworkProtocol};
pub use utils::Reply;
