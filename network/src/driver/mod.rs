//! Driver abstraction module.
//!
//! Provides the chip and DHCP collaborator traits.

pub mod traits;

// Re-exports
pub use traits::{ChipError, DhcpClient, DhcpLease, DhcpStatus, SocketChip, SocketStatus};
