//! Hardware socket management.
//!
//! # Modules
//!
//! - `handle` - generation-checked session handles
//! - `hardware` - per-socket connection state machine
//! - `pool` - role partition over the chip's eight sockets

pub mod handle;
pub mod hardware;
pub mod pool;

pub use handle::SocketHandle;
pub use hardware::{ConnState, HardwareSocket, PollOutcome, RX_CHUNK};
pub use pool::{listener_sockets, SocketPool};
