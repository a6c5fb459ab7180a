//! Main loop module.
//!
//! Per-tick work bounding for the host's control loop.
//!
//! - `scheduler` - round-robin socket rotation and elapsed-time gating

pub mod scheduler;

pub use scheduler::{PollScheduler, TickGate};
