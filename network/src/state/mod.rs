//! State machine module.
//!
//! Non-blocking state machines held across ticks. Each one only records
//! state; the interface acts on the transitions they report.

pub mod data_port;
pub mod link;

pub use data_port::{DataPortController, DataPortStatus};
pub use link::{LinkStateMachine, LinkTransition, NetworkState};
