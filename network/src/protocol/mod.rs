//! Application protocol bookkeeping.

pub mod table;

pub use table::{ProtocolBinding, ProtocolTable};
