//! Shared utilities.
//!
//! Provides:
//! - `Reply` - fixed-capacity reply text for the command surface

pub mod reply;

pub use reply::Reply;
