//! Provider failover routing.
//!
//! Decides whether a failed provider should be swapped for the alternative
//! and builds the prompt that asks the user to choose.

mod failover;

pub use failover::*;
