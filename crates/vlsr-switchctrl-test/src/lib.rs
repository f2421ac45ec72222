//! Test infrastructure for VLSR switch control
//!
//! Provides:
//! - An in-memory SNMP agent standing in for managed switches
//! - Fixtures for the switch models the core supports
//! - Device-state verification helpers

mod agent;
pub mod fixtures;
mod verification;

pub use agent::{DeviceMib, MemoryAgent};
pub use fixtures::*;
pub use verification::*;
