//! Common types for VLSR switch control.
//!
//! This crate provides type-safe representations of the values exchanged
//! with managed Ethernet switches:
//!
//! - [`Oid`]: SNMP object identifiers with prefix and ordering semantics
//! - [`PortBits`]: RFC 2674 `PortList` bitmaps describing VLAN membership

mod oid;
mod port_bits;

pub use oid::Oid;
pub use port_bits::PortBits;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid object identifier: {0}")]
    InvalidOid(String),

    #[error("invalid port number: {0} (ports are 1-4096)")]
    InvalidPort(u32),
}
