//! Device-management RPC boundary for VLSR switch control.
//!
//! The switch-control core talks to managed switches through three
//! requests: get, get-next and set. This crate defines that boundary:
//!
//! - [`SnmpTransport`]: opens sessions to an agent address
//! - [`SnmpConnection`]: an open session issuing get/get-next/set
//! - [`walk()`]: collects a MIB subtree through repeated get-next
//! - [`mib`]: object identifiers of the system, interface and Q-BRIDGE MIBs
//! - [`error`]: error types for transport and protocol failures
//!
//! Wire encoding, retransmission and authentication are the transport
//! implementation's concern.
//!
//! # Example
//!
//! ```ignore
//! use vlsr_snmp::{walk, Credentials, SnmpTransport};
//!
//! async fn dump_vlans(transport: &dyn SnmpTransport, addr: std::net::IpAddr) -> vlsr_snmp::SnmpResult<()> {
//!     let mut conn = transport.open(addr, &Credentials::default()).await?;
//!     let root = ".1.3.6.1.2.1.17.7.1.4.3.1.2".parse().unwrap();
//!     for binding in walk(conn.as_mut(), &root).await? {
//!         println!("{} = {}", binding.oid, binding.value);
//!     }
//!     conn.close().await
//! }
//! ```

pub mod error;
pub mod mib;
mod transport;
mod value;
mod walk;

pub use error::{SnmpError, SnmpResult};
pub use transport::{Credentials, SnmpConnection, SnmpTransport, SnmpVersion, DEFAULT_COMMUNITY};
pub use value::{SnmpValue, VarBind};
pub use walk::walk;
