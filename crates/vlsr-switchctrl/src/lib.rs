//! vlsr-switchctrl - switch control for the VLSR daemon
//!
//! Manages live SNMP sessions to the Ethernet switches a VLSR controls,
//! keeps a cached view of their static VLAN tables, and maps the local IDs
//! carried by signaling to switch ports.

mod config;
mod error;
mod global;
mod local_id;
mod session;
mod slot;
mod variant;
mod vendor;
mod vlan_map;

pub use config::*;
pub use error::{SwitchCtrlError, SwitchCtrlResult};
pub use global::{SharedSwitchCtrl, SwitchCtrlGlobal};
pub use local_id::*;
pub use session::SwitchCtrlSession;
pub use slot::*;
pub use variant::*;
pub use vendor::*;
pub use vlan_map::VlanPortMap;
