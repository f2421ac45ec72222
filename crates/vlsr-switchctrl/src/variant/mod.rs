//! Vendor-specific session behaviour
//!
//! Every session carries one [`SwitchVariant`]. The session implements
//! the generic Q-BRIDGE logic and calls into the variant wherever a vendor
//! deviates: VLAN row creation and removal, decoding of walked rows, port
//! membership tests, VLAN id to table index translation and QoS.

mod force10;
mod raptor;
mod rfc2674;

pub use force10::{Force10Variant, VlanRefEntry};
pub use raptor::RaptorVariant;
pub use rfc2674::Rfc2674Variant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vlsr_snmp::{SnmpConnection, VarBind};

use crate::error::{SwitchCtrlError, SwitchCtrlResult};
use crate::vendor::Vendor;
use crate::vlan_map::VlanPortMap;

/// Rate descriptor for the QoS hooks
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RateLimit {
    /// Committed rate in Mbit/s
    pub committed_rate: f32,
    /// Committed burst in kbytes
    pub burst_size: u32,
    /// Peak rate in Mbit/s (0 when unused)
    pub peak_rate: f32,
    /// Peak burst in kbytes (0 when unused)
    pub peak_burst_size: u32,
}

impl RateLimit {
    pub fn committed(committed_rate: f32, burst_size: u32) -> Self {
        Self {
            committed_rate,
            burst_size,
            ..Self::default()
        }
    }
}

/// Closed set of vendor variants
#[derive(Debug, Clone)]
pub enum SwitchVariant {
    Rfc2674(Rfc2674Variant),
    Force10E600(Force10Variant),
    RaptorEr1010(RaptorVariant),
}

impl SwitchVariant {
    /// Picks the variant driving `vendor`; `None` for [`Vendor::Illegal`]
    pub fn for_vendor(vendor: Vendor) -> Option<Self> {
        match vendor {
            Vendor::Force10E600 => Some(SwitchVariant::Force10E600(Force10Variant::new())),
            Vendor::RaptorEr1010 => Some(SwitchVariant::RaptorEr1010(RaptorVariant)),
            Vendor::Illegal => None,
            Vendor::Unknown | Vendor::Rfc2674 | Vendor::IntelEs530 | Vendor::LambdaOptical => {
                Some(SwitchVariant::Rfc2674(Rfc2674Variant))
            }
        }
    }

    /// Session name used in logs and for session identity
    pub fn name(&self) -> &'static str {
        match self {
            SwitchVariant::Rfc2674(_) => rfc2674::NAME,
            SwitchVariant::Force10E600(_) => force10::NAME,
            SwitchVariant::RaptorEr1010(_) => raptor::NAME,
        }
    }

    /// Creates the static VLAN row for `vid` on the device
    pub async fn create_vlan(
        &self,
        conn: &mut dyn SnmpConnection,
        vid: u32,
    ) -> SwitchCtrlResult<()> {
        match self {
            SwitchVariant::Rfc2674(v) => v.create_vlan(conn, vid).await,
            SwitchVariant::RaptorEr1010(v) => v.create_vlan(conn, vid).await,
            SwitchVariant::Force10E600(_) => Err(self.unsupported("create VLAN")),
        }
    }

    /// Destroys the static VLAN row for `vid` on the device
    pub async fn remove_vlan(
        &self,
        conn: &mut dyn SnmpConnection,
        vid: u32,
    ) -> SwitchCtrlResult<()> {
        match self {
            SwitchVariant::Rfc2674(v) => v.remove_vlan(conn, vid).await,
            SwitchVariant::RaptorEr1010(v) => v.remove_vlan(conn, vid).await,
            SwitchVariant::Force10E600(_) => Err(self.unsupported("remove VLAN")),
        }
    }

    /// Decodes one walked row of a static port-list column.
    ///
    /// Returns `None` for rows that do not describe a VLAN.
    pub fn decode(&self, binding: &VarBind) -> Option<VlanPortMap> {
        match self {
            SwitchVariant::Force10E600(v) => v.decode(binding),
            SwitchVariant::Rfc2674(_) | SwitchVariant::RaptorEr1010(_) => {
                rfc2674::decode(binding)
            }
        }
    }

    /// Every variant decodes rows into Q-BRIDGE port lists, so membership
    /// is a bit test.
    pub fn has_port(&self, vpm: &VlanPortMap, port: u32) -> bool {
        vpm.ports.contains(port)
    }

    pub fn is_empty(&self, vpm: &VlanPortMap) -> bool {
        vpm.ports.is_empty()
    }

    /// Table index the device uses for `vid`, or 0 if it has none
    pub fn convert_vlan_id_to_interface(&self, vid: u32) -> u32 {
        match self {
            SwitchVariant::Force10E600(v) => v.interface_of(vid),
            SwitchVariant::Rfc2674(_) | SwitchVariant::RaptorEr1010(_) => vid,
        }
    }

    /// Refreshes the VLAN id / interface index table, if the vendor has one
    pub async fn build_ref_table(&mut self, conn: &mut dyn SnmpConnection) -> SwitchCtrlResult<()> {
        match self {
            SwitchVariant::Force10E600(v) => v.build_ref_table(conn).await,
            SwitchVariant::Rfc2674(_) | SwitchVariant::RaptorEr1010(_) => Ok(()),
        }
    }

    /// Input policing on `port` for traffic of `vid`
    pub fn police_input_bandwidth(
        &self,
        undo: bool,
        port: u32,
        vid: u32,
        rate: &RateLimit,
    ) -> SwitchCtrlResult<()> {
        debug!(
            "{}: police input port {} vlan {} rate {:?} (undo={})",
            self.name(),
            port,
            vid,
            rate,
            undo
        );
        Err(self.unsupported("input policing"))
    }

    /// Output shaping on `port` for traffic of `vid`
    pub fn limit_output_bandwidth(
        &self,
        undo: bool,
        port: u32,
        vid: u32,
        rate: &RateLimit,
    ) -> SwitchCtrlResult<()> {
        debug!(
            "{}: limit output port {} vlan {} rate {:?} (undo={})",
            self.name(),
            port,
            vid,
            rate,
            undo
        );
        Err(self.unsupported("output rate limiting"))
    }

    fn unsupported(&self, operation: &'static str) -> SwitchCtrlError {
        SwitchCtrlError::Unsupported {
            variant: self.name(),
            operation,
        }
    }
}
