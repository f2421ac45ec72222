//! Generic RFC 2674 (Q-BRIDGE-MIB) switches

use tracing::{debug, info};

use vlsr_snmp::mib::{self, row_status};
use vlsr_snmp::{SnmpConnection, SnmpValue, VarBind};

use crate::error::SwitchCtrlResult;
use crate::vlan_map::VlanPortMap;

pub(super) const NAME: &str = "VLSR-SNMP";

/// Switches that create and destroy VLANs through `dot1qVlanStaticRowStatus`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rfc2674Variant;

impl Rfc2674Variant {
    pub(super) async fn create_vlan(
        &self,
        conn: &mut dyn SnmpConnection,
        vid: u32,
    ) -> SwitchCtrlResult<()> {
        set_row_status(conn, vid, row_status::CREATE_AND_GO).await?;
        info!("{}: created VLAN {} on {}", NAME, vid, conn.peer());
        Ok(())
    }

    pub(super) async fn remove_vlan(
        &self,
        conn: &mut dyn SnmpConnection,
        vid: u32,
    ) -> SwitchCtrlResult<()> {
        set_row_status(conn, vid, row_status::DESTROY).await?;
        info!("{}: removed VLAN {} on {}", NAME, vid, conn.peer());
        Ok(())
    }
}

pub(super) async fn set_row_status(
    conn: &mut dyn SnmpConnection,
    index: u32,
    status: i64,
) -> SwitchCtrlResult<()> {
    let oid = mib::instance(mib::DOT1Q_VLAN_STATIC_ROW_STATUS, index);
    conn.set(&oid, SnmpValue::Integer(status)).await?;
    Ok(())
}

/// Static table rows are indexed by VLAN id
pub(super) fn decode(binding: &VarBind) -> Option<VlanPortMap> {
    let vid = binding.oid.last()?;
    match binding.value.as_port_bits() {
        Some(ports) => Some(VlanPortMap::new(vid, ports)),
        None => {
            debug!("Skipping {}: not a port list ({})", binding.oid, binding.value);
            None
        }
    }
}
