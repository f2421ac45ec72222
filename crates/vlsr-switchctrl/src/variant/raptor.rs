//! Ether-Raptor ER1010

use tracing::{info, warn};

use vlsr_snmp::mib::{self, row_status};
use vlsr_snmp::{SnmpConnection, SnmpValue};

use super::rfc2674::set_row_status;
use crate::error::SwitchCtrlResult;

pub(super) const NAME: &str = "VLSR-Raptor";

/// The ER1010 rejects createAndGo; rows are created with createAndWait,
/// named, then activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaptorVariant;

impl RaptorVariant {
    pub(super) async fn create_vlan(
        &self,
        conn: &mut dyn SnmpConnection,
        vid: u32,
    ) -> SwitchCtrlResult<()> {
        set_row_status(conn, vid, row_status::CREATE_AND_WAIT).await?;

        let name = mib::instance(mib::DOT1Q_VLAN_STATIC_NAME, vid);
        let staged = match conn
            .set(&name, SnmpValue::OctetString(vlan_name(vid).into_bytes()))
            .await
        {
            Ok(()) => set_row_status(conn, vid, row_status::ACTIVE).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = staged {
            // Do not leave a half-created row behind
            warn!("{}: activating VLAN {} failed: {}", NAME, vid, e);
            if let Err(cleanup) = set_row_status(conn, vid, row_status::DESTROY).await {
                warn!("{}: destroying VLAN {} failed: {}", NAME, vid, cleanup);
            }
            return Err(e);
        }

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

fn vlan_name(vid: u32) -> String {
    format!("dragon_vlan_{}", vid)
}
