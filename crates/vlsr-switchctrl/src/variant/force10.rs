//! Force10 E600/E1200
//!
//! FTOS indexes the Q-BRIDGE static table by the ifIndex of the VLAN
//! interface rather than by VLAN id. The mapping is learned from `ifDescr`,
//! where VLAN interfaces are listed as `Vlan <id>`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use vlsr_snmp::{mib, walk, SnmpConnection, VarBind};
use vlsr_types::Oid;

use crate::error::SwitchCtrlResult;
use crate::vlan_map::VlanPortMap;

pub(super) const NAME: &str = "VLSR-Force10";

static VLAN_INTERFACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Vlan\s+(\d+)$").expect("Invalid regex pattern"));

/// One VLAN id / interface index pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanRefEntry {
    pub vid: u32,
    pub if_index: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Force10Variant {
    ref_table: Vec<VlanRefEntry>,
}

impl Force10Variant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current VLAN id / ifIndex pairs
    pub fn ref_table(&self) -> &[VlanRefEntry] {
        &self.ref_table
    }

    pub(super) fn interface_of(&self, vid: u32) -> u32 {
        self.ref_table
            .iter()
            .find(|entry| entry.vid == vid)
            .map_or(0, |entry| entry.if_index)
    }

    fn vlan_of(&self, if_index: u32) -> Option<u32> {
        self.ref_table
            .iter()
            .find(|entry| entry.if_index == if_index)
            .map(|entry| entry.vid)
    }

    pub(super) async fn build_ref_table(
        &mut self,
        conn: &mut dyn SnmpConnection,
    ) -> SwitchCtrlResult<()> {
        let bindings = walk(conn, &Oid::from(mib::IF_DESCR)).await?;

        let table: Vec<VlanRefEntry> = bindings
            .iter()
            .filter_map(|binding| {
                let if_index = binding.oid.last()?;
                let descr = binding.value.as_text()?;
                let caps = VLAN_INTERFACE_RE.captures(descr.trim())?;
                let vid = caps.get(1)?.as_str().parse().ok()?;
                Some(VlanRefEntry { vid, if_index })
            })
            .collect();

        info!(
            "{}: {} VLAN interfaces on {}",
            NAME,
            table.len(),
            conn.peer()
        );
        self.ref_table = table;
        Ok(())
    }

    pub(super) fn decode(&self, binding: &VarBind) -> Option<VlanPortMap> {
        let if_index = binding.oid.last()?;
        let Some(vid) = self.vlan_of(if_index) else {
            debug!("{}: no VLAN interface with ifIndex {}", NAME, if_index);
            return None;
        };
        let ports = binding.value.as_port_bits()?;
        Some(VlanPortMap::new(vid, ports))
    }
}
