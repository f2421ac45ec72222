//! VLAN port-map cache entries

use serde::{Deserialize, Serialize};

use vlsr_types::PortBits;

/// Port membership of one VLAN as cached by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanPortMap {
    /// VLAN id (0 means "not decoded")
    pub vid: u32,
    /// Member ports
    pub ports: PortBits,
}

impl VlanPortMap {
    pub fn new(vid: u32, ports: PortBits) -> Self {
        Self { vid, ports }
    }

    /// An entry without member ports
    pub fn empty(vid: u32) -> Self {
        Self::new(vid, PortBits::new())
    }
}

/// Returns the entry for `vid`, if cached
pub fn find(list: &[VlanPortMap], vid: u32) -> Option<&VlanPortMap> {
    list.iter().find(|vpm| vpm.vid == vid)
}

pub fn find_mut(list: &mut [VlanPortMap], vid: u32) -> Option<&mut VlanPortMap> {
    list.iter_mut().find(|vpm| vpm.vid == vid)
}

/// Removes the first entry for `vid`
pub fn remove_first(list: &mut Vec<VlanPortMap>, vid: u32) -> Option<VlanPortMap> {
    list.iter()
        .position(|vpm| vpm.vid == vid)
        .map(|pos| list.remove(pos))
}
