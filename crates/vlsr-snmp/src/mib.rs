//! Object identifiers used by VLSR switch control.
//!
//! Column OIDs are given without an instance index; append the table index
//! with [`Oid::child`](vlsr_types::Oid::child).

use vlsr_types::Oid;

/// SNMPv2-MIB `sysDescr.0`
pub const SYS_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];

/// IF-MIB `ifDescr` column
pub const IF_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];

/// Q-BRIDGE-MIB `dot1qVlanStaticName` column
pub const DOT1Q_VLAN_STATIC_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 1];

/// Q-BRIDGE-MIB `dot1qVlanStaticEgressPorts` column (all member ports)
pub const DOT1Q_VLAN_STATIC_EGRESS_PORTS: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 2];

/// Q-BRIDGE-MIB `dot1qVlanStaticUntaggedPorts` column
pub const DOT1Q_VLAN_STATIC_UNTAGGED_PORTS: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 4];

/// Q-BRIDGE-MIB `dot1qVlanStaticRowStatus` column
pub const DOT1Q_VLAN_STATIC_ROW_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 5];

/// Q-BRIDGE-MIB `dot1qPvid` column, indexed by port
pub const DOT1Q_PVID: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 5, 1, 1];

/// SNMPv2-TC RowStatus values.
pub mod row_status {
    pub const ACTIVE: i64 = 1;
    pub const NOT_IN_SERVICE: i64 = 2;
    pub const NOT_READY: i64 = 3;
    pub const CREATE_AND_GO: i64 = 4;
    pub const CREATE_AND_WAIT: i64 = 5;
    pub const DESTROY: i64 = 6;
}

/// Builds the OID of a column instance.
pub fn instance(column: &[u32], index: u32) -> Oid {
    Oid::from(column).child(index)
}
