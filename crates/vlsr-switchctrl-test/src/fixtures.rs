//! Test fixtures for the switch models VLSR supports
//!
//! Each fixture builds a [`DeviceMib`] with the vendor's system
//! description and a small Q-BRIDGE VLAN table.

use std::net::{IpAddr, Ipv4Addr};

use vlsr_snmp::mib;
use vlsr_snmp::SnmpValue;
use vlsr_types::PortBits;

use crate::agent::DeviceMib;

/// `sysDescr` of a Dell PowerConnect 5224 (generic RFC 2674)
pub const POWERCONNECT_5224: &str = "PowerConnect 5224";

/// `sysDescr` of an Intel Express 530T (note the trailing space)
pub const INTEL_ES530: &str = "Intel(R) Express 530T Switch ";

/// `sysDescr` prefix of Force10 E-series chassis
pub const FORCE10_E600: &str =
    "Force10 Networks Real Time Operating System Software Version: 6.2.1.3";

/// `sysDescr` of an Ether-Raptor ER1010
pub const RAPTOR_ER1010: &str = "Ether-Raptor ER1010 Ethernet Switch";

/// `sysDescr` of a Lambda Optical Spectra switch
pub const LAMBDA_SPECTRA: &str = "Spectra LambdaNode 2000";

/// `sysDescr` no signature matches
pub const UNKNOWN_SWITCH: &str = "Acme Frobnicator 9000";

/// Base ifIndex Force10 assigns to VLAN interfaces
pub const FORCE10_VLAN_IFINDEX_BASE: u32 = 1_107_787_776;

/// Address of the `n`th test switch
pub fn switch_addr(n: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 100, 0, n))
}

/// One VLAN row of a fixture
#[derive(Debug, Clone)]
pub struct VlanRow {
    /// VLAN id
    pub vid: u32,
    /// All member ports
    pub egress: Vec<u32>,
    /// Untagged member ports
    pub untagged: Vec<u32>,
}

impl VlanRow {
    pub fn new(vid: u32, egress: &[u32], untagged: &[u32]) -> Self {
        Self {
            vid,
            egress: egress.to_vec(),
            untagged: untagged.to_vec(),
        }
    }

    fn bits(ports: &[u32], octets: usize) -> PortBits {
        let mut bits = PortBits::zeroed(octets);
        for port in ports {
            let _ = bits.insert(*port);
        }
        bits
    }
}

/// Builder for simulated switches
#[derive(Debug, Clone)]
pub struct SwitchFixture {
    description: String,
    port_octets: usize,
    vlans: Vec<VlanRow>,
    ifindex_vlans: bool,
}

impl SwitchFixture {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            port_octets: PortBits::MASK_OCTETS,
            vlans: Vec::new(),
            ifindex_vlans: false,
        }
    }

    /// Octet length of every port list
    pub fn port_octets(mut self, octets: usize) -> Self {
        self.port_octets = octets;
        self
    }

    /// Add a VLAN row
    pub fn vlan(mut self, vid: u32, egress: &[u32], untagged: &[u32]) -> Self {
        self.vlans.push(VlanRow::new(vid, egress, untagged));
        self
    }

    /// Index the static VLAN table by interface index, publishing
    /// `Vlan <vid>` rows in `ifDescr` (Force10 style)
    pub fn indexed_by_interface(mut self) -> Self {
        self.ifindex_vlans = true;
        self
    }

    /// Table index of `vid` on the built device
    pub fn index_of(&self, vid: u32) -> u32 {
        if self.ifindex_vlans {
            FORCE10_VLAN_IFINDEX_BASE + vid
        } else {
            vid
        }
    }

    pub fn build(&self) -> DeviceMib {
        let mut device = DeviceMib::new(&self.description);
        device.set_port_octets(self.port_octets);

        for row in &self.vlans {
            let index = self.index_of(row.vid);
            device.insert_vlan_row(
                index,
                &VlanRow::bits(&row.egress, self.port_octets),
                &VlanRow::bits(&row.untagged, self.port_octets),
            );
            if self.ifindex_vlans {
                device.insert(
                    mib::instance(mib::IF_DESCR, index),
                    SnmpValue::OctetString(format!("Vlan {}", row.vid).into_bytes()),
                );
            }
        }

        if self.ifindex_vlans {
            // Physical interfaces share the ifDescr column
            for slot_port in 1..=2u32 {
                device.insert(
                    mib::instance(mib::IF_DESCR, 33_865_728 + slot_port),
                    SnmpValue::OctetString(format!("GigabitEthernet 0/{}", slot_port).into_bytes()),
                );
            }
        }

        device
    }
}

/// Default VLAN 1 with ports 1-8 untagged, VLAN 10 with ports 3-4 tagged
/// and port 5 untagged, and an empty VLAN 20
pub fn standard_vlans(fixture: SwitchFixture) -> SwitchFixture {
    fixture
        .vlan(1, &[1, 2, 6, 7, 8], &[1, 2, 6, 7, 8])
        .vlan(10, &[3, 4, 5], &[5])
        .vlan(20, &[], &[])
}

/// Generic RFC 2674 switch
pub fn rfc2674_switch() -> SwitchFixture {
    standard_vlans(SwitchFixture::new(POWERCONNECT_5224))
}

/// Intel Express 530T
pub fn intel_switch() -> SwitchFixture {
    standard_vlans(SwitchFixture::new(INTEL_ES530))
}

/// Force10 E600 with VLAN interfaces in `ifDescr`
pub fn force10_switch() -> SwitchFixture {
    standard_vlans(SwitchFixture::new(FORCE10_E600).indexed_by_interface())
}

/// Ether-Raptor ER1010
pub fn raptor_switch() -> SwitchFixture {
    standard_vlans(SwitchFixture::new(RAPTOR_ER1010))
}

/// Lambda Optical switch without a Q-BRIDGE table
pub fn lambda_switch() -> SwitchFixture {
    SwitchFixture::new(LAMBDA_SPECTRA)
}

/// Switch with an unrecognized description
pub fn unknown_switch() -> SwitchFixture {
    standard_vlans(SwitchFixture::new(UNKNOWN_SWITCH))
}

/// Preserved local-ID file contents covering every entry type
pub const PRESERVED_LOCAL_IDS: &str = "\
1:7
2:100 5 6
3:200 1 2 3
# operator note
1:8 99
";
