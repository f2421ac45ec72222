//! Verification helpers for testing switch control
//!
//! Asserts on the state of a simulated switch after the code under test
//! talked to it.

use std::net::IpAddr;
use thiserror::Error;

use vlsr_snmp::mib;
use vlsr_types::PortBits;

use crate::agent::MemoryAgent;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("No simulated switch at {address}")]
    DeviceNotFound { address: IpAddr },

    #[error("Expected VLAN row {index} on {address}")]
    VlanNotFound { address: IpAddr, index: u32 },

    #[error("Unexpected VLAN row {index} on {address}")]
    VlanPresent { address: IpAddr, index: u32 },

    #[error("Port list mismatch for {column} row {index}: expected {expected:?}, got {actual:?}")]
    PortMismatch {
        column: &'static str,
        index: u32,
        expected: Vec<u32>,
        actual: Vec<u32>,
    },

    #[error("PVID mismatch for port {port}: expected {expected}, got {actual:?}")]
    PvidMismatch {
        port: u32,
        expected: i64,
        actual: Option<i64>,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Device-state verification helper
pub struct DeviceVerifier<'a> {
    agent: &'a MemoryAgent,
    address: IpAddr,
}

impl<'a> DeviceVerifier<'a> {
    /// Create a verifier for the switch at `address`
    pub fn new(agent: &'a MemoryAgent, address: IpAddr) -> Self {
        Self { agent, address }
    }

    fn has_row(&self, index: u32) -> VerifyResult<bool> {
        self.agent
            .device(self.address)
            .map(|device| device.has_vlan_row(index))
            .ok_or(VerificationError::DeviceNotFound {
                address: self.address,
            })
    }

    /// Verify that a static VLAN row exists
    pub fn assert_vlan_exists(&self, index: u32) -> VerifyResult<()> {
        if !self.has_row(index)? {
            return Err(VerificationError::VlanNotFound {
                address: self.address,
                index,
            });
        }
        Ok(())
    }

    /// Verify that a static VLAN row does not exist
    pub fn assert_vlan_absent(&self, index: u32) -> VerifyResult<()> {
        if self.has_row(index)? {
            return Err(VerificationError::VlanPresent {
                address: self.address,
                index,
            });
        }
        Ok(())
    }

    fn port_list(&self, column: &[u32], index: u32) -> VerifyResult<PortBits> {
        let device = self
            .agent
            .device(self.address)
            .ok_or(VerificationError::DeviceNotFound {
                address: self.address,
            })?;
        device
            .get(&mib::instance(column, index))
            .and_then(|value| value.as_port_bits())
            .ok_or(VerificationError::VlanNotFound {
                address: self.address,
                index,
            })
    }

    /// Read the egress (all members) list of a VLAN row
    pub fn egress_ports(&self, index: u32) -> VerifyResult<PortBits> {
        self.port_list(mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS, index)
    }

    /// Read the untagged list of a VLAN row
    pub fn untagged_ports(&self, index: u32) -> VerifyResult<PortBits> {
        self.port_list(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS, index)
    }

    fn compare(column: &'static str, index: u32, actual: PortBits, expected: &[u32]) -> VerifyResult<()> {
        let expected_bits: PortBits = expected.iter().copied().collect();
        if actual != expected_bits {
            return Err(VerificationError::PortMismatch {
                column,
                index,
                expected: expected_bits.ports().collect(),
                actual: actual.ports().collect(),
            });
        }
        Ok(())
    }

    /// Verify the exact egress membership of a VLAN row
    pub fn assert_egress(&self, index: u32, expected: &[u32]) -> VerifyResult<()> {
        Self::compare("egress", index, self.egress_ports(index)?, expected)
    }

    /// Verify the exact untagged membership of a VLAN row
    pub fn assert_untagged(&self, index: u32, expected: &[u32]) -> VerifyResult<()> {
        Self::compare("untagged", index, self.untagged_ports(index)?, expected)
    }

    /// Verify the PVID of a port
    pub fn assert_pvid(&self, port: u32, expected: i64) -> VerifyResult<()> {
        let actual = self
            .agent
            .device(self.address)
            .ok_or(VerificationError::DeviceNotFound {
                address: self.address,
            })?
            .get(&mib::instance(mib::DOT1Q_PVID, port))
            .and_then(|value| value.as_integer());
        if actual != Some(expected) {
            return Err(VerificationError::PvidMismatch {
                port,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{rfc2674_switch, switch_addr};

    #[test]
    fn test_verifier_on_fixture() {
        let agent = MemoryAgent::new().with_device(switch_addr(1), rfc2674_switch().build());
        let verifier = DeviceVerifier::new(&agent, switch_addr(1));

        verifier.assert_vlan_exists(10).unwrap();
        verifier.assert_vlan_absent(11).unwrap();
        verifier.assert_egress(10, &[3, 4, 5]).unwrap();
        verifier.assert_untagged(10, &[5]).unwrap();
        assert!(verifier.assert_untagged(10, &[3]).is_err());
    }

    #[test]
    fn test_verifier_missing_device() {
        let agent = MemoryAgent::new();
        let verifier = DeviceVerifier::new(&agent, switch_addr(9));
        assert!(matches!(
            verifier.assert_vlan_exists(1),
            Err(VerificationError::DeviceNotFound { .. })
        ));
    }
}
