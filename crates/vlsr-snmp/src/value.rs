//! SNMP values and variable bindings.

use serde::{Deserialize, Serialize};
use std::fmt;

use vlsr_types::{Oid, PortBits};

/// A value carried in a variable binding.
///
/// Only the types the switch-control core reads or writes are modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpValue {
    /// INTEGER (RowStatus, PVID).
    Integer(i64),
    /// Gauge32 / Unsigned32.
    Gauge(u32),
    /// OCTET STRING (descriptions, PortList bitmaps).
    OctetString(Vec<u8>),
    /// OBJECT IDENTIFIER.
    ObjectId(Oid),
    Null,
    /// v2c exception: the walk ran past the end of the agent's view.
    EndOfMibView,
    /// v2c exception: the object type is not implemented.
    NoSuchObject,
    /// v2c exception: the object type exists but the instance does not.
    NoSuchInstance,
}

impl SnmpValue {
    /// Returns true for the v2c exception values that end a walk.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            SnmpValue::EndOfMibView | SnmpValue::NoSuchObject | SnmpValue::NoSuchInstance
        )
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SnmpValue::OctetString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Decodes an OCTET STRING as text, replacing invalid UTF-8.
    pub fn as_text(&self) -> Option<String> {
        self.as_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Decodes an OCTET STRING as an RFC 2674 `PortList`.
    pub fn as_port_bits(&self) -> Option<PortBits> {
        self.as_bytes().map(PortBits::from_bytes)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SnmpValue::Integer(v) => Some(*v),
            SnmpValue::Gauge(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl From<&PortBits> for SnmpValue {
    fn from(bits: &PortBits) -> Self {
        SnmpValue::OctetString(bits.as_bytes().to_vec())
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpValue::Integer(v) => write!(f, "INTEGER: {}", v),
            SnmpValue::Gauge(v) => write!(f, "Gauge32: {}", v),
            SnmpValue::OctetString(bytes) => {
                write!(f, "Hex-STRING:")?;
                for byte in bytes {
                    write!(f, " {:02X}", byte)?;
                }
                Ok(())
            }
            SnmpValue::ObjectId(oid) => write!(f, "OID: {}", oid),
            SnmpValue::Null => write!(f, "NULL"),
            SnmpValue::EndOfMibView => write!(f, "endOfMibView"),
            SnmpValue::NoSuchObject => write!(f, "noSuchObject"),
            SnmpValue::NoSuchInstance => write!(f, "noSuchInstance"),
        }
    }
}

/// An (OID, value) pair as returned by get-next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarBind {
    pub oid: Oid,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: Oid, value: SnmpValue) -> Self {
        Self { oid, value }
    }
}
