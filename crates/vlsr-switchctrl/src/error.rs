//! Error types for switch-control operations.
//!
//! Session operations report success as `bool`; these errors are what
//! the internal helpers propagate with `?` and what gets logged before
//! the boolean is returned.

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

use vlsr_snmp::SnmpError;
use vlsr_types::ParseError;

/// Result type alias for switch-control operations.
pub type SwitchCtrlResult<T> = Result<T, SwitchCtrlError>;

/// Errors that can occur during switch-control operations.
#[derive(Debug, Error)]
pub enum SwitchCtrlError {
    /// Device request failed (transport or agent error status).
    #[error(transparent)]
    Snmp(#[from] SnmpError),

    /// Invalid port number or object identifier.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The device description matches no known vendor signature.
    #[error("Switch {address} has unrecognized vendor description '{description}'")]
    IllegalVendor {
        /// The switch address.
        address: IpAddr,
        /// The reported `sysDescr`.
        description: String,
    },

    /// The session has no open connection.
    #[error("Switch {address} is not connected")]
    NotConnected {
        /// The switch address.
        address: IpAddr,
    },

    /// The switch does not implement the Q-BRIDGE operations requested.
    #[error("Switch {address} is not RFC 2674 compatible")]
    Incompatible {
        /// The switch address.
        address: IpAddr,
    },

    /// The vendor variant does not implement the operation.
    #[error("{operation} is not supported by {variant}")]
    Unsupported {
        /// Vendor variant name.
        variant: &'static str,
        /// The operation.
        operation: &'static str,
    },

    /// VLAN id invalid or not known to the session.
    #[error("VLAN {vlan} not found or invalid")]
    VlanNotFound {
        /// The VLAN id.
        vlan: u32,
    },

    /// The device answered with a value of the wrong type.
    #[error("Unexpected value for {object}: {message}")]
    UnexpectedValue {
        /// The object requested.
        object: String,
        /// What was wrong.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Preserved local-ID file could not be parsed.
    #[error("{path}:{line}: {message}")]
    PreservedState {
        /// The file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SwitchCtrlError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an unexpected value error.
    pub fn unexpected_value(object: impl ToString, message: impl Into<String>) -> Self {
        Self::UnexpectedValue {
            object: object.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if the device was reached and refused the request.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, SwitchCtrlError::Snmp(e) if e.is_protocol_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_error_display() {
        let err = SwitchCtrlError::IllegalVendor {
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            description: "Acme".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Switch 10.0.0.1 has unrecognized vendor description 'Acme'"
        );
    }

    #[test]
    fn test_unsupported_display() {
        let err = SwitchCtrlError::Unsupported {
            variant: "VLSR-Force10",
            operation: "create VLAN",
        };
        assert_eq!(err.to_string(), "create VLAN is not supported by VLSR-Force10");
    }

    #[test]
    fn test_protocol_error_passthrough() {
        let oid = "1.3.6.1.2.1.1.1.0".parse().unwrap();
        let err: SwitchCtrlError = SnmpError::error_status("set", &oid, "notWritable").into();
        assert!(err.is_protocol_error());
        assert!(err.to_string().contains("notWritable"));

        let err: SwitchCtrlError = SnmpError::transport("get", "timeout").into();
        assert!(!err.is_protocol_error());
    }
}
