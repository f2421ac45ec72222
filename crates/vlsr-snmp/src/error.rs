//! Error types for device-management requests.
//!
//! Transport failures (the agent could not be reached or did not answer)
//! and protocol failures (the agent answered with an error status) are
//! kept apart so callers can log the device-supplied reason.

use std::net::IpAddr;
use thiserror::Error;

use vlsr_types::Oid;

/// Result type alias for SNMP operations.
pub type SnmpResult<T> = Result<T, SnmpError>;

/// Errors returned by an [`SnmpTransport`](crate::SnmpTransport) or
/// [`SnmpConnection`](crate::SnmpConnection).
#[derive(Debug, Error)]
pub enum SnmpError {
    /// Opening a session to the agent failed.
    #[error("Failed to open SNMP session to {address}: {reason}")]
    Open {
        /// The agent address.
        address: IpAddr,
        /// Transport-supplied reason.
        reason: String,
    },

    /// The request did not complete (timeout, socket error, closed session).
    #[error("SNMP {operation} failed: {message}")]
    Transport {
        /// The request type ("get", "getnext", "set").
        operation: &'static str,
        /// Error message.
        message: String,
    },

    /// The agent answered with a non-zero error status.
    #[error("SNMP {operation} on {oid} rejected by agent: {status}")]
    ErrorStatus {
        /// The request type.
        operation: &'static str,
        /// The object the request addressed.
        oid: Oid,
        /// Agent error string (e.g. "noSuchName", "notWritable").
        status: String,
    },

    /// The connection was already closed.
    #[error("SNMP session to {address} is closed")]
    Closed {
        /// The agent address.
        address: IpAddr,
    },
}

impl SnmpError {
    /// Creates a transport error.
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Creates an error-status error.
    pub fn error_status(operation: &'static str, oid: &Oid, status: impl Into<String>) -> Self {
        Self::ErrorStatus {
            operation,
            oid: oid.clone(),
            status: status.into(),
        }
    }

    /// Returns true if the agent answered but refused the request.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, SnmpError::ErrorStatus { .. })
    }
}
