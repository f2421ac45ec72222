//! Transport and connection traits for the device-management protocol.
//!
//! PDU encoding, retransmission and authentication live behind these
//! traits. The switch-control core only issues single-object requests and
//! awaits each answer before sending the next one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use vlsr_types::Oid;

use crate::error::SnmpResult;
use crate::value::{SnmpValue, VarBind};

/// Community used by VLSR deployments when none is configured.
pub const DEFAULT_COMMUNITY: &str = "dragon";

/// Protocol version requested when opening a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnmpVersion {
    #[default]
    V1,
    V2c,
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpVersion::V1 => write!(f, "v1"),
            SnmpVersion::V2c => write!(f, "v2c"),
        }
    }
}

/// Authentication parameters handed to the transport on open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub community: String,
    pub version: SnmpVersion,
}

impl Credentials {
    pub fn new(community: impl Into<String>, version: SnmpVersion) -> Self {
        Self {
            community: community.into(),
            version,
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_COMMUNITY, SnmpVersion::V1)
    }
}

/// An open session to one agent.
///
/// A connection is owned by exactly one switch session. Dropping it must
/// release the underlying transport resources; [`close`](Self::close) does
/// the same explicitly and reports transport errors.
#[async_trait]
pub trait SnmpConnection: Send + Sync {
    /// Address of the agent this connection talks to.
    fn peer(&self) -> IpAddr;

    /// GET a single object.
    ///
    /// v2c exception values (`noSuchObject`, `noSuchInstance`) are returned
    /// as values, not errors.
    async fn get(&mut self, oid: &Oid) -> SnmpResult<SnmpValue>;

    /// GET-NEXT: the first object strictly after `oid`.
    ///
    /// Past the end of the view the binding carries `endOfMibView`.
    async fn get_next(&mut self, oid: &Oid) -> SnmpResult<VarBind>;

    /// SET a single object.
    async fn set(&mut self, oid: &Oid, value: SnmpValue) -> SnmpResult<()>;

    /// Closes the session.
    async fn close(&mut self) -> SnmpResult<()>;
}

/// Factory for [`SnmpConnection`]s.
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    /// Opens a session to the agent at `address`.
    async fn open(
        &self,
        address: IpAddr,
        credentials: &Credentials,
    ) -> SnmpResult<Box<dyn SnmpConnection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_credentials() {
        let creds = Credentials::default();
        assert_eq!(creds.community, "dragon");
        assert_eq!(creds.version, SnmpVersion::V1);
    }

    #[test]
    fn test_version_display() {
        assert_eq!(SnmpVersion::V1.to_string(), "v1");
        assert_eq!(SnmpVersion::V2c.to_string(), "v2c");
    }
}
