//! SNMP object identifier type.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An SNMP object identifier such as `.1.3.6.1.2.1.1.1.0`.
///
/// Ordering is lexicographic over the sub-identifiers, which is the order
/// an agent walks its MIB in.
///
/// # Examples
///
/// ```
/// use vlsr_types::Oid;
///
/// let root: Oid = ".1.3.6.1.2.1.17.7.1.4.3.1.2".parse().unwrap();
/// let row = root.child(100);
/// assert!(row.starts_with(&root));
/// assert_eq!(row.last(), Some(100));
/// assert_eq!(row.to_string(), ".1.3.6.1.2.1.17.7.1.4.3.1.2.100");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(Vec<u32>);

impl Oid {
    /// Creates an OID from its sub-identifiers.
    pub fn new(subids: impl Into<Vec<u32>>) -> Self {
        Oid(subids.into())
    }

    /// Returns the sub-identifiers.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Number of sub-identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `prefix` is a (non-strict) prefix of this OID.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns a new OID with `subid` appended.
    pub fn child(&self, subid: u32) -> Oid {
        let mut subids = self.0.clone();
        subids.push(subid);
        Oid(subids)
    }

    /// Last sub-identifier, usually the table index of a column instance.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for subid in &self.0 {
            write!(f, ".{}", subid)?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(ParseError::InvalidOid(s.to_string()));
        }

        trimmed
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Oid)
            .map_err(|_| ParseError::InvalidOid(s.to_string()))
    }
}

impl TryFrom<String> for Oid {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> String {
        oid.to_string()
    }
}

impl From<&[u32]> for Oid {
    fn from(subids: &[u32]) -> Self {
        Oid(subids.to_vec())
    }
}
