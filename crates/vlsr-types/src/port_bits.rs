//! RFC 2674 port list bitmap.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Set of switch ports encoded as an RFC 2674 `PortList`.
///
/// Each octet specifies a set of eight ports. The most significant bit of
/// the first octet is port 1, the least significant bit of the first octet
/// is port 8, the most significant bit of the second octet is port 9, and
/// so on. Port numbers start at 1.
///
/// Equality ignores trailing zero octets, so a 4-octet and an 8-octet list
/// holding the same ports compare equal.
///
/// # Examples
///
/// ```
/// use vlsr_types::PortBits;
///
/// let ports = PortBits::from_bytes(vec![0x80, 0x01]);
/// assert!(ports.contains(1));
/// assert!(ports.contains(16));
/// assert_eq!(ports.ports().collect::<Vec<_>>(), vec![1, 16]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortBits(Vec<u8>);

impl PortBits {
    /// Octet length of the 32-port masks carried by signaling messages.
    pub const MASK_OCTETS: usize = 4;

    /// Highest port number a list may hold (512 octets).
    pub const MAX_PORTS: u32 = 4096;

    /// Creates an empty list with no octets.
    pub fn new() -> Self {
        PortBits(Vec::new())
    }

    /// Creates an all-zero list of `len` octets.
    pub fn zeroed(len: usize) -> Self {
        PortBits(vec![0; len])
    }

    /// Wraps raw `PortList` octets as returned by the device.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        PortBits(bytes.into())
    }

    /// Builds a list from a 32-port mask where the MSB is port 1.
    pub fn from_u32_mask(mask: u32) -> Self {
        PortBits(mask.to_be_bytes().to_vec())
    }

    /// Returns the first 32 ports as a mask where the MSB is port 1.
    ///
    /// Lists shorter than four octets are padded with zero bits.
    pub fn to_u32_mask(&self) -> u32 {
        let mut octets = [0u8; Self::MASK_OCTETS];
        for (dst, src) in octets.iter_mut().zip(self.0.iter()) {
            *dst = *src;
        }
        u32::from_be_bytes(octets)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Octet length of the encoded list.
    pub fn len_octets(&self) -> usize {
        self.0.len()
    }

    /// Checks that `port` is in `1..=MAX_PORTS`.
    pub fn check_port(port: u32) -> Result<u32, ParseError> {
        if port == 0 || port > Self::MAX_PORTS {
            return Err(ParseError::InvalidPort(port));
        }
        Ok(port)
    }

    fn position(port: u32) -> Option<(usize, u8)> {
        Self::check_port(port).ok()?;
        let index = (port - 1) as usize;
        Some((index / 8, 0x80 >> (index % 8)))
    }

    /// Returns true if `port` is a member.
    pub fn contains(&self, port: u32) -> bool {
        match Self::position(port) {
            Some((octet, bit)) => self.0.get(octet).is_some_and(|b| b & bit != 0),
            None => false,
        }
    }

    /// Adds `port`, growing the list if needed. Fails for 0 and for ports
    /// above [`MAX_PORTS`](Self::MAX_PORTS).
    pub fn insert(&mut self, port: u32) -> Result<(), ParseError> {
        let (octet, bit) = Self::position(port).ok_or(ParseError::InvalidPort(port))?;
        if self.0.len() <= octet {
            self.0.resize(octet + 1, 0);
        }
        self.0[octet] |= bit;
        Ok(())
    }

    /// Removes `port`; returns true if it was a member.
    pub fn remove(&mut self, port: u32) -> bool {
        let Some((octet, bit)) = Self::position(port) else {
            return false;
        };
        match self.0.get_mut(octet) {
            Some(b) if *b & bit != 0 => {
                *b &= !bit;
                true
            }
            _ => false,
        }
    }

    /// Clears every port of `other` from this list. The octet length is kept.
    pub fn clear_ports(&mut self, other: &PortBits) {
        for (dst, src) in self.0.iter_mut().zip(other.0.iter()) {
            *dst &= !*src;
        }
    }

    /// Returns true if no port is set.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Number of member ports.
    pub fn count(&self) -> usize {
        self.0.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Iterates over member ports in ascending order.
    pub fn ports(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().enumerate().flat_map(|(octet, byte)| {
            (0..8u32)
                .filter(move |bit| byte & (0x80 >> bit) != 0)
                .map(move |bit| octet as u32 * 8 + bit + 1)
        })
    }

    fn significant(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |pos| pos + 1);
        &self.0[..end]
    }
}

impl PartialEq for PortBits {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for PortBits {}

impl FromIterator<u32> for PortBits {
    /// Out-of-range ports are skipped.
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut bits = PortBits::new();
        for port in iter {
            let _ = bits.insert(port);
        }
        bits
    }
}

impl fmt::Display for PortBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
