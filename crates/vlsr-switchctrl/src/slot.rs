//! Chassis slot inventory

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Line card type of a chassis slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlotType {
    /// Gigabit Ethernet (`gi`)
    #[serde(rename = "gi")]
    GigE,
    /// 10 Gigabit Ethernet (`te`)
    #[serde(rename = "te")]
    TenGigE,
    /// Unknown slot
    #[default]
    #[serde(rename = "illegal")]
    Illegal,
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::GigE => write!(f, "gi"),
            SlotType::TenGigE => write!(f, "te"),
            SlotType::Illegal => write!(f, "illegal"),
        }
    }
}

impl FromStr for SlotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gi" => Ok(SlotType::GigE),
            "te" => Ok(SlotType::TenGigE),
            _ => Err(format!("unknown slot type '{}'", s)),
        }
    }
}

/// One configured slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    #[serde(rename = "number")]
    pub slot_number: u16,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
}

/// Static slot table, filled from configuration at startup
#[derive(Debug, Clone, Default)]
pub struct SlotInventory {
    slots: BTreeMap<u16, SlotType>,
}

impl SlotInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot; a repeated slot number replaces the earlier type
    pub fn add_slot_entry(&mut self, entry: SlotEntry) {
        self.slots.insert(entry.slot_number, entry.slot_type);
    }

    /// Type of `slot_number`, [`SlotType::Illegal`] if not configured
    pub fn get_slot_type(&self, slot_number: u16) -> SlotType {
        self.slots
            .get(&slot_number)
            .copied()
            .unwrap_or(SlotType::Illegal)
    }

    pub fn entries(&self) -> impl Iterator<Item = SlotEntry> + '_ {
        self.slots.iter().map(|(slot_number, slot_type)| SlotEntry {
            slot_number: *slot_number,
            slot_type: *slot_type,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_illegal_sentinel() {
        let mut inventory = SlotInventory::new();
        inventory.add_slot_entry(SlotEntry {
            slot_number: 0,
            slot_type: SlotType::GigE,
        });
        inventory.add_slot_entry(SlotEntry {
            slot_number: 2,
            slot_type: SlotType::TenGigE,
        });

        assert_eq!(inventory.get_slot_type(0), SlotType::GigE);
        assert_eq!(inventory.get_slot_type(2), SlotType::TenGigE);
        assert_eq!(inventory.get_slot_type(1), SlotType::Illegal);
    }

    #[test]
    fn test_repeated_slot_replaces_type() {
        let mut inventory = SlotInventory::new();
        inventory.add_slot_entry(SlotEntry {
            slot_number: 4,
            slot_type: SlotType::GigE,
        });
        inventory.add_slot_entry(SlotEntry {
            slot_number: 4,
            slot_type: SlotType::TenGigE,
        });
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.get_slot_type(4), SlotType::TenGigE);
    }

    #[test]
    fn test_slot_type_spellings() {
        assert_eq!("gi".parse::<SlotType>().unwrap(), SlotType::GigE);
        assert_eq!("TE".parse::<SlotType>().unwrap(), SlotType::TenGigE);
        assert!("fe".parse::<SlotType>().is_err());
        assert_eq!(SlotType::TenGigE.to_string(), "te");
    }
}
