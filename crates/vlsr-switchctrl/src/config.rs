//! Configuration file support for switch control
//!
//! Loads and validates the switch-control configuration from TOML.
//! Default location: /etc/vlsr/switchctrl.toml

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::warn;

use vlsr_snmp::{Credentials, SnmpVersion, DEFAULT_COMMUNITY};

use crate::error::{SwitchCtrlError, SwitchCtrlResult};
use crate::local_id::{LocalId, DEFAULT_PRESERVED_PATH};
use crate::slot::{SlotEntry, SlotType};
use crate::vendor::VendorModel;

/// Default configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vlsr/switchctrl.toml";

/// SNMP session parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpConfig {
    /// Community string
    #[serde(default = "default_community")]
    pub community: String,

    /// Protocol version (`v1` or `v2c`)
    #[serde(default)]
    pub version: SnmpVersion,

    /// Vendor model for switches without their own: `auto` or a vendor name
    #[serde(default = "default_vendor_model")]
    pub vendor_model: String,
}

/// Preserved local-ID state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalIdConfig {
    /// File written by the DRAGON CLI
    #[serde(default = "default_preserved_path")]
    pub preserved_path: PathBuf,

    /// Read the file at startup
    #[serde(default = "default_load_preserved")]
    pub load_preserved: bool,
}

/// A switch to open a session to at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub address: IpAddr,

    /// Overrides `snmp.vendor_model` for this switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_model: Option<String>,
}

/// Local ID registered at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalIdSeed {
    #[serde(rename = "type")]
    pub id_type: u16,
    pub value: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<u16>,
}

impl LocalIdSeed {
    pub fn to_local_id(&self) -> LocalId {
        LocalId::with_tags(self.id_type, self.value, self.tags.iter().copied())
    }
}

/// Complete switch-control configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchCtrlConfig {
    #[serde(default)]
    pub snmp: SnmpConfig,

    #[serde(default)]
    pub local_ids: LocalIdConfig,

    /// Chassis slot inventory
    #[serde(default, rename = "slot")]
    pub slots: Vec<SlotEntry>,

    #[serde(default, rename = "switch")]
    pub switches: Vec<SwitchConfig>,

    #[serde(default, rename = "local_id")]
    pub local_id_seeds: Vec<LocalIdSeed>,
}

// Default functions
fn default_community() -> String {
    DEFAULT_COMMUNITY.to_string()
}

fn default_vendor_model() -> String {
    "auto".to_string()
}

fn default_preserved_path() -> PathBuf {
    PathBuf::from(DEFAULT_PRESERVED_PATH)
}

fn default_load_preserved() -> bool {
    true
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            community: default_community(),
            version: SnmpVersion::default(),
            vendor_model: default_vendor_model(),
        }
    }
}

impl Default for LocalIdConfig {
    fn default() -> Self {
        Self {
            preserved_path: default_preserved_path(),
            load_preserved: default_load_preserved(),
        }
    }
}

fn parse_model(field: &str, model: &str) -> SwitchCtrlResult<VendorModel> {
    model
        .parse()
        .map_err(|e: String| SwitchCtrlError::invalid_config(field, e))
}

impl SwitchCtrlConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> SwitchCtrlResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SwitchCtrlError::invalid_config(path.display().to_string(), e.to_string())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SwitchCtrlError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> SwitchCtrlResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> SwitchCtrlResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SwitchCtrlError::invalid_config("config", e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Session credentials
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.snmp.community.clone(), self.snmp.version)
    }

    /// Default vendor model
    pub fn vendor_model(&self) -> SwitchCtrlResult<VendorModel> {
        parse_model("snmp.vendor_model", &self.snmp.vendor_model)
    }

    /// Vendor model of one configured switch
    pub fn switch_vendor_model(&self, switch: &SwitchConfig) -> SwitchCtrlResult<VendorModel> {
        match &switch.vendor_model {
            Some(model) => parse_model("switch.vendor_model", model),
            None => self.vendor_model(),
        }
    }

    /// Preserved local-ID file to read at startup, if enabled
    pub fn preserved_path(&self) -> Option<&Path> {
        self.local_ids
            .load_preserved
            .then_some(self.local_ids.preserved_path.as_path())
    }

    /// Validate configuration
    pub fn validate(&self) -> SwitchCtrlResult<()> {
        if self.snmp.community.is_empty() {
            return Err(SwitchCtrlError::invalid_config(
                "snmp.community",
                "must not be empty",
            ));
        }

        self.vendor_model()?;

        let mut addresses = HashSet::new();
        for switch in &self.switches {
            self.switch_vendor_model(switch)?;
            if !addresses.insert(switch.address) {
                return Err(SwitchCtrlError::invalid_config(
                    "switch.address",
                    format!("{} configured twice", switch.address),
                ));
            }
        }

        if let Some(slot) = self
            .slots
            .iter()
            .find(|slot| slot.slot_type == SlotType::Illegal)
        {
            return Err(SwitchCtrlError::invalid_config(
                "slot.type",
                format!("slot {} must be 'gi' or 'te'", slot.slot_number),
            ));
        }

        Ok(())
    }
}
