//! SwitchCtrlGlobal - registry of switch sessions, local IDs and slots
//!
//! One registry is constructed per process and handed to every call site
//! that needs switch control or local-ID lookup. It owns:
//! - at most one session per switch address
//! - the local-ID registry (optionally seeded from the preserved file)
//! - the chassis slot inventory

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use vlsr_snmp::{mib, Credentials, SnmpTransport};
use vlsr_types::Oid;

use crate::config::SwitchCtrlConfig;
use crate::error::{SwitchCtrlError, SwitchCtrlResult};
use crate::local_id::{LocalIdMessage, LocalIdRegistry};
use crate::session::SwitchCtrlSession;
use crate::slot::{SlotEntry, SlotInventory, SlotType};
use crate::variant::SwitchVariant;
use crate::vendor::{Vendor, VendorModel};

/// Registry shared behind one async lock
pub type SharedSwitchCtrl = Arc<Mutex<SwitchCtrlGlobal>>;

pub struct SwitchCtrlGlobal {
    transport: Arc<dyn SnmpTransport>,
    credentials: Credentials,
    vendor_model: VendorModel,
    sessions: Vec<SwitchCtrlSession>,
    local_ids: LocalIdRegistry,
    slots: SlotInventory,
}

impl SwitchCtrlGlobal {
    /// Creates the registry.
    ///
    /// When `preserved_local_ids` is given the file is read here; a missing
    /// or unreadable file is logged and the registry starts empty.
    pub fn new(
        transport: Arc<dyn SnmpTransport>,
        credentials: Credentials,
        vendor_model: VendorModel,
        preserved_local_ids: Option<PathBuf>,
    ) -> Self {
        let mut local_ids = LocalIdRegistry::new();
        if let Some(path) = preserved_local_ids {
            if let Err(e) = local_ids.load_preserved(&path) {
                error!("Failed to read preserved local IDs {}: {}", path.display(), e);
            }
        }

        Self {
            transport,
            credentials,
            vendor_model,
            sessions: Vec::new(),
            local_ids,
            slots: SlotInventory::new(),
        }
    }

    /// Builds the registry from configuration: credentials, vendor model,
    /// preserved local IDs, local-ID seeds and the slot inventory
    pub fn from_config(
        config: &SwitchCtrlConfig,
        transport: Arc<dyn SnmpTransport>,
    ) -> SwitchCtrlResult<Self> {
        config.validate()?;

        let mut global = Self::new(
            transport,
            config.credentials(),
            config.vendor_model()?,
            config.preserved_path().map(PathBuf::from),
        );

        for entry in &config.slots {
            global.add_slot_entry(*entry);
        }
        for seed in &config.local_id_seeds {
            global.process_local_id_message(&LocalIdMessage::add(seed.to_local_id()));
        }

        info!(
            "Switch control ready: {} slots, {} local IDs",
            global.slots.len(),
            global.local_ids.len()
        );
        Ok(global)
    }

    /// Creates, connects and registers every switch in `config`.
    ///
    /// Failures are logged and skipped; returns the number of sessions
    /// opened.
    pub async fn open_configured_sessions(&mut self, config: &SwitchCtrlConfig) -> usize {
        let mut opened = 0;
        for switch in &config.switches {
            let model = match config.switch_vendor_model(switch) {
                Ok(model) => model,
                Err(e) => {
                    warn!("Skipping switch {}: {}", switch.address, e);
                    continue;
                }
            };

            let mut session = match self.create_session_with_model(model, switch.address).await {
                Ok(session) => session,
                Err(e) => {
                    warn!("Skipping switch {}: {}", switch.address, e);
                    continue;
                }
            };

            if !session.connect().await {
                warn!("Skipping switch {}: connect failed", switch.address);
                continue;
            }
            if self.add_session(session) {
                opened += 1;
            }
        }
        opened
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn vendor_model(&self) -> VendorModel {
        self.vendor_model
    }

    /// Creates an unconnected session using the configured vendor model
    pub async fn create_session(&self, address: IpAddr) -> SwitchCtrlResult<SwitchCtrlSession> {
        self.create_session_with_model(self.vendor_model, address)
            .await
    }

    /// Creates an unconnected session for `address`.
    ///
    /// With [`VendorModel::AutoDetect`] a short-lived connection reads the
    /// switch's `sysDescr` first.
    #[instrument(skip(self))]
    pub async fn create_session_with_model(
        &self,
        model: VendorModel,
        address: IpAddr,
    ) -> SwitchCtrlResult<SwitchCtrlSession> {
        let (vendor, description) = match model {
            VendorModel::AutoDetect => self.detect_vendor(address).await?,
            VendorModel::Fixed(vendor) => (vendor, String::new()),
        };

        let variant = SwitchVariant::for_vendor(vendor).ok_or(SwitchCtrlError::IllegalVendor {
            address,
            description,
        })?;
        debug!("Switch {} is {}, using {}", address, vendor, variant.name());

        Ok(SwitchCtrlSession::new(
            variant,
            address,
            Arc::clone(&self.transport),
            self.credentials.clone(),
        ))
    }

    /// Reads the vendor of `address`; the probe connection is always closed
    async fn detect_vendor(&self, address: IpAddr) -> SwitchCtrlResult<(Vendor, String)> {
        let mut conn = self.transport.open(address, &self.credentials).await?;
        let sys_descr = Oid::from(mib::SYS_DESCR);
        let answer = conn.get(&sys_descr).await;

        if let Err(e) = conn.close().await {
            debug!("Closing probe connection to {}: {}", address, e);
        }

        let value = answer?;
        let description = value
            .as_text()
            .ok_or_else(|| SwitchCtrlError::unexpected_value(&sys_descr, value.to_string()))?;
        Ok((Vendor::from_description(&description), description))
    }

    /// Registers `session`; fails if a session with the same name and
    /// address is already registered
    pub fn add_session(&mut self, session: SwitchCtrlSession) -> bool {
        if self.sessions.iter().any(|s| *s == session) {
            warn!(
                "Session {} to {} already registered",
                session.name(),
                session.address()
            );
            return false;
        }
        info!("Registered session {} to {}", session.name(), session.address());
        self.sessions.push(session);
        true
    }

    pub fn session(&self, address: IpAddr) -> Option<&SwitchCtrlSession> {
        self.sessions.iter().find(|s| s.address() == address)
    }

    pub fn session_mut(&mut self, address: IpAddr) -> Option<&mut SwitchCtrlSession> {
        self.sessions.iter_mut().find(|s| s.address() == address)
    }

    pub fn sessions(&self) -> &[SwitchCtrlSession] {
        &self.sessions
    }

    /// Returns the session to `address`, creating and connecting one if
    /// none is registered
    pub async fn get_or_create_session(
        &mut self,
        address: IpAddr,
    ) -> SwitchCtrlResult<&mut SwitchCtrlSession> {
        if let Some(pos) = self.sessions.iter().position(|s| s.address() == address) {
            return Ok(&mut self.sessions[pos]);
        }

        let mut session = self.create_session(address).await?;
        if !session.connect().await {
            return Err(SwitchCtrlError::NotConnected { address });
        }
        info!("Registered session {} to {}", session.name(), address);
        self.sessions.push(session);
        let last = self.sessions.len() - 1;
        Ok(&mut self.sessions[last])
    }

    /// Refreshes every session; true only if all refreshes succeeded
    pub async fn refresh_sessions(&mut self) -> bool {
        let mut ok = true;
        for session in &mut self.sessions {
            ok &= session.refresh().await;
        }
        ok
    }

    /// Disconnects and drops every session
    pub async fn shutdown(&mut self) {
        for session in &mut self.sessions {
            session.disconnect().await;
        }
        info!("Closed {} switch sessions", self.sessions.len());
        self.sessions.clear();
    }

    /// Wraps the registry for use from several tasks
    pub fn into_shared(self) -> SharedSwitchCtrl {
        Arc::new(Mutex::new(self))
    }

    pub fn local_ids(&self) -> &LocalIdRegistry {
        &self.local_ids
    }

    pub fn add_local_id(&mut self, id_type: u16, value: u16, tag: u16) {
        self.local_ids.add_local_id(id_type, value, tag);
    }

    pub fn delete_local_id(&mut self, id_type: u16, value: u16, tag: u16) {
        self.local_ids.delete_local_id(id_type, value, tag);
    }

    pub fn has_local_id(&self, id_type: u16, value: u16, tag: u16) -> bool {
        self.local_ids.has_local_id(id_type, value, tag)
    }

    pub fn get_ports_by_local_id(&self, handle: u32) -> Vec<u32> {
        self.local_ids.get_ports_by_local_id(handle)
    }

    pub fn process_local_id_message(&mut self, message: &LocalIdMessage) {
        self.local_ids.process_local_id_message(message);
    }

    pub fn slots(&self) -> &SlotInventory {
        &self.slots
    }

    pub fn add_slot_entry(&mut self, entry: SlotEntry) {
        self.slots.add_slot_entry(entry);
    }

    pub fn get_slot_type(&self, slot_number: u16) -> SlotType {
        self.slots.get_slot_type(slot_number)
    }
}
