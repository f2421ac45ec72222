//! SwitchCtrlSession - live control session to one switch
//!
//! Session flow:
//! 1. `connect` opens the SNMP session, identifies the vendor from
//!    `sysDescr` and reads the static VLAN table into two caches
//! 2. VLAN and port operations write the device first and update the
//!    caches only after every write was acknowledged
//! 3. `verify_vlan` / `vlan_has_tagged_port` query the device directly
//!
//! Every public operation reports success as `bool`; the reason of a
//! failure is logged.

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use vlsr_snmp::mib;
use vlsr_snmp::{walk, Credentials, SnmpConnection, SnmpTransport, SnmpValue};
use vlsr_types::{Oid, PortBits};

use crate::error::{SwitchCtrlError, SwitchCtrlResult};
use crate::variant::{RateLimit, SwitchVariant};
use crate::vendor::Vendor;
use crate::vlan_map::{self, VlanPortMap};

/// Control session to one switch
pub struct SwitchCtrlSession {
    name: String,
    address: IpAddr,
    transport: Arc<dyn SnmpTransport>,
    credentials: Credentials,
    connection: Option<Box<dyn SnmpConnection>>,
    variant: SwitchVariant,
    vendor: Vendor,
    description: String,
    rfc2674_compatible: bool,
    active: bool,
    /// Membership of all ports (egress list) per VLAN
    vlans_all: Vec<VlanPortMap>,
    /// Membership of untagged ports per VLAN
    vlans_untagged: Vec<VlanPortMap>,
}

fn connection(
    slot: &mut Option<Box<dyn SnmpConnection>>,
    address: IpAddr,
) -> SwitchCtrlResult<&mut dyn SnmpConnection> {
    match slot {
        Some(conn) => Ok(conn.as_mut()),
        None => Err(SwitchCtrlError::NotConnected { address }),
    }
}

/// Interprets the answer to a GET on a port-list column
fn port_list(column: &[u32], index: u32, value: SnmpValue) -> SwitchCtrlResult<PortBits> {
    if value.is_exception() {
        return Err(SwitchCtrlError::VlanNotFound { vlan: index });
    }
    value.as_port_bits().ok_or_else(|| {
        SwitchCtrlError::unexpected_value(
            mib::instance(column, index),
            format!("expected a port list, got {}", value),
        )
    })
}

async fn get_port_list(
    conn: &mut dyn SnmpConnection,
    column: &[u32],
    index: u32,
) -> SwitchCtrlResult<PortBits> {
    let value = conn.get(&mib::instance(column, index)).await?;
    port_list(column, index, value)
}

async fn set_port_list(
    conn: &mut dyn SnmpConnection,
    column: &[u32],
    index: u32,
    ports: &PortBits,
) -> SwitchCtrlResult<()> {
    conn.set(&mib::instance(column, index), ports.into()).await?;
    Ok(())
}

/// Walks one static port-list column and decodes every row
async fn read_port_map_branch(
    variant: &SwitchVariant,
    conn: &mut dyn SnmpConnection,
    column: &[u32],
) -> SwitchCtrlResult<Vec<VlanPortMap>> {
    let root = Oid::from(column);
    let bindings = walk(conn, &root).await?;

    let mut list: Vec<VlanPortMap> = Vec::with_capacity(bindings.len());
    for vpm in bindings.iter().filter_map(|binding| variant.decode(binding)) {
        if vlan_map::find(&list, vpm.vid).is_some() {
            debug!("Duplicate row for VLAN {} under {}", vpm.vid, root);
            continue;
        }
        list.push(vpm);
    }

    if list.is_empty() {
        return Err(SwitchCtrlError::unexpected_value(root, "no VLAN rows"));
    }
    Ok(list)
}

fn store(list: &mut Vec<VlanPortMap>, vid: u32, ports: PortBits) {
    match vlan_map::find_mut(list, vid) {
        Some(vpm) => vpm.ports = ports,
        None => list.push(VlanPortMap::new(vid, ports)),
    }
}

impl SwitchCtrlSession {
    /// Creates an unconnected session driving `address` with `variant`
    pub fn new(
        variant: SwitchVariant,
        address: IpAddr,
        transport: Arc<dyn SnmpTransport>,
        credentials: Credentials,
    ) -> Self {
        Self {
            name: variant.name().to_string(),
            address,
            transport,
            credentials,
            connection: None,
            variant,
            vendor: Vendor::Unknown,
            description: String::new(),
            rfc2674_compatible: false,
            active: false,
            vlans_all: Vec::new(),
            vlans_untagged: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Vendor detected by the last `get_switch_vendor_info`
    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    /// `sysDescr` reported by the switch
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_rfc2674_compatible(&self) -> bool {
        self.rfc2674_compatible
    }

    pub fn variant(&self) -> &SwitchVariant {
        &self.variant
    }

    /// Cached membership of all ports
    pub fn vlans_all(&self) -> &[VlanPortMap] {
        &self.vlans_all
    }

    /// Cached membership of untagged ports
    pub fn vlans_untagged(&self) -> &[VlanPortMap] {
        &self.vlans_untagged
    }

    /// Opens the connection, identifies the vendor and reads the VLAN table.
    ///
    /// On failure the connection is released and the session stays inactive.
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn connect(&mut self) -> bool {
        match self.try_connect().await {
            Ok(()) => {
                self.active = true;
                info!(
                    "Connected to {} switch {} ({} VLANs)",
                    self.vendor,
                    self.address,
                    self.vlans_all.len()
                );
                true
            }
            Err(e) => {
                warn!("Failed to connect to switch {}: {}", self.address, e);
                self.disconnect().await;
                false
            }
        }
    }

    async fn try_connect(&mut self) -> SwitchCtrlResult<()> {
        if self.connection.is_some() {
            debug!("Releasing previous connection to {}", self.address);
            self.disconnect().await;
        }

        let conn = self
            .transport
            .open(self.address, &self.credentials)
            .await?;
        self.connection = Some(conn);

        self.read_vendor_info().await?;
        self.load_vlans().await
    }

    /// Releases the connection. Calling it on an unconnected session is a no-op.
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn disconnect(&mut self) {
        self.active = false;
        if let Some(mut conn) = self.connection.take() {
            if let Err(e) = conn.close().await {
                debug!("Closing connection to {}: {}", self.address, e);
            }
            debug!("Disconnected from {}", self.address);
        }
    }

    /// Reads `sysDescr` and records vendor, description and compatibility
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn get_switch_vendor_info(&mut self) -> bool {
        match self.read_vendor_info().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Reading vendor info from {} failed: {}", self.address, e);
                false
            }
        }
    }

    async fn read_vendor_info(&mut self) -> SwitchCtrlResult<()> {
        let conn = connection(&mut self.connection, self.address)?;
        let sys_descr = Oid::from(mib::SYS_DESCR);
        let value = conn.get(&sys_descr).await?;
        let description = value
            .as_text()
            .ok_or_else(|| SwitchCtrlError::unexpected_value(&sys_descr, value.to_string()))?;

        self.vendor = Vendor::from_description(&description);
        self.rfc2674_compatible = self.vendor.is_rfc2674_compatible();
        self.description = description;
        debug!(
            "Switch {} reports '{}' ({})",
            self.address, self.description, self.vendor
        );

        if self.vendor == Vendor::Illegal {
            return Err(SwitchCtrlError::IllegalVendor {
                address: self.address,
                description: self.description.clone(),
            });
        }
        Ok(())
    }

    /// Re-reads both VLAN caches from the switch.
    ///
    /// The caches are replaced only if both column walks return rows.
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn read_vlan_from_switch(&mut self) -> bool {
        match self.load_vlans().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Reading VLANs from {} failed: {}", self.address, e);
                false
            }
        }
    }

    async fn load_vlans(&mut self) -> SwitchCtrlResult<()> {
        let conn = connection(&mut self.connection, self.address)?;
        self.variant.build_ref_table(conn).await?;

        if !self.rfc2674_compatible {
            return Err(SwitchCtrlError::Incompatible {
                address: self.address,
            });
        }

        let all =
            read_port_map_branch(&self.variant, conn, mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS).await?;
        let untagged =
            read_port_map_branch(&self.variant, conn, mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS)
                .await?;

        self.vlans_all = all;
        self.vlans_untagged = untagged;
        Ok(())
    }

    /// Refreshes the caches of an active session
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn refresh(&mut self) -> bool {
        if !self.active {
            debug!("Switch {} is not active, skipping refresh", self.address);
            return false;
        }
        self.read_vlan_from_switch().await
    }

    /// Creates VLAN `vid`; fails for 0 and for VLANs already cached
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn create_vlan(&mut self, vid: u32) -> bool {
        if vid == 0 {
            warn!("Refusing to create VLAN 0");
            return false;
        }
        if vlan_map::find(&self.vlans_all, vid).is_some() {
            warn!("VLAN {} already exists on {}", vid, self.address);
            return false;
        }

        let result = match connection(&mut self.connection, self.address) {
            Ok(conn) => self.variant.create_vlan(conn, vid).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Failed to create VLAN {} on {}: {}", vid, self.address, e);
            return false;
        }

        self.vlans_all.push(VlanPortMap::empty(vid));
        self.vlans_untagged.push(VlanPortMap::empty(vid));
        info!("Created VLAN {} on {}", vid, self.address);
        true
    }

    /// Removes VLAN `vid`; fails for 0
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn remove_vlan(&mut self, vid: u32) -> bool {
        if vid == 0 {
            warn!("Refusing to remove VLAN 0");
            return false;
        }

        let result = match connection(&mut self.connection, self.address) {
            Ok(conn) => self.variant.remove_vlan(conn, vid).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Failed to remove VLAN {} on {}: {}", vid, self.address, e);
            return false;
        }

        vlan_map::remove_first(&mut self.vlans_all, vid);
        vlan_map::remove_first(&mut self.vlans_untagged, vid);
        info!("Removed VLAN {} on {}", vid, self.address);
        true
    }

    /// Returns true if `vid` is cached without member ports
    pub fn is_vlan_empty(&self, vid: u32) -> bool {
        self.vlans_all
            .iter()
            .any(|vpm| vpm.vid == vid && self.variant.is_empty(vpm))
    }

    /// First cached VLAN without member ports, or 0
    pub fn find_empty_vlan(&self) -> u32 {
        self.vlans_all
            .iter()
            .find(|vpm| self.variant.is_empty(vpm))
            .map_or(0, |vpm| vpm.vid)
    }

    /// First cached VLAN `port` is a member of, or 0
    pub fn get_vlan_by_port(&self, port: u32) -> u32 {
        self.vlans_all
            .iter()
            .find(|vpm| self.variant.has_port(vpm, port))
            .map_or(0, |vpm| vpm.vid)
    }

    /// Every cached VLAN `port` is a member of
    pub fn get_vlan_list_by_port(&self, port: u32) -> BTreeSet<u32> {
        self.vlans_all
            .iter()
            .filter(|vpm| self.variant.has_port(vpm, port))
            .map(|vpm| vpm.vid)
            .collect()
    }

    /// First cached VLAN `port` is an untagged member of, or 0
    pub fn get_vlan_by_untagged_port(&self, port: u32) -> u32 {
        self.vlans_untagged
            .iter()
            .find(|vpm| self.variant.has_port(vpm, port))
            .map_or(0, |vpm| vpm.vid)
    }

    /// Device table index of `vid` on an active, compatible session
    fn live_index(&self, vid: u32) -> SwitchCtrlResult<u32> {
        if !self.active {
            return Err(SwitchCtrlError::NotConnected {
                address: self.address,
            });
        }
        if !self.rfc2674_compatible {
            return Err(SwitchCtrlError::Incompatible {
                address: self.address,
            });
        }
        match self.variant.convert_vlan_id_to_interface(vid) {
            0 => Err(SwitchCtrlError::VlanNotFound { vlan: vid }),
            index => Ok(index),
        }
    }

    /// Asks the switch whether VLAN `vid` exists
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn verify_vlan(&mut self, vid: u32) -> bool {
        match self.try_verify_vlan(vid).await {
            Ok(()) => true,
            Err(e) => {
                debug!("VLAN {} not verified on {}: {}", vid, self.address, e);
                false
            }
        }
    }

    async fn try_verify_vlan(&mut self, vid: u32) -> SwitchCtrlResult<()> {
        let index = self.live_index(vid)?;
        let conn = connection(&mut self.connection, self.address)?;
        get_port_list(conn, mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS, index).await?;
        Ok(())
    }

    /// Asks the switch whether VLAN `vid` has any tagged member
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn vlan_has_tagged_port(&mut self, vid: u32) -> bool {
        match self.live_port_lists(vid).await {
            Ok((_, all, untagged)) => all != untagged,
            Err(e) => {
                debug!("Reading VLAN {} on {} failed: {}", vid, self.address, e);
                false
            }
        }
    }

    /// Table index, egress and untagged list of `vid`, read from the device
    async fn live_port_lists(&mut self, vid: u32) -> SwitchCtrlResult<(u32, PortBits, PortBits)> {
        let index = self.live_index(vid)?;
        let conn = connection(&mut self.connection, self.address)?;
        let all = get_port_list(conn, mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS, index).await?;
        let untagged = get_port_list(conn, mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS, index).await?;
        Ok((index, all, untagged))
    }

    /// Makes the ports of `tagged_ports` (32-port mask, MSB is port 1)
    /// tagged members of `vid`.
    ///
    /// Reads the untagged list, writes an all-zero list and then the list
    /// without `tagged_ports`. The two writes are not atomic; if the second
    /// one fails every port of the VLAN is left tagged.
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn set_vlan_ports_tagged(&mut self, tagged_ports: u32, vid: u32) -> bool {
        match self.try_set_vlan_ports_tagged(tagged_ports, vid).await {
            Ok(()) => {
                info!(
                    "Set ports {:#010x} tagged in VLAN {} on {}",
                    tagged_ports, vid, self.address
                );
                true
            }
            Err(e) => {
                warn!(
                    "Setting VLAN {} tag on {} failed: {}",
                    vid, self.address, e
                );
                false
            }
        }
    }

    async fn try_set_vlan_ports_tagged(&mut self, tagged_ports: u32, vid: u32) -> SwitchCtrlResult<()> {
        let index = self.live_index(vid)?;
        let conn = connection(&mut self.connection, self.address)?;
        let column = mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS;

        let mut untagged = get_port_list(conn, column, index).await?;
        untagged.clear_ports(&PortBits::from_u32_mask(tagged_ports));

        let all_tagged = PortBits::zeroed(untagged.len_octets().max(PortBits::MASK_OCTETS));
        set_port_list(conn, column, index, &all_tagged).await?;
        if let Err(e) = set_port_list(conn, column, index, &untagged).await {
            warn!(
                "VLAN {} on {} left with all ports tagged, untagged list unknown",
                vid, self.address
            );
            return Err(e);
        }

        store(&mut self.vlans_untagged, vid, untagged);
        Ok(())
    }

    /// Adds `port` to `vid` as an untagged member and makes `vid` its PVID.
    ///
    /// A port is untagged in at most one VLAN; it is first removed from
    /// the VLAN it is currently untagged in.
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn move_port_to_vlan_as_untagged(&mut self, port: u32, vid: u32) -> bool {
        match self.try_move_port(port, vid, true).await {
            Ok(()) => {
                info!("Moved port {} to VLAN {} (untagged) on {}", port, vid, self.address);
                true
            }
            Err(e) => {
                warn!(
                    "Moving port {} to VLAN {} on {} failed: {}",
                    port, vid, self.address, e
                );
                false
            }
        }
    }

    /// Adds `port` to `vid` as a tagged member
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn move_port_to_vlan_as_tagged(&mut self, port: u32, vid: u32) -> bool {
        match self.try_move_port(port, vid, false).await {
            Ok(()) => {
                info!("Moved port {} to VLAN {} (tagged) on {}", port, vid, self.address);
                true
            }
            Err(e) => {
                warn!(
                    "Moving port {} to VLAN {} on {} failed: {}",
                    port, vid, self.address, e
                );
                false
            }
        }
    }

    async fn try_move_port(&mut self, port: u32, vid: u32, untagged: bool) -> SwitchCtrlResult<()> {
        PortBits::check_port(port)?;

        // Target must exist before the port leaves its current VLAN
        let (index, mut all, mut untagged_ports) = self.live_port_lists(vid).await?;
        if untagged {
            let previous = self.get_vlan_by_untagged_port(port);
            if previous != 0 && previous != vid {
                self.try_remove_port(port, previous).await?;
            }
        }

        all.insert(port)?;
        if untagged {
            untagged_ports.insert(port)?;
        } else {
            untagged_ports.remove(port);
        }

        let conn = connection(&mut self.connection, self.address)?;
        set_port_list(conn, mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS, index, &all).await?;
        set_port_list(conn, mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS, index, &untagged_ports).await?;
        if untagged {
            set_pvid(conn, port, vid).await?;
        }

        store(&mut self.vlans_all, vid, all);
        store(&mut self.vlans_untagged, vid, untagged_ports);
        Ok(())
    }

    /// Removes `port` from `vid`, tagged or untagged
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn remove_port_from_vlan(&mut self, port: u32, vid: u32) -> bool {
        match self.try_remove_port(port, vid).await {
            Ok(()) => {
                info!("Removed port {} from VLAN {} on {}", port, vid, self.address);
                true
            }
            Err(e) => {
                warn!(
                    "Removing port {} from VLAN {} on {} failed: {}",
                    port, vid, self.address, e
                );
                false
            }
        }
    }

    async fn try_remove_port(&mut self, port: u32, vid: u32) -> SwitchCtrlResult<()> {
        PortBits::check_port(port)?;
        let (index, mut all, mut untagged) = self.live_port_lists(vid).await?;
        let was_untagged = untagged.remove(port);
        let was_member = all.remove(port);
        if !was_member && !was_untagged {
            debug!("Port {} is not a member of VLAN {}", port, vid);
            return Ok(());
        }

        let conn = connection(&mut self.connection, self.address)?;
        if was_untagged {
            set_port_list(conn, mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS, index, &untagged).await?;
        }
        set_port_list(conn, mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS, index, &all).await?;

        store(&mut self.vlans_all, vid, all);
        store(&mut self.vlans_untagged, vid, untagged);
        Ok(())
    }

    /// Sets the PVID (`dot1qPvid`) of `port` to `vid`
    #[instrument(skip(self), fields(switch = %self.address))]
    pub async fn set_vlan_pvid(&mut self, port: u32, vid: u32) -> bool {
        match self.try_set_pvid(port, vid).await {
            Ok(()) => {
                info!("Set PVID of port {} to {} on {}", port, vid, self.address);
                true
            }
            Err(e) => {
                warn!(
                    "Setting PVID of port {} on {} failed: {}",
                    port, self.address, e
                );
                false
            }
        }
    }

    async fn try_set_pvid(&mut self, port: u32, vid: u32) -> SwitchCtrlResult<()> {
        PortBits::check_port(port)?;
        self.live_index(vid)?;
        let conn = connection(&mut self.connection, self.address)?;
        set_pvid(conn, port, vid).await
    }

    /// Polices traffic of `vid` entering `port`
    pub fn police_input_bandwidth(&self, undo: bool, port: u32, vid: u32, rate: &RateLimit) -> bool {
        match self.variant.police_input_bandwidth(undo, port, vid, rate) {
            Ok(()) => true,
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    /// Shapes traffic of `vid` leaving `port`
    pub fn limit_output_bandwidth(&self, undo: bool, port: u32, vid: u32, rate: &RateLimit) -> bool {
        match self.variant.limit_output_bandwidth(undo, port, vid, rate) {
            Ok(()) => true,
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }
}

async fn set_pvid(conn: &mut dyn SnmpConnection, port: u32, vid: u32) -> SwitchCtrlResult<()> {
    conn.set(
        &mib::instance(mib::DOT1Q_PVID, port),
        SnmpValue::Gauge(vid),
    )
    .await?;
    Ok(())
}

impl PartialEq for SwitchCtrlSession {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.address == other.address
    }
}

impl fmt::Debug for SwitchCtrlSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchCtrlSession")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("vendor", &self.vendor)
            .field("active", &self.active)
            .field("connected", &self.connection.is_some())
            .field("vlans", &self.vlans_all.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vlsr_switchctrl_test::{
        lambda_switch, rfc2674_switch, switch_addr, unknown_switch, DeviceVerifier, MemoryAgent,
        SwitchFixture, POWERCONNECT_5224,
    };

    use crate::variant::Rfc2674Variant;

    fn session_for(agent: &MemoryAgent, address: IpAddr) -> SwitchCtrlSession {
        SwitchCtrlSession::new(
            SwitchVariant::Rfc2674(Rfc2674Variant),
            address,
            Arc::new(agent.clone()),
            Credentials::default(),
        )
    }

    async fn connected(fixture: SwitchFixture) -> (MemoryAgent, SwitchCtrlSession) {
        let agent = MemoryAgent::new().with_device(switch_addr(1), fixture.build());
        let mut session = session_for(&agent, switch_addr(1));
        assert!(session.connect().await);
        (agent, session)
    }

    fn vids(list: &[VlanPortMap]) -> Vec<u32> {
        list.iter().map(|vpm| vpm.vid).collect()
    }

    #[tokio::test]
    async fn test_connect_reads_vendor_and_vlans() {
        let (agent, session) = connected(rfc2674_switch()).await;

        assert!(session.is_active());
        assert!(session.is_rfc2674_compatible());
        assert_eq!(session.vendor(), Vendor::Rfc2674);
        assert_eq!(session.description(), "PowerConnect 5224");
        assert_eq!(session.name(), "VLSR-SNMP");
        assert_eq!(vids(session.vlans_all()), vec![1, 10, 20]);
        assert_eq!(vids(session.vlans_untagged()), vec![1, 10, 20]);
        assert_eq!(agent.live_connections(), 1);
    }

    #[tokio::test]
    async fn test_connect_unknown_vendor_fails() {
        let agent = MemoryAgent::new().with_device(switch_addr(1), unknown_switch().build());
        let mut session = session_for(&agent, switch_addr(1));

        assert!(!session.connect().await);
        assert!(!session.is_active());
        assert_eq!(session.vendor(), Vendor::Illegal);
        assert_eq!(agent.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_connect_incompatible_vendor_fails() {
        let agent = MemoryAgent::new().with_device(switch_addr(1), lambda_switch().build());
        let mut session = session_for(&agent, switch_addr(1));

        assert!(!session.connect().await);
        assert_eq!(session.vendor(), Vendor::LambdaOptical);
        assert!(!session.is_rfc2674_compatible());
        assert_eq!(agent.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_connect_unreachable_fails() {
        let agent = MemoryAgent::new();
        let mut session = session_for(&agent, switch_addr(1));
        assert!(!session.connect().await);
        assert_eq!(agent.opened(), 0);
    }

    #[tokio::test]
    async fn test_connect_without_vlan_rows_fails() {
        let agent = MemoryAgent::new()
            .with_device(switch_addr(1), SwitchFixture::new(POWERCONNECT_5224).build());
        let mut session = session_for(&agent, switch_addr(1));

        assert!(!session.connect().await);
        assert!(session.is_rfc2674_compatible());
        assert!(!session.is_active());
        assert_eq!(agent.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_connect_without_untagged_rows_fails() {
        let agent = MemoryAgent::new().with_device(switch_addr(1), rfc2674_switch().build());
        agent.update_device(switch_addr(1), |device| {
            for vid in [1, 10, 20] {
                device.remove(&mib::instance(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS, vid));
            }
        });
        let mut session = session_for(&agent, switch_addr(1));

        assert!(!session.connect().await);
        assert!(!session.is_active());
        assert!(session.vlans_all().is_empty());
        assert!(!session.read_vlan_from_switch().await);
    }

    #[tokio::test]
    async fn test_reconnect_releases_previous_connection() {
        let (agent, mut session) = connected(rfc2674_switch()).await;
        assert!(session.connect().await);
        assert_eq!(agent.opened(), 2);
        assert_eq!(agent.live_connections(), 1);

        session.disconnect().await;
        session.disconnect().await;
        assert!(!session.is_active());
        assert_eq!(agent.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_cache_queries() {
        let (_agent, session) = connected(rfc2674_switch()).await;

        assert_eq!(session.get_vlan_by_port(1), 1);
        assert_eq!(session.get_vlan_by_port(3), 10);
        assert_eq!(session.get_vlan_by_port(20), 0);
        assert_eq!(
            session.get_vlan_list_by_port(5).into_iter().collect::<Vec<_>>(),
            vec![10]
        );
        assert_eq!(session.get_vlan_by_untagged_port(5), 10);
        assert_eq!(session.get_vlan_by_untagged_port(3), 0);

        assert!(session.is_vlan_empty(20));
        assert!(!session.is_vlan_empty(10));
        assert!(!session.is_vlan_empty(99));
        assert_eq!(session.find_empty_vlan(), 20);
    }

    #[tokio::test]
    async fn test_create_and_remove_vlan() {
        let (agent, mut session) = connected(rfc2674_switch()).await;
        let verifier = DeviceVerifier::new(&agent, switch_addr(1));

        assert!(!session.create_vlan(0).await);
        assert!(!session.create_vlan(10).await);

        assert!(session.create_vlan(30).await);
        verifier.assert_vlan_exists(30).unwrap();
        assert_eq!(vids(session.vlans_all()), vec![1, 10, 20, 30]);
        assert_eq!(vids(session.vlans_untagged()), vec![1, 10, 20, 30]);
        assert!(session.is_vlan_empty(30));

        assert!(!session.remove_vlan(0).await);
        assert!(session.remove_vlan(30).await);
        verifier.assert_vlan_absent(30).unwrap();
        assert_eq!(vids(session.vlans_all()), vec![1, 10, 20]);
    }

    #[tokio::test]
    async fn test_vlan_zero_never_reaches_device() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(!session.create_vlan(0).await);
        assert!(!session.remove_vlan(0).await);
        assert!(agent.device(switch_addr(1)).unwrap().set_log().is_empty());
        assert_eq!(vids(session.vlans_all()), vec![1, 10, 20]);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_cache() {
        let (agent, mut session) = connected(rfc2674_switch()).await;
        agent.update_device(switch_addr(1), |device| {
            device.fail_sets_under(Oid::from(mib::DOT1Q_VLAN_STATIC_ROW_STATUS))
        });

        assert!(!session.create_vlan(30).await);
        assert_eq!(vids(session.vlans_all()), vec![1, 10, 20]);
    }

    #[tokio::test]
    async fn test_verify_vlan() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(session.verify_vlan(10).await);
        assert!(!session.verify_vlan(99).await);

        // Created behind the session's back
        agent.update_device(switch_addr(1), |device| {
            device.insert_vlan_row(99, &PortBits::zeroed(4), &PortBits::zeroed(4))
        });
        assert!(session.verify_vlan(99).await);

        session.disconnect().await;
        assert!(!session.verify_vlan(10).await);
    }

    #[tokio::test]
    async fn test_vlan_has_tagged_port() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(session.vlan_has_tagged_port(10).await);
        assert!(!session.vlan_has_tagged_port(1).await);
        assert!(!session.vlan_has_tagged_port(99).await);

        // Both reads must succeed
        agent.update_device(switch_addr(1), |device| {
            device.fail_gets_under(Oid::from(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS))
        });
        assert!(!session.vlan_has_tagged_port(10).await);
    }

    #[tokio::test]
    async fn test_set_vlan_ports_tagged() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        // Port 5 is the MSB-side fifth bit
        assert!(session.set_vlan_ports_tagged(0x0800_0000, 10).await);

        let verifier = DeviceVerifier::new(&agent, switch_addr(1));
        verifier.assert_untagged(10, &[]).unwrap();
        verifier.assert_egress(10, &[3, 4, 5]).unwrap();

        let device = agent.device(switch_addr(1)).unwrap();
        let writes: Vec<_> = device.set_log().iter().map(|vb| vb.value.clone()).collect();
        assert_eq!(
            writes,
            vec![
                SnmpValue::OctetString(vec![0, 0, 0, 0]),
                SnmpValue::OctetString(vec![0, 0, 0, 0]),
            ]
        );
        assert_eq!(session.get_vlan_by_untagged_port(5), 0);
    }

    #[tokio::test]
    async fn test_set_vlan_ports_tagged_keeps_other_untagged_ports() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(session.set_vlan_ports_tagged(0x4000_0000, 1).await);
        DeviceVerifier::new(&agent, switch_addr(1))
            .assert_untagged(1, &[1, 6, 7, 8])
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_vlan_ports_tagged_aborts_when_read_fails() {
        let (agent, mut session) = connected(rfc2674_switch()).await;
        agent.update_device(switch_addr(1), |device| {
            device.fail_gets_under(Oid::from(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS))
        });

        assert!(!session.set_vlan_ports_tagged(0x0800_0000, 10).await);
        assert!(agent.device(switch_addr(1)).unwrap().set_log().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_caches() {
        let (agent, mut session) = connected(rfc2674_switch()).await;
        let before = session.vlans_all().to_vec();

        agent.update_device(switch_addr(1), |device| {
            device.insert_vlan_row(40, &PortBits::zeroed(4), &PortBits::zeroed(4));
            device.fail_gets_under(Oid::from(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS));
        });
        assert!(!session.refresh().await);
        assert_eq!(session.vlans_all(), before.as_slice());

        agent.update_device(switch_addr(1), |device| device.clear_failures());
        assert!(session.refresh().await);
        assert_eq!(vids(session.vlans_all()), vec![1, 10, 20, 40]);
    }

    #[tokio::test]
    async fn test_refresh_requires_active_session() {
        let agent = MemoryAgent::new().with_device(switch_addr(1), rfc2674_switch().build());
        let mut session = session_for(&agent, switch_addr(1));
        assert!(!session.refresh().await);
    }

    #[tokio::test]
    async fn test_move_port_untagged_sets_pvid() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(session.move_port_to_vlan_as_untagged(2, 20).await);

        let verifier = DeviceVerifier::new(&agent, switch_addr(1));
        verifier.assert_egress(20, &[2]).unwrap();
        verifier.assert_untagged(20, &[2]).unwrap();
        verifier.assert_pvid(2, 20).unwrap();
        // Port 2 left its previous untagged VLAN
        verifier.assert_egress(1, &[1, 6, 7, 8]).unwrap();
        verifier.assert_untagged(1, &[1, 6, 7, 8]).unwrap();

        assert_eq!(session.get_vlan_by_untagged_port(2), 20);
        assert_eq!(
            session.get_vlan_list_by_port(2).into_iter().collect::<Vec<_>>(),
            vec![20]
        );
    }

    #[tokio::test]
    async fn test_move_port_tagged_and_remove() {
        let (agent, mut session) = connected(rfc2674_switch()).await;
        let verifier = DeviceVerifier::new(&agent, switch_addr(1));

        assert!(session.move_port_to_vlan_as_tagged(5, 20).await);
        verifier.assert_egress(20, &[5]).unwrap();
        verifier.assert_untagged(20, &[]).unwrap();
        assert_eq!(
            session.get_vlan_list_by_port(5).into_iter().collect::<Vec<_>>(),
            vec![10, 20]
        );

        assert!(session.remove_port_from_vlan(5, 10).await);
        verifier.assert_egress(10, &[3, 4]).unwrap();
        verifier.assert_untagged(10, &[]).unwrap();
        assert_eq!(session.get_vlan_by_untagged_port(5), 0);

        // Removing a non-member is a no-op
        assert!(session.remove_port_from_vlan(5, 10).await);
    }

    #[tokio::test]
    async fn test_remove_port_writes_untagged_first() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(session.remove_port_from_vlan(5, 10).await);
        let device = agent.device(switch_addr(1)).unwrap();
        let columns: Vec<_> = device
            .set_log()
            .iter()
            .map(|vb| vb.oid.as_slice()[vb.oid.len() - 2])
            .collect();
        assert_eq!(columns, vec![4, 2]);
    }

    #[tokio::test]
    async fn test_failed_move_leaves_cache() {
        let (agent, mut session) = connected(rfc2674_switch()).await;
        agent.update_device(switch_addr(1), |device| {
            device.fail_sets_under(Oid::from(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS))
        });

        assert!(!session.move_port_to_vlan_as_tagged(6, 10).await);
        assert_eq!(
            session.get_vlan_list_by_port(6).into_iter().collect::<Vec<_>>(),
            vec![1]
        );
        assert!(!session.move_port_to_vlan_as_untagged(0, 10).await);
    }

    #[tokio::test]
    async fn test_untagged_move_to_missing_vlan_keeps_port() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(!session.move_port_to_vlan_as_untagged(2, 999).await);

        let verifier = DeviceVerifier::new(&agent, switch_addr(1));
        verifier.assert_egress(1, &[1, 2, 6, 7, 8]).unwrap();
        verifier.assert_untagged(1, &[1, 2, 6, 7, 8]).unwrap();
        assert!(agent.device(switch_addr(1)).unwrap().set_log().is_empty());
        assert_eq!(session.get_vlan_by_port(2), 1);
        assert_eq!(session.get_vlan_by_untagged_port(2), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_port_is_rejected() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(!session.move_port_to_vlan_as_tagged(u32::MAX, 10).await);
        assert!(!session.move_port_to_vlan_as_untagged(PortBits::MAX_PORTS + 1, 10).await);
        assert!(!session.remove_port_from_vlan(u32::MAX, 10).await);
        assert!(!session.set_vlan_pvid(u32::MAX, 10).await);
        assert!(agent.device(switch_addr(1)).unwrap().set_log().is_empty());

        assert!(session.move_port_to_vlan_as_tagged(PortBits::MAX_PORTS, 10).await);
        assert!(session.get_vlan_list_by_port(PortBits::MAX_PORTS).contains(&10));
    }

    #[tokio::test]
    async fn test_set_vlan_pvid() {
        let (agent, mut session) = connected(rfc2674_switch()).await;

        assert!(session.set_vlan_pvid(4, 10).await);
        DeviceVerifier::new(&agent, switch_addr(1))
            .assert_pvid(4, 10)
            .unwrap();
        assert!(!session.set_vlan_pvid(0, 10).await);
    }

    #[tokio::test]
    async fn test_qos_unsupported() {
        let (_agent, session) = connected(rfc2674_switch()).await;
        let rate = RateLimit::committed(50.0, 32);
        assert!(!session.police_input_bandwidth(false, 3, 10, &rate));
        assert!(!session.limit_output_bandwidth(false, 3, 10, &rate));
    }

    #[test]
    fn test_identity_is_name_and_address() {
        let agent = MemoryAgent::new();
        let a = session_for(&agent, switch_addr(1));
        let b = session_for(&agent, switch_addr(1));
        let c = session_for(&agent, switch_addr(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
