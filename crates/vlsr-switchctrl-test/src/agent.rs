//! In-memory SNMP agent
//!
//! Stands in for managed switches in tests. Each switch address maps to a
//! [`DeviceMib`]; connections opened through [`MemoryAgent`] read and
//! write that MIB directly, with Q-BRIDGE RowStatus semantics for VLAN
//! creation and deletion.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::ops::Bound;
use std::sync::Arc;
use tracing::debug;

use vlsr_snmp::mib::{self, row_status};
use vlsr_snmp::{
    Credentials, SnmpConnection, SnmpError, SnmpResult, SnmpTransport, SnmpValue, VarBind,
};
use vlsr_types::{Oid, PortBits};

/// Objects and failure knobs of one simulated switch
#[derive(Debug, Clone)]
pub struct DeviceMib {
    objects: BTreeMap<Oid, SnmpValue>,
    port_octets: usize,
    community: Option<String>,
    refuse_open: bool,
    failing_gets: Vec<Oid>,
    failing_sets: Vec<Oid>,
    set_log: Vec<VarBind>,
}

impl DeviceMib {
    /// Create a device reporting `description` as `sysDescr.0`
    pub fn new(description: &str) -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(
            Oid::from(mib::SYS_DESCR),
            SnmpValue::OctetString(description.as_bytes().to_vec()),
        );
        Self {
            objects,
            port_octets: PortBits::MASK_OCTETS,
            community: None,
            refuse_open: false,
            failing_gets: Vec::new(),
            failing_sets: Vec::new(),
            set_log: Vec::new(),
        }
    }

    /// Octet length of port lists in rows created through RowStatus
    pub fn set_port_octets(&mut self, octets: usize) {
        self.port_octets = octets;
    }

    /// Only accept sessions using `community`
    pub fn require_community(&mut self, community: impl Into<String>) {
        self.community = Some(community.into());
    }

    /// Make every open attempt fail
    pub fn refuse_open(&mut self, refuse: bool) {
        self.refuse_open = refuse;
    }

    /// Time out get/get-next requests touching `prefix`
    pub fn fail_gets_under(&mut self, prefix: Oid) {
        self.failing_gets.push(prefix);
    }

    /// Reject set requests under `prefix` with `genErr`
    pub fn fail_sets_under(&mut self, prefix: Oid) {
        self.failing_sets.push(prefix);
    }

    pub fn clear_failures(&mut self) {
        self.refuse_open = false;
        self.failing_gets.clear();
        self.failing_sets.clear();
    }

    pub fn insert(&mut self, oid: Oid, value: SnmpValue) {
        self.objects.insert(oid, value);
    }

    pub fn remove(&mut self, oid: &Oid) -> Option<SnmpValue> {
        self.objects.remove(oid)
    }

    pub fn get(&self, oid: &Oid) -> Option<&SnmpValue> {
        self.objects.get(oid)
    }

    /// Successful set requests in arrival order
    pub fn set_log(&self) -> &[VarBind] {
        &self.set_log
    }

    /// Install a static VLAN row at table index `index`
    pub fn insert_vlan_row(&mut self, index: u32, egress: &PortBits, untagged: &PortBits) {
        self.insert(
            mib::instance(mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS, index),
            egress.into(),
        );
        self.insert(
            mib::instance(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS, index),
            untagged.into(),
        );
        self.insert(
            mib::instance(mib::DOT1Q_VLAN_STATIC_ROW_STATUS, index),
            SnmpValue::Integer(row_status::ACTIVE),
        );
    }

    /// Returns true if a static VLAN row exists at `index`
    pub fn has_vlan_row(&self, index: u32) -> bool {
        self.objects
            .contains_key(&mib::instance(mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS, index))
    }

    fn remove_vlan_row(&mut self, index: u32) {
        for column in [
            mib::DOT1Q_VLAN_STATIC_NAME,
            mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS,
            mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS,
            mib::DOT1Q_VLAN_STATIC_ROW_STATUS,
        ] {
            self.objects.remove(&mib::instance(column, index));
        }
    }

    fn get_fails(&self, oid: &Oid) -> bool {
        self.failing_gets
            .iter()
            .any(|prefix| oid.starts_with(prefix) || prefix.starts_with(oid))
    }

    fn lookup(&self, oid: &Oid) -> SnmpResult<SnmpValue> {
        if self.get_fails(oid) {
            return Err(SnmpError::transport("get", "timeout"));
        }
        Ok(self
            .objects
            .get(oid)
            .cloned()
            .unwrap_or(SnmpValue::NoSuchInstance))
    }

    fn lookup_next(&self, oid: &Oid) -> SnmpResult<VarBind> {
        if self.get_fails(oid) {
            return Err(SnmpError::transport("getnext", "timeout"));
        }
        Ok(self
            .objects
            .range((Bound::Excluded(oid.clone()), Bound::Unbounded))
            .next()
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .unwrap_or_else(|| VarBind::new(oid.clone(), SnmpValue::EndOfMibView)))
    }

    fn apply_set(&mut self, oid: &Oid, value: SnmpValue) -> SnmpResult<()> {
        if self.failing_sets.iter().any(|prefix| oid.starts_with(prefix)) {
            return Err(SnmpError::error_status("set", oid, "genErr"));
        }

        let row_status_column = Oid::from(mib::DOT1Q_VLAN_STATIC_ROW_STATUS);
        let egress_column = Oid::from(mib::DOT1Q_VLAN_STATIC_EGRESS_PORTS);
        let untagged_column = Oid::from(mib::DOT1Q_VLAN_STATIC_UNTAGGED_PORTS);
        let index = oid.last().unwrap_or(0);

        if oid.starts_with(&row_status_column) && oid.len() == row_status_column.len() + 1 {
            let exists = self.has_vlan_row(index);
            match value.as_integer() {
                Some(row_status::CREATE_AND_GO) | Some(row_status::CREATE_AND_WAIT) if exists => {
                    return Err(SnmpError::error_status("set", oid, "inconsistentValue"));
                }
                Some(status @ (row_status::CREATE_AND_GO | row_status::CREATE_AND_WAIT)) => {
                    let empty = PortBits::zeroed(self.port_octets);
                    self.insert_vlan_row(index, &empty, &empty);
                    let state = if status == row_status::CREATE_AND_GO {
                        row_status::ACTIVE
                    } else {
                        row_status::NOT_READY
                    };
                    self.objects.insert(oid.clone(), SnmpValue::Integer(state));
                }
                Some(row_status::ACTIVE) | Some(row_status::NOT_IN_SERVICE) if exists => {
                    self.objects.insert(oid.clone(), value.clone());
                }
                Some(row_status::DESTROY) => self.remove_vlan_row(index),
                Some(_) if !exists => {
                    return Err(SnmpError::error_status("set", oid, "inconsistentValue"));
                }
                _ => return Err(SnmpError::error_status("set", oid, "wrongValue")),
            }
        } else if oid.starts_with(&egress_column) || oid.starts_with(&untagged_column) {
            if !self.has_vlan_row(index) {
                return Err(SnmpError::error_status("set", oid, "noCreation"));
            }
            if value.as_bytes().is_none() {
                return Err(SnmpError::error_status("set", oid, "wrongType"));
            }
            self.objects.insert(oid.clone(), value.clone());
        } else {
            self.objects.insert(oid.clone(), value.clone());
        }

        self.set_log.push(VarBind::new(oid.clone(), value));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct AgentState {
    devices: HashMap<IpAddr, DeviceMib>,
    opened: usize,
    released: usize,
}

/// In-memory SNMP transport serving a set of simulated switches
///
/// Cloning yields another handle to the same switches, so a test can keep
/// one handle for inspection while the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryAgent {
    state: Arc<Mutex<AgentState>>,
}

impl MemoryAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a switch (builder form)
    pub fn with_device(self, address: IpAddr, device: DeviceMib) -> Self {
        self.add_device(address, device);
        self
    }

    pub fn add_device(&self, address: IpAddr, device: DeviceMib) {
        self.state.lock().devices.insert(address, device);
    }

    /// Remove a switch; its open connections stop answering
    pub fn remove_device(&self, address: IpAddr) -> Option<DeviceMib> {
        self.state.lock().devices.remove(&address)
    }

    /// Snapshot of a switch's MIB
    pub fn device(&self, address: IpAddr) -> Option<DeviceMib> {
        self.state.lock().devices.get(&address).cloned()
    }

    /// Mutate a switch's MIB in place
    pub fn update_device<R>(&self, address: IpAddr, f: impl FnOnce(&mut DeviceMib) -> R) -> Option<R> {
        self.state.lock().devices.get_mut(&address).map(f)
    }

    /// Number of connections opened so far
    pub fn opened(&self) -> usize {
        self.state.lock().opened
    }

    /// Number of connections closed or dropped so far
    pub fn released(&self) -> usize {
        self.state.lock().released
    }

    /// Connections opened and not yet released
    pub fn live_connections(&self) -> usize {
        let state = self.state.lock();
        state.opened - state.released
    }
}

#[async_trait]
impl SnmpTransport for MemoryAgent {
    async fn open(
        &self,
        address: IpAddr,
        credentials: &Credentials,
    ) -> SnmpResult<Box<dyn SnmpConnection>> {
        let mut state = self.state.lock();
        let device = state.devices.get(&address).ok_or_else(|| SnmpError::Open {
            address,
            reason: "no route to host".to_string(),
        })?;

        if device.refuse_open {
            return Err(SnmpError::Open {
                address,
                reason: "connection refused".to_string(),
            });
        }
        if device
            .community
            .as_ref()
            .is_some_and(|c| *c != credentials.community)
        {
            return Err(SnmpError::Open {
                address,
                reason: "authentication failure".to_string(),
            });
        }

        state.opened += 1;
        debug!("Memory agent: opened session to {}", address);
        Ok(Box::new(MemoryConnection {
            agent: self.clone(),
            peer: address,
            closed: false,
        }))
    }
}

struct MemoryConnection {
    agent: MemoryAgent,
    peer: IpAddr,
    closed: bool,
}

impl MemoryConnection {
    fn with_device<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut DeviceMib) -> SnmpResult<R>,
    ) -> SnmpResult<R> {
        if self.closed {
            return Err(SnmpError::Closed { address: self.peer });
        }
        let mut state = self.agent.state.lock();
        match state.devices.get_mut(&self.peer) {
            Some(device) => f(device),
            None => Err(SnmpError::transport(operation, "no response from agent")),
        }
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.agent.state.lock().released += 1;
        }
    }
}

#[async_trait]
impl SnmpConnection for MemoryConnection {
    fn peer(&self) -> IpAddr {
        self.peer
    }

    async fn get(&mut self, oid: &Oid) -> SnmpResult<SnmpValue> {
        self.with_device("get", |device| device.lookup(oid))
    }

    async fn get_next(&mut self, oid: &Oid) -> SnmpResult<VarBind> {
        self.with_device("getnext", |device| device.lookup_next(oid))
    }

    async fn set(&mut self, oid: &Oid, value: SnmpValue) -> SnmpResult<()> {
        self.with_device("set", |device| device.apply_set(oid, value))
    }

    async fn close(&mut self) -> SnmpResult<()> {
        if self.closed {
            return Err(SnmpError::Closed { address: self.peer });
        }
        self.release();
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.release();
    }
}
