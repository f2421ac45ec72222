//! Local-ID registry
//!
//! Maps the logical resource handles carried by signaling ("local IDs")
//! to switch ports and port groups. The registry can be seeded from the
//! preserved file the DRAGON CLI writes, so IDs survive daemon restarts.
//!
//! Preserved file format, one entry per line:
//!
//! ```text
//! <type>:<value> [tag]*
//! ```
//!
//! Group types take the trailing tokens as member ports; other types
//! ignore them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{SwitchCtrlError, SwitchCtrlResult};

/// Default location of the preserved local IDs
pub const DEFAULT_PRESERVED_PATH: &str = "/var/preserve/dragon.localids";

/// Type/value pair that removes every entry when deleted
pub const LOCAL_ID_CLEAR_ALL: u16 = 0xFFFF;

/// Known local-ID types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u16)]
pub enum LocalIdType {
    /// A single port; the value is the port number
    Port = 1,
    /// Untagged port group
    Group = 2,
    /// Tagged port group
    TaggedGroup = 3,
}

impl LocalIdType {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(LocalIdType::Port),
            2 => Some(LocalIdType::Group),
            3 => Some(LocalIdType::TaggedGroup),
            _ => None,
        }
    }

    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Returns true if the raw type code carries member tags
    pub fn is_group(raw: u16) -> bool {
        matches!(
            LocalIdType::from_raw(raw),
            Some(LocalIdType::Group | LocalIdType::TaggedGroup)
        )
    }
}

impl fmt::Display for LocalIdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalIdType::Port => write!(f, "port"),
            LocalIdType::Group => write!(f, "group"),
            LocalIdType::TaggedGroup => write!(f, "tagged-group"),
        }
    }
}

/// Splits a 32-bit handle into (type, value)
pub fn decode_handle(handle: u32) -> (u16, u16) {
    ((handle >> 16) as u16, (handle & 0xFFFF) as u16)
}

/// Packs (type, value) into a 32-bit handle
pub fn encode_handle(id_type: u16, value: u16) -> u32 {
    (u32::from(id_type) << 16) | u32::from(value)
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalId {
    /// Raw type code (see [`LocalIdType`])
    pub id_type: u16,
    pub value: u16,
    /// Member port tags in insertion order, no duplicates.
    /// Always empty for non-group types.
    #[serde(default)]
    pub group: Vec<u16>,
}

impl LocalId {
    pub fn new(id_type: u16, value: u16) -> Self {
        Self {
            id_type,
            value,
            group: Vec::new(),
        }
    }

    pub fn with_tags(id_type: u16, value: u16, tags: impl IntoIterator<Item = u16>) -> Self {
        Self {
            id_type,
            value,
            group: tags.into_iter().collect(),
        }
    }

    /// 32-bit handle signaling uses to name this entry
    pub fn handle(&self) -> u32 {
        encode_handle(self.id_type, self.value)
    }

    pub fn is_group(&self) -> bool {
        LocalIdType::is_group(self.id_type)
    }

    fn matches(&self, id_type: u16, value: u16) -> bool {
        self.id_type == id_type && self.value == value
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type, self.value)?;
        for tag in &self.group {
            write!(f, " {}", tag)?;
        }
        Ok(())
    }
}

/// Operation requested by a signaling message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalIdMessageKind {
    Add,
    Delete,
}

/// Local-ID update received from signaling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdMessage {
    pub kind: LocalIdMessageKind,
    pub local_id: LocalId,
}

impl LocalIdMessage {
    pub fn add(local_id: LocalId) -> Self {
        Self {
            kind: LocalIdMessageKind::Add,
            local_id,
        }
    }

    pub fn delete(local_id: LocalId) -> Self {
        Self {
            kind: LocalIdMessageKind::Delete,
            local_id,
        }
    }
}

/// Registry of local IDs, unique by (type, value)
#[derive(Debug, Clone, Default)]
pub struct LocalIdRegistry {
    entries: Vec<LocalId>,
}

impl LocalIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[LocalId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id_type: u16, value: u16) -> Option<&LocalId> {
        self.entries.iter().find(|lid| lid.matches(id_type, value))
    }

    /// Adds (type, value), or `tag` to an existing group.
    ///
    /// Tag 0 means "no tag" and is never stored, so adding tag 0 to an
    /// existing group leaves it unchanged. Tags of non-group types are
    /// ignored.
    pub fn add_local_id(&mut self, id_type: u16, value: u16, tag: u16) {
        let is_group = LocalIdType::is_group(id_type);

        if let Some(lid) = self
            .entries
            .iter_mut()
            .find(|lid| lid.matches(id_type, value))
        {
            if is_group && tag != 0 && !lid.group.contains(&tag) {
                lid.group.push(tag);
            }
            return;
        }

        let mut lid = LocalId::new(id_type, value);
        if is_group && tag != 0 {
            lid.group.push(tag);
        }
        debug!("Added local ID {}", lid);
        self.entries.push(lid);
    }

    /// Deletes (type, value), or `tag` from a group.
    ///
    /// (0xFFFF, 0xFFFF) clears the registry. Deleting tag 0 of a group, or
    /// its last tag, removes the whole group.
    pub fn delete_local_id(&mut self, id_type: u16, value: u16, tag: u16) {
        if id_type == LOCAL_ID_CLEAR_ALL && value == LOCAL_ID_CLEAR_ALL {
            info!("Clearing {} local IDs", self.entries.len());
            self.entries.clear();
            return;
        }

        let Some(pos) = self
            .entries
            .iter()
            .position(|lid| lid.matches(id_type, value))
        else {
            return;
        };

        let lid = &mut self.entries[pos];
        if lid.is_group() && tag != 0 {
            lid.group.retain(|t| *t != tag);
            if !lid.group.is_empty() {
                return;
            }
        }
        let removed = self.entries.remove(pos);
        debug!("Deleted local ID {}", removed);
    }

    /// Returns true if (type, value) exists and, for a group with a
    /// non-zero `tag`, contains that tag
    pub fn has_local_id(&self, id_type: u16, value: u16, tag: u16) -> bool {
        match self.get(id_type, value) {
            Some(lid) if lid.is_group() && tag != 0 => lid.group.contains(&tag),
            Some(_) => true,
            None => false,
        }
    }

    /// Ports named by a 32-bit handle.
    ///
    /// A port ID yields its own value, a group its tags; unknown handles
    /// and other types yield nothing.
    pub fn get_ports_by_local_id(&self, handle: u32) -> Vec<u32> {
        let (id_type, value) = decode_handle(handle);
        if !self.has_local_id(id_type, value, 0) {
            return Vec::new();
        }

        match LocalIdType::from_raw(id_type) {
            Some(LocalIdType::Port) => vec![u32::from(value)],
            Some(LocalIdType::Group | LocalIdType::TaggedGroup) => self
                .get(id_type, value)
                .map(|lid| lid.group.iter().copied().map(u32::from).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Applies an add or delete message; each tag is applied in order
    pub fn process_local_id_message(&mut self, message: &LocalIdMessage) {
        let lid = &message.local_id;
        let apply = |registry: &mut Self, tag: u16| match message.kind {
            LocalIdMessageKind::Add => registry.add_local_id(lid.id_type, lid.value, tag),
            LocalIdMessageKind::Delete => registry.delete_local_id(lid.id_type, lid.value, tag),
        };

        if lid.group.is_empty() {
            apply(self, 0);
        } else {
            for tag in &lid.group {
                apply(self, *tag);
            }
        }
    }

    /// Reads preserved entries from `path`, returning how many lines were
    /// applied. Malformed lines are logged and skipped.
    pub fn load_preserved(&mut self, path: impl AsRef<Path>) -> SwitchCtrlResult<usize> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let applied = self.apply_preserved(&contents, path);
        info!(
            "Loaded {} preserved local IDs from {}",
            applied,
            path.display()
        );
        Ok(applied)
    }

    /// Applies preserved-file contents; `origin` is only used in log messages
    pub fn apply_preserved(&mut self, contents: &str, origin: &Path) -> usize {
        let mut applied = 0;
        for (n, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_preserved_line(line) {
                Ok(lid) => {
                    if lid.group.is_empty() {
                        self.add_local_id(lid.id_type, lid.value, 0);
                    } else {
                        for tag in &lid.group {
                            self.add_local_id(lid.id_type, lid.value, *tag);
                        }
                    }
                    applied += 1;
                }
                Err(message) => {
                    let err = SwitchCtrlError::PreservedState {
                        path: origin.to_path_buf(),
                        line: n + 1,
                        message,
                    };
                    warn!("Skipping preserved local ID: {}", err);
                }
            }
        }
        applied
    }
}

/// Parses `type:value [tag]*`
fn parse_preserved_line(line: &str) -> Result<LocalId, String> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next().ok_or_else(|| "empty line".to_string())?;
    let (id_type, value) = head
        .split_once(':')
        .ok_or_else(|| format!("expected <type>:<value>, got '{}'", head))?;
    let id_type: u16 = id_type
        .parse()
        .map_err(|_| format!("invalid type '{}'", id_type))?;
    let value: u16 = value
        .parse()
        .map_err(|_| format!("invalid value '{}'", value))?;

    if !LocalIdType::is_group(id_type) {
        return Ok(LocalId::new(id_type, value));
    }

    let tags = tokens
        .map(|tok| tok.parse::<u16>().map_err(|_| format!("invalid tag '{}'", tok)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LocalId::with_tags(id_type, value, tags))
}
