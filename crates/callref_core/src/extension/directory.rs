//! Extension directory contract and in-process table.

use crate::extension::instance::ExtensionInstance;
use crate::extension::state::ExtensionState;
use crate::model::handle::{InstanceId, INTERNAL_INSTANCE_ID, INTERNAL_OWNER_NAME};
use log::info;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// By-name lookup of live extension instances.
///
/// Implemented by whatever owns the extension lifecycle.
pub trait ExtensionDirectory: Send + Sync {
    fn lookup_by_name(&self, name: &str) -> Option<Arc<ExtensionInstance>>;

    fn current_state(&self, name: &str) -> Option<ExtensionState> {
        self.lookup_by_name(name).map(|instance| instance.state())
    }
}

/// In-process extension table keyed by extension name.
#[derive(Debug)]
pub struct ExtensionTable {
    entries: RwLock<BTreeMap<String, Arc<ExtensionInstance>>>,
    next_instance_id: AtomicU32,
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            next_instance_id: AtomicU32::new(INTERNAL_INSTANCE_ID + 1),
        }
    }
}

impl ExtensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a new extension instance in `Parsing` state.
    pub fn load(&self, name: &str) -> Result<Arc<ExtensionInstance>, ExtensionError> {
        let name = validate_extension_name(name)?;
        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return Err(ExtensionError::DuplicateName(name.to_string()));
        }

        let instance = Arc::new(ExtensionInstance::new(
            name,
            self.allocate_instance_id(),
            ExtensionState::Parsing,
        ));
        entries.insert(name.to_string(), Arc::clone(&instance));
        info!(
            "event=extension_load module=extension status=ok name={} instance_id={}",
            name,
            instance.instance_id()
        );
        Ok(instance)
    }

    /// Moves one extension to `state`, returning the previous state.
    pub fn set_state(
        &self,
        name: &str,
        state: ExtensionState,
    ) -> Result<ExtensionState, ExtensionError> {
        let instance = self
            .get(name)
            .ok_or_else(|| ExtensionError::NotFound(name.trim().to_string()))?;
        let previous = instance.set_state(state);
        info!(
            "event=extension_state module=extension status=ok name={} from={} to={}",
            instance.name(),
            previous,
            state
        );
        Ok(previous)
    }

    /// Tears down the current instance and installs a fresh one.
    ///
    /// The old instance is marked `Stopped`; the new one starts in `Parsing`
    /// with a new instance id and an empty handle registry.
    pub fn reload(&self, name: &str) -> Result<Arc<ExtensionInstance>, ExtensionError> {
        let name = name.trim();
        let mut entries = self.entries.write();
        let previous = entries
            .get(name)
            .cloned()
            .ok_or_else(|| ExtensionError::NotFound(name.to_string()))?;
        previous.set_state(ExtensionState::Stopped);

        let instance = Arc::new(ExtensionInstance::new(
            name,
            self.allocate_instance_id(),
            ExtensionState::Parsing,
        ));
        entries.insert(name.to_string(), Arc::clone(&instance));
        info!(
            "event=extension_reload module=extension status=ok name={} old_instance_id={} instance_id={}",
            name,
            previous.instance_id(),
            instance.instance_id()
        );
        Ok(instance)
    }

    /// Stops and removes one extension.
    pub fn unload(&self, name: &str) -> Result<(), ExtensionError> {
        let name = name.trim();
        let removed = self
            .entries
            .write()
            .remove(name)
            .ok_or_else(|| ExtensionError::NotFound(name.to_string()))?;
        removed.set_state(ExtensionState::Stopped);
        info!(
            "event=extension_unload module=extension status=ok name={} instance_id={}",
            name,
            removed.instance_id()
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ExtensionInstance>> {
        self.entries.read().get(name.trim()).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns sorted extension names.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn allocate_instance_id(&self) -> InstanceId {
        self.next_instance_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl ExtensionDirectory for ExtensionTable {
    fn lookup_by_name(&self, name: &str) -> Option<Arc<ExtensionInstance>> {
        self.get(name)
    }
}

fn validate_extension_name(value: &str) -> Result<&str, ExtensionError> {
    let trimmed = value.trim();
    if trimmed == INTERNAL_OWNER_NAME {
        return Err(ExtensionError::ReservedName(trimmed.to_string()));
    }
    if !is_valid_extension_name(trimmed) {
        return Err(ExtensionError::InvalidName(value.to_string()));
    }
    Ok(trimmed)
}

fn is_valid_extension_name(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_alphanumeric() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_alphanumeric() {
            prev_separator = false;
            continue;
        }
        if c == '.' || c == '_' || c == '-' {
            if prev_separator {
                return false;
            }
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

/// Extension table errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    InvalidName(String),
    ReservedName(String),
    DuplicateName(String),
    NotFound(String),
}

impl Display for ExtensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "extension name is invalid: {value}"),
            Self::ReservedName(value) => write!(f, "extension name is reserved: {value}"),
            Self::DuplicateName(value) => write!(f, "extension already loaded: {value}"),
            Self::NotFound(value) => write!(f, "extension not found: {value}"),
        }
    }
}

impl Error for ExtensionError {}
