//! Per-instance callback handle registry.
//!
//! # Invariants
//! - Reference ids are allocated monotonically starting at 1.
//! - A minted id never replaces a live entry, including after the counter
//!   wraps past `i32::MAX`.
//! - Entries are never removed here; dropping the owning instance drops them.
//! - The owning instance is the single writer; other instances only read.

use crate::model::function::ScriptFunction;
use crate::model::handle::{InstanceId, ReferenceId};
use log::debug;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug)]
struct RegistryTable {
    next_reference_id: ReferenceId,
    entries: BTreeMap<ReferenceId, ScriptFunction>,
}

impl RegistryTable {
    fn allocate(&mut self) -> ReferenceId {
        loop {
            let candidate = self.next_reference_id;
            self.next_reference_id = candidate.checked_add(1).unwrap_or(1);
            if !self.entries.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Handle registry scoped to one execution instance.
#[derive(Debug)]
pub struct HandleRegistry {
    instance_id: InstanceId,
    table: RwLock<RegistryTable>,
}

impl HandleRegistry {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            table: RwLock::new(RegistryTable {
                next_reference_id: 1,
                entries: BTreeMap::new(),
            }),
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Stores `function` under a fresh reference id.
    ///
    /// Returns the reference id together with this registry's instance id.
    pub fn mint(&self, function: ScriptFunction) -> (ReferenceId, InstanceId) {
        let mut table = self.table.write();
        let reference_id = table.allocate();
        debug!(
            "event=handle_mint module=callref status=ok instance_id={} reference_id={} function={}",
            self.instance_id,
            reference_id,
            function.name()
        );
        table.entries.insert(reference_id, function);
        (reference_id, self.instance_id)
    }

    /// True only when `instance_id` is this registry's and the id is present.
    pub fn has(&self, reference_id: ReferenceId, instance_id: InstanceId) -> bool {
        instance_id == self.instance_id && self.table.read().entries.contains_key(&reference_id)
    }

    pub fn resolve(&self, reference_id: ReferenceId) -> Option<ScriptFunction> {
        self.table.read().entries.get(&reference_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().entries.is_empty()
    }
}
