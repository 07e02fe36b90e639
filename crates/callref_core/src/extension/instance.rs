//! One live execution instance of an extension.

use crate::callref::registry::HandleRegistry;
use crate::extension::state::ExtensionState;
use crate::model::handle::InstanceId;
use parking_lot::RwLock;

/// Execution instance of one named extension.
///
/// A reload produces a new instance with a new id and an empty registry, so
/// handles minted by the previous instance stop validating.
#[derive(Debug)]
pub struct ExtensionInstance {
    name: String,
    state: RwLock<ExtensionState>,
    registry: HandleRegistry,
}

impl ExtensionInstance {
    pub fn new(name: impl Into<String>, instance_id: InstanceId, state: ExtensionState) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(state),
            registry: HandleRegistry::new(instance_id),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance_id(&self) -> InstanceId {
        self.registry.instance_id()
    }

    pub fn state(&self) -> ExtensionState {
        *self.state.read()
    }

    /// Returns the previous state.
    pub fn set_state(&self, state: ExtensionState) -> ExtensionState {
        std::mem::replace(&mut *self.state.write(), state)
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }
}
