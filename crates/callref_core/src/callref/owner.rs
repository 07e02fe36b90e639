//! Handle owners: real extensions or the host-internal owner.

use crate::callref::registry::HandleRegistry;
use crate::extension::instance::ExtensionInstance;
use crate::extension::state::ExtensionState;
use crate::model::handle::{InstanceId, INTERNAL_INSTANCE_ID, INTERNAL_OWNER_NAME};
use once_cell::sync::Lazy;
use std::sync::Arc;

static INTERNAL_OWNER: Lazy<InternalOwner> = Lazy::new(|| InternalOwner {
    registry: HandleRegistry::new(INTERNAL_INSTANCE_ID),
});

/// Owner of host-native callbacks not tied to any extension. Always live.
#[derive(Debug)]
pub struct InternalOwner {
    registry: HandleRegistry,
}

impl InternalOwner {
    /// Returns the process-wide internal owner.
    pub fn get() -> &'static InternalOwner {
        &INTERNAL_OWNER
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }
}

/// Party that issued a callback handle.
#[derive(Debug, Clone)]
pub enum Owner {
    Extension(Arc<ExtensionInstance>),
    Internal(&'static InternalOwner),
}

impl Owner {
    pub fn internal() -> Self {
        Self::Internal(InternalOwner::get())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Extension(instance) => instance.name(),
            Self::Internal(_) => INTERNAL_OWNER_NAME,
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.registry().instance_id()
    }

    pub fn registry(&self) -> &HandleRegistry {
        match self {
            Self::Extension(instance) => instance.registry(),
            Self::Internal(owner) => owner.registry(),
        }
    }

    /// Lifecycle state; `None` for the internal owner.
    pub fn state(&self) -> Option<ExtensionState> {
        match self {
            Self::Extension(instance) => Some(instance.state()),
            Self::Internal(_) => None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.state().map_or(true, ExtensionState::accepts_invocations)
    }

    /// True once the instance was stopped or failed; reloads and unloads
    /// stop the outgoing instance.
    pub fn is_retired(&self) -> bool {
        matches!(
            self.state(),
            Some(ExtensionState::Stopped | ExtensionState::Errored)
        )
    }
}
