//! Cross-extension handle validation.
//!
//! # Responsibility
//! - Resolve a handle's owner by name.
//! - Gate invocation on the owner's lifecycle state and registry contents.
//!
//! # Invariants
//! - Lookup is repeated on every validation; nothing is cached, so a reload
//!   or stop between two calls is always observed.

use crate::callref::owner::Owner;
use crate::extension::directory::ExtensionDirectory;
use crate::model::handle::{HandleRef, InstanceId, ReferenceId, INTERNAL_OWNER_NAME};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Handle resolution failures.
///
/// Only proxy construction reports these; invocation collapses every variant
/// into "no result".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRefError {
    /// No owner is registered under the handle's owner name.
    UnknownOwner(String),
    /// The owner exists but is not in an invocable lifecycle state.
    OwnerNotRunning(String),
    /// The owner's current instance does not hold this reference.
    UnknownReference(HandleRef),
}

impl Display for CallRefError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOwner(_) => write!(f, "Invalid resource name."),
            Self::OwnerNotRunning(_) => write!(f, "Resource wasn't running."),
            Self::UnknownReference(_) => write!(f, "Invalid function reference."),
        }
    }
}

impl Error for CallRefError {}

/// Validates handle triples against the extension directory.
#[derive(Clone)]
pub struct HandleValidator {
    directory: Arc<dyn ExtensionDirectory>,
}

impl HandleValidator {
    pub fn new(directory: Arc<dyn ExtensionDirectory>) -> Self {
        Self { directory }
    }

    /// Resolves the owner named `owner_name`.
    pub fn locate_owner(&self, owner_name: &str) -> Result<Owner, CallRefError> {
        if owner_name == INTERNAL_OWNER_NAME {
            return Ok(Owner::internal());
        }
        self.directory
            .lookup_by_name(owner_name)
            .map(Owner::Extension)
            .ok_or_else(|| CallRefError::UnknownOwner(owner_name.to_string()))
    }

    /// Accepts the internal owner and extensions in Parsing/Starting/Running.
    pub fn check_owner_live(&self, owner: &Owner) -> Result<(), CallRefError> {
        if owner.is_live() {
            Ok(())
        } else {
            Err(CallRefError::OwnerNotRunning(owner.name().to_string()))
        }
    }

    /// Full validation with the failure reason preserved.
    pub fn validate_detailed(
        &self,
        reference_id: ReferenceId,
        instance_id: InstanceId,
        owner_name: &str,
    ) -> Result<Owner, CallRefError> {
        let owner = self.locate_owner(owner_name)?;
        self.check_owner_live(&owner)?;
        if !owner.registry().has(reference_id, instance_id) {
            return Err(CallRefError::UnknownReference(HandleRef::new(
                reference_id,
                instance_id,
                owner_name,
            )));
        }
        Ok(owner)
    }

    /// Uniform validation: the reason for a failure is not exposed.
    pub fn validate(
        &self,
        reference_id: ReferenceId,
        instance_id: InstanceId,
        owner_name: &str,
    ) -> Option<Owner> {
        self.validate_detailed(reference_id, instance_id, owner_name).ok()
    }

    pub fn validate_handle(&self, handle: &HandleRef) -> Option<Owner> {
        self.validate(handle.reference_id, handle.instance_id, &handle.owner_name)
    }
}
