//! Callback handle identity.
//!
//! # Responsibility
//! - Define the `(reference_id, instance_id, owner_name)` triple shared
//!   between extensions.
//!
//! # Invariants
//! - `reference_id` is only unique within the issuing instance's registry.
//! - `instance_id` 0 belongs to the internal owner; extension instances start
//!   at 1.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Reserved owner name for host-native callbacks.
pub const INTERNAL_OWNER_NAME: &str = "__internal";
/// Instance id of the internal owner registry.
pub const INTERNAL_INSTANCE_ID: u32 = 0;

/// Reference id, unique within one handle registry.
pub type ReferenceId = i32;
/// Execution instance id of one owner.
pub type InstanceId = u32;

/// Opaque callback handle granting revocable invocation rights.
///
/// Serialized with the same field names a proxy exposes to script code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleRef {
    #[serde(rename = "__reference")]
    pub reference_id: ReferenceId,
    #[serde(rename = "__instance")]
    pub instance_id: InstanceId,
    #[serde(rename = "__resource")]
    pub owner_name: String,
}

impl HandleRef {
    pub fn new(
        reference_id: ReferenceId,
        instance_id: InstanceId,
        owner_name: impl Into<String>,
    ) -> Self {
        Self {
            reference_id,
            instance_id,
            owner_name: owner_name.into(),
        }
    }
}

impl Display for HandleRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}#{}@{}",
            self.owner_name, self.reference_id, self.instance_id
        )
    }
}
