//! Callback handle system.
//!
//! # Responsibility
//! - Issue per-instance callback handles.
//! - Validate handles across extension boundaries by owner name.
//! - Expose lifecycle-gated proxies that forward calls to shared functions.
//!
//! # Invariants
//! - A handle is invocable only while its instance id matches the named
//!   owner's current instance and that instance's registry holds the id.
//! - Internal-owner handles are always live.

pub mod owner;
pub mod proxy;
pub mod registry;
pub mod validator;
