//! Extension directory collaborator.
//!
//! The full lifecycle state machine lives outside the callback core. This
//! module defines the by-name lookup contract the core consumes and an
//! in-process table implementing it.

pub mod directory;
pub mod instance;
pub mod state;
