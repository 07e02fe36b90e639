//! Event dispatch and cancellation.
//!
//! # Responsibility
//! - Run locally registered handlers for one event in registration order.
//! - Track one cancellation flag per dispatch.
//! - Forward remote events, unchanged, to the network layer.
//!
//! # Invariants
//! - A cancellation flag never outlives its dispatch.
//! - Whitelisting is append-only and only gates remote acceptance.

pub mod dispatch;
pub mod network;
