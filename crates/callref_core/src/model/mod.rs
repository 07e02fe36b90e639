//! Value model shared across extension boundaries.
//!
//! # Responsibility
//! - Define dynamically typed script values and tables.
//! - Define callback handle identity and underlying function values.
//!
//! # Invariants
//! - Values never carry a direct reference to another extension's state;
//!   functions cross boundaries only as `HandleRef` triples.

pub mod function;
pub mod handle;
pub mod value;
