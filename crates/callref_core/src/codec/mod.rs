//! Portable argument encoding for event payloads.
//!
//! # Responsibility
//! - Turn ordered argument lists into one order-preserving byte payload.
//!
//! # Invariants
//! - Empty or absent argument lists encode to the one-byte nil sentinel.
//! - Decoding is the receiving side's concern and is not offered here.

pub mod args;
