//! Domain model for the memory store.
//!
//! # Responsibility
//! - Define the four canonical entities as plain structs with explicit
//!   foreign-key fields (no reflective mapping layer).
//! - Provide pre-write validation helpers for the handler side.
//!
//! # Invariants
//! - `User.id` and `Memory.id` are stable and never reused.
//! - `users.name` and normalized `apps.name` are the lookup keys; code
//!   keys off names, not generated ids.

pub mod identity;
pub mod memory;
