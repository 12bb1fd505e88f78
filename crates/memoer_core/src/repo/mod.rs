//! Store layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for users, apps, memories and
//!   categories.
//! - Isolate SQLite query details from service/handler orchestration.
//!
//! # Invariants
//! - Referential integrity is enforced by the storage engine via
//!   foreign keys, not re-checked here.
//! - Get-or-create paths are atomic upserts; no check-then-insert.
//! - Store APIs surface semantic errors (`MemoryNotFound`) in addition
//!   to engine transport errors.

pub mod memory_repo;
