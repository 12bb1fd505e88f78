//! Operation boundary for the memoer store.
//!
//! # Responsibility
//! - Expose the remote-callable memory operations with never-throw
//!   envelope semantics, leaving transport wiring to the embedder.
//!
//! # Invariants
//! - Nothing in this crate panics on the call path.
//! - All storage access goes through `memoer_core`.

pub mod envelope;
pub mod ops;

pub use envelope::{ErrorKind, OpError, OpResponse};
pub use ops::{
    operation_definitions, MemoryOps, OperationDefinition, OP_CREATE_MEMORY, OP_GET_MEMORIES,
};
