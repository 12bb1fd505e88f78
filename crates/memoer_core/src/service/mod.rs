//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into the two operation semantics.
//! - Keep the operation boundary decoupled from storage details.

pub mod memory_service;
