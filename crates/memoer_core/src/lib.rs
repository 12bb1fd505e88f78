//! Core domain logic for the memoer memory store.
//! This crate is the single source of truth for storage invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::identity::{App, User, UserId, DEFAULT_USER_NAME};
pub use model::memory::{Category, MemoryId, MemoryRecord, MemoryValidationError, NewMemory};
pub use repo::memory_repo::{
    normalize_app_name, normalize_category_name, normalize_list_limit, MemoryListQuery,
    MemoryStore, RepoError, RepoResult, SqliteMemoryStore, DEFAULT_LIST_LIMIT,
};
pub use service::memory_service::{MemoryListResult, MemoryService, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
