//! Memory use-case service.
//!
//! # Responsibility
//! - Provide the create/list semantics the remote operations expose.
//! - Apply one normalization policy on the write and read paths alike.
//! - Resolve the default-user attribution for every write.
//!
//! # Invariants
//! - Input constraints (non-empty content and app name) are enforced
//!   here, before any store call; the store does not repeat them.
//! - `create_memory` ensures the target app (and thereby the owner
//!   user) exists before inserting, so no memory can be orphaned.
//! - Lists are always sorted by `created_at DESC, id ASC`.

use crate::model::identity::{User, DEFAULT_USER_NAME};
use crate::model::memory::{MemoryRecord, MemoryValidationError, NewMemory};
use crate::repo::memory_repo::{
    normalize_app_name, normalize_category_name, normalize_list_limit, MemoryListQuery,
    MemoryStore, RepoError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for memory use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller input failed handler-side constraints.
    Validation(MemoryValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<MemoryValidationError> for ServiceError {
    fn from(value: MemoryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// List result envelope used by boundary callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryListResult {
    /// Matching records, most recent first.
    pub items: Vec<MemoryRecord>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Memory service facade over store implementations.
pub struct MemoryService<S: MemoryStore> {
    store: S,
}

impl<S: MemoryStore> MemoryService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upserts the built-in default user.
    ///
    /// Bootstrap entry point: runs once before any operation handler
    /// executes, making the singleton lifecycle explicit instead of a
    /// lazy side effect of the first write.
    pub fn ensure_default_user(&self) -> Result<User, ServiceError> {
        Ok(self.store.ensure_user(DEFAULT_USER_NAME)?)
    }

    /// Creates one memory for the given app, attributed to the default
    /// user.
    ///
    /// Normalizes the app name, lazily creates the app row on first
    /// use, inserts the memory and returns the stored record with its
    /// generated id and timestamp.
    pub fn create_memory(
        &mut self,
        content: impl Into<String>,
        app_name: &str,
    ) -> Result<MemoryRecord, ServiceError> {
        let normalized_app = normalize_app_name(app_name);
        let new = NewMemory::new(content, normalized_app.clone(), DEFAULT_USER_NAME);
        new.validate()?;

        self.store.ensure_app(&normalized_app, DEFAULT_USER_NAME)?;
        Ok(self.store.create_memory(&new)?)
    }

    /// Lists memories using optional app/category filters.
    ///
    /// Both filters run through the same normalization as the write
    /// path; blank filters count as absent. Returns the records plus
    /// the applied limit.
    pub fn list_memories(
        &self,
        app_name: Option<String>,
        category: Option<String>,
        limit: Option<u32>,
    ) -> Result<MemoryListResult, ServiceError> {
        let normalized_app = app_name
            .map(|value| normalize_app_name(&value))
            .filter(|value| !value.is_empty());
        let normalized_category = category.and_then(|value| normalize_category_name(&value));
        let applied_limit = normalize_list_limit(limit);

        let query = MemoryListQuery {
            app_name: normalized_app,
            category: normalized_category,
            limit: Some(applied_limit),
        };
        let items = self.store.list_memories(&query)?;

        Ok(MemoryListResult {
            items,
            applied_limit,
        })
    }
}
