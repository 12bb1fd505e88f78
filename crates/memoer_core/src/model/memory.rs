//! Memory and category records.
//!
//! # Responsibility
//! - Model the primary content unit (a stored free-text record) in its
//!   write and read shapes, plus the optional category labels.
//!
//! # Invariants
//! - Memory rows are append-only; there is no update or delete shape.
//! - Every memory references an existing app and user by name; the
//!   storage engine enforces this, not the structs here.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a memory row.
pub type MemoryId = Uuid;

/// Write model for one new memory row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemory {
    /// Generated before insert; returned to the caller on success.
    pub id: MemoryId,
    /// Free-text payload.
    pub content: String,
    /// Normalized app key this memory belongs to.
    pub app_name: String,
    /// Owning user key, currently always the default user.
    pub user_name: String,
}

impl NewMemory {
    /// Creates a write model with a freshly generated id.
    pub fn new(
        content: impl Into<String>,
        app_name: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            app_name: app_name.into(),
            user_name: user_name.into(),
        }
    }

    /// Checks handler-side input constraints before persistence.
    ///
    /// The store itself does not repeat these checks; callers on the
    /// handler side run them before touching SQL.
    pub fn validate(&self) -> Result<(), MemoryValidationError> {
        if self.content.trim().is_empty() {
            return Err(MemoryValidationError::EmptyContent);
        }
        if self.app_name.trim().is_empty() {
            return Err(MemoryValidationError::EmptyAppName);
        }
        if self.user_name.trim().is_empty() {
            return Err(MemoryValidationError::EmptyUserName);
        }
        Ok(())
    }
}

/// Read model for one memory row joined with its category names.
///
/// Serialized with camelCase keys to match the payload shape callers
/// of the remote operations historically received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Stable memory id.
    pub id: MemoryId,
    /// Free-text payload.
    pub content: String,
    /// Normalized app key.
    pub app_name: String,
    /// Owning user key.
    pub user_name: String,
    /// Creation timestamp in epoch milliseconds; list order key.
    pub created_at: i64,
    /// Category names attached to this memory, normalized lowercase.
    pub categories: Vec<String>,
}

/// An optional label attachable to many memories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Row id referenced by the association table.
    pub id: i64,
    /// Unique normalized label.
    pub name: String,
}

/// Input constraint violations caught before any SQL runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryValidationError {
    EmptyContent,
    EmptyAppName,
    EmptyUserName,
}

impl Display for MemoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "memory content must not be empty"),
            Self::EmptyAppName => write!(f, "app name must not be empty"),
            Self::EmptyUserName => write!(f, "user name must not be empty"),
        }
    }
}

impl Error for MemoryValidationError {}
