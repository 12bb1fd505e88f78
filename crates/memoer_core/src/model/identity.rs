//! User and app identity records.
//!
//! # Responsibility
//! - Model the account that owns memories and the named client apps
//!   writing them.
//!
//! # Invariants
//! - `User.name` is unique and is the effective lookup key; the `id` is
//!   generated once at creation and only travels along.
//! - `App.name` is unique and stored in normalized form (see
//!   [`crate::repo::memory_repo::normalize_app_name`]).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user row.
pub type UserId = Uuid;

/// Name of the built-in account all apps and memories are attributed
/// to. Upserted during bootstrap, before any operation handler runs.
pub const DEFAULT_USER_NAME: &str = "default-user";

/// An end-user account.
///
/// The system currently models a single tenant: every write resolves to
/// the [`DEFAULT_USER_NAME`] row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated at creation; opaque to callers.
    pub id: UserId,
    /// Unique human-readable key.
    pub name: String,
}

impl User {
    /// Creates a user row candidate with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A named client/agent identity that owns created memories.
///
/// Rows are created lazily on the first memory write for a
/// previously-unseen app name and are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    /// Unique normalized name; the key memory rows reference.
    pub name: String,
    /// Owning user (many apps to one user).
    pub owner_id: UserId,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}
