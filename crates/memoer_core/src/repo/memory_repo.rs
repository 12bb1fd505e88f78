//! Memory store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the store operations (`ensure_user`, `ensure_app`,
//!   `create_memory`, `list_memories`, category management) over
//!   canonical storage.
//! - Own category label management and the memory/category link table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - App names passed in are already normalized via
//!   [`normalize_app_name`]; the same helper runs on write and on
//!   read-side filtering so both paths agree.
//! - Get-or-create uses `INSERT OR IGNORE` plus read-back, never a
//!   check-then-insert, so concurrent first-time callers cannot create
//!   duplicate rows.
//! - Category names are normalized to lowercase before persistence.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::identity::{App, User, UserId};
use crate::model::memory::{Category, MemoryId, MemoryRecord, NewMemory};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Default number of rows returned by `list_memories`.
pub const DEFAULT_LIST_LIMIT: u32 = 10;

const MEMORY_SELECT_SQL: &str = "SELECT
    id,
    content,
    app_name,
    user_name,
    created_at
FROM memories";

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    MemoryNotFound(MemoryId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MemoryNotFound(id) => write!(f, "memory not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted store data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store schema not initialized: version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "store schema is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "store table `{table}` is missing required column `{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Whether the underlying engine reported a constraint violation
    /// (unique or foreign key). The store itself does not recover from
    /// these; boundary layers use this to classify integrity failures.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(ffi_err, _)))
                if ffi_err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    /// Whether the failure means the storage is unreachable or its
    /// schema has not been provisioned yet.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::Db(DbError::UnsupportedSchemaVersion { .. }) => true,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(ffi_err, _))) => matches!(
                ffi_err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::NotADatabase
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Query options for listing memories.
///
/// Absent filters are unconstrained; supplied filters combine with AND
/// semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryListQuery {
    /// Normalized app name to match exactly.
    pub app_name: Option<String>,
    /// Category label to match (case-insensitive).
    pub category: Option<String>,
    /// Maximum rows to return. `None` or `Some(0)` fall back to
    /// [`DEFAULT_LIST_LIMIT`].
    pub limit: Option<u32>,
}

/// Store interface for memory persistence and queries.
pub trait MemoryStore {
    /// Idempotent get-or-create of a user row by unique name.
    fn ensure_user(&self, name: &str) -> RepoResult<User>;
    /// Idempotent get-or-create of an app row by unique normalized
    /// name; creates the owner user first when absent.
    fn ensure_app(&mut self, name: &str, owner_name: &str) -> RepoResult<App>;
    /// Inserts one memory row linked to an existing app and user and
    /// returns the stored record. The app must already exist; callers
    /// run [`MemoryStore::ensure_app`] first.
    fn create_memory(&self, new: &NewMemory) -> RepoResult<MemoryRecord>;
    /// Lists memories matching all supplied filters, most recent
    /// first, truncated to the normalized limit.
    fn list_memories(&self, query: &MemoryListQuery) -> RepoResult<Vec<MemoryRecord>>;
    /// Idempotent get-or-create of a category label.
    fn ensure_category(&self, name: &str) -> RepoResult<Category>;
    /// Replaces the full category set of one memory in one transaction.
    fn set_memory_categories(&mut self, memory_id: MemoryId, names: &[String]) -> RepoResult<()>;
    /// Returns all known categories sorted by name.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
}

/// SQLite-backed memory store.
#[derive(Debug)]
pub struct SqliteMemoryStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteMemoryStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    ///
    /// Rejects connections whose schema has not been provisioned so
    /// availability failures surface at construction instead of as
    /// opaque query errors later.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MemoryStore for SqliteMemoryStore<'_> {
    fn ensure_user(&self, name: &str) -> RepoResult<User> {
        ensure_user_on(self.conn, name)
    }

    fn ensure_app(&mut self, name: &str, owner_name: &str) -> RepoResult<App> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let app = ensure_app_in_tx(&tx, name, owner_name)?;
        tx.commit()?;
        Ok(app)
    }

    fn create_memory(&self, new: &NewMemory) -> RepoResult<MemoryRecord> {
        self.conn.execute(
            "INSERT INTO memories (id, content, app_name, user_name)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                new.id.to_string(),
                new.content.as_str(),
                new.app_name.as_str(),
                new.user_name.as_str(),
            ],
        )?;

        load_memory_record(self.conn, new.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("memory `{}` missing after insert", new.id))
        })
    }

    fn list_memories(&self, query: &MemoryListQuery) -> RepoResult<Vec<MemoryRecord>> {
        let mut sql = format!("{MEMORY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(app_name) = query.app_name.as_ref() {
            sql.push_str(" AND app_name = ?");
            bind_values.push(Value::Text(app_name.clone()));
        }

        if let Some(category) = query.category.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM memory_categories mc
                    INNER JOIN categories c ON c.id = mc.category_id
                    WHERE mc.memory_id = memories.id
                      AND c.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(category.clone()));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let id = parse_memory_id(&id_text)?;
            let categories = load_categories_for_memory(self.conn, &id_text)?;
            records.push(MemoryRecord {
                id,
                content: row.get("content")?,
                app_name: row.get("app_name")?,
                user_name: row.get("user_name")?,
                created_at: row.get("created_at")?,
                categories,
            });
        }

        Ok(records)
    }

    fn ensure_category(&self, name: &str) -> RepoResult<Category> {
        let normalized = normalize_category_name(name).ok_or_else(|| {
            RepoError::InvalidData(format!("category name `{name}` is blank after normalization"))
        })?;

        self.conn.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1);",
            [normalized.as_str()],
        )?;

        load_category(self.conn, &normalized)?.ok_or_else(|| {
            RepoError::InvalidData(format!("category `{normalized}` missing after upsert"))
        })
    }

    fn set_memory_categories(&mut self, memory_id: MemoryId, names: &[String]) -> RepoResult<()> {
        let normalized = normalize_category_names(names);
        let memory_id_text = memory_id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !memory_exists_in_tx(&tx, memory_id_text.as_str())? {
            return Err(RepoError::MemoryNotFound(memory_id));
        }

        tx.execute(
            "DELETE FROM memory_categories WHERE memory_id = ?1;",
            [memory_id_text.as_str()],
        )?;

        for name in &normalized {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1);",
                [name.as_str()],
            )?;
            tx.execute(
                "INSERT INTO memory_categories (memory_id, category_id)
                 SELECT ?1, id
                 FROM categories
                 WHERE name = ?2 COLLATE NOCASE;",
                params![memory_id_text.as_str(), name.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(Category {
                id: row.get("id")?,
                name: row.get::<_, String>("name")?.to_lowercase(),
            });
        }
        Ok(categories)
    }
}

/// Normalizes an app name for storage and filtering.
///
/// Trims, lowercases, and collapses internal whitespace runs to single
/// underscores. Idempotent, and applied identically on the write and
/// read paths.
pub fn normalize_app_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    WHITESPACE_RUN_RE.replace_all(&lowered, "_").into_owned()
}

/// Normalizes one category label. Blank input yields `None`.
pub fn normalize_category_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates category labels, dropping blanks.
pub fn normalize_category_names(names: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for name in names {
        if let Some(value) = normalize_category_name(name) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

/// Normalizes a list limit according to the query contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => DEFAULT_LIST_LIMIT,
        Some(value) => value,
    }
}

fn ensure_user_on(conn: &Connection, name: &str) -> RepoResult<User> {
    let candidate = User::new(name);
    conn.execute(
        "INSERT OR IGNORE INTO users (id, name) VALUES (?1, ?2);",
        params![candidate.id.to_string(), name],
    )?;

    load_user(conn, name)?
        .ok_or_else(|| RepoError::InvalidData(format!("user `{name}` missing after upsert")))
}

fn ensure_app_in_tx(tx: &Transaction<'_>, name: &str, owner_name: &str) -> RepoResult<App> {
    let owner = ensure_user_on(tx, owner_name)?;

    tx.execute(
        "INSERT OR IGNORE INTO apps (name, owner_id) VALUES (?1, ?2);",
        params![name, owner.id.to_string()],
    )?;

    load_app(tx, name)?
        .ok_or_else(|| RepoError::InvalidData(format!("app `{name}` missing after upsert")))
}

fn load_user(conn: &Connection, name: &str) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare("SELECT id, name FROM users WHERE name = ?1;")?;
    let mut rows = stmt.query([name])?;

    if let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        let id: UserId = Uuid::parse_str(&id_text).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{id_text}` in users.id"))
        })?;
        return Ok(Some(User {
            id,
            name: row.get("name")?,
        }));
    }

    Ok(None)
}

fn load_app(conn: &Connection, name: &str) -> RepoResult<Option<App>> {
    let mut stmt =
        conn.prepare("SELECT name, owner_id, created_at FROM apps WHERE name = ?1;")?;
    let mut rows = stmt.query([name])?;

    if let Some(row) = rows.next()? {
        let owner_text: String = row.get("owner_id")?;
        let owner_id: UserId = Uuid::parse_str(&owner_text).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{owner_text}` in apps.owner_id"))
        })?;
        return Ok(Some(App {
            name: row.get("name")?,
            owner_id,
            created_at: row.get("created_at")?,
        }));
    }

    Ok(None)
}

fn load_category(conn: &Connection, name: &str) -> RepoResult<Option<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, name FROM categories WHERE name = ?1 COLLATE NOCASE;")?;
    let mut rows = stmt.query([name])?;

    if let Some(row) = rows.next()? {
        return Ok(Some(Category {
            id: row.get("id")?,
            name: row.get::<_, String>("name")?.to_lowercase(),
        }));
    }

    Ok(None)
}

fn load_memory_record(conn: &Connection, id: MemoryId) -> RepoResult<Option<MemoryRecord>> {
    let id_text = id.to_string();
    let mut stmt = conn.prepare(&format!("{MEMORY_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id_text.as_str()])?;

    if let Some(row) = rows.next()? {
        let categories = load_categories_for_memory(conn, &id_text)?;
        return Ok(Some(MemoryRecord {
            id,
            content: row.get("content")?,
            app_name: row.get("app_name")?,
            user_name: row.get("user_name")?,
            created_at: row.get("created_at")?,
            categories,
        }));
    }

    Ok(None)
}

fn load_categories_for_memory(conn: &Connection, memory_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT c.name
         FROM memory_categories mc
         INNER JOIN categories c ON c.id = mc.category_id
         WHERE mc.memory_id = ?1
         ORDER BY c.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([memory_id])?;
    let mut categories = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        categories.push(value.to_lowercase());
    }
    Ok(categories)
}

fn memory_exists_in_tx(tx: &Transaction<'_>, memory_id: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM memories
            WHERE id = ?1
        );",
        [memory_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_memory_id(value: &str) -> RepoResult<MemoryId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in memories.id"))
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = crate::db::migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version == 0 {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
        ("users", &["id", "name"]),
        ("apps", &["name", "owner_id", "created_at"]),
        (
            "memories",
            &["id", "content", "app_name", "user_name", "created_at"],
        ),
        ("categories", &["id", "name"]),
        ("memory_categories", &["memory_id", "category_id"]),
    ];

    for &(table, columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
