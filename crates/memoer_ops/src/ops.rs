//! Remote-callable memory operations.
//!
//! # Responsibility
//! - Expose `createMemory` and `getMemories` as parameter-bag calls
//!   plus a by-name dispatch for embedding transports.
//! - Own the process-wide store session and its bootstrap.
//!
//! # Invariants
//! - Handlers never panic and never return typed errors; every call
//!   ends in an [`OpResponse`] envelope.
//! - The default user row exists before the first handler can run.
//! - Operation names and parameter keys are wire-stable.

use crate::envelope::{ErrorKind, OpError, OpResponse};
use log::{error, info};
use memoer_core::db::{open_db, open_db_in_memory, resolve_db_path};
use memoer_core::{MemoryService, ServiceError, SqliteMemoryStore};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

/// Wire name of the memory creation operation.
pub const OP_CREATE_MEMORY: &str = "createMemory";
/// Wire name of the memory retrieval operation.
pub const OP_GET_MEMORIES: &str = "getMemories";

const CREATE_ERROR_CONTEXT: &str = "Error creating memory";
const GET_ERROR_CONTEXT: &str = "Error retrieving memories";
const INVOKE_ERROR_CONTEXT: &str = "Error invoking operation";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMemoryParams {
    content: String,
    app_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetMemoriesParams {
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

/// Describes one callable operation for transport registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDefinition {
    /// Wire-stable operation name.
    pub name: &'static str,
    /// Human-readable purpose line.
    pub description: &'static str,
    /// JSON schema of the parameter bag.
    pub parameters: serde_json::Value,
}

/// Returns the definitions of every callable operation.
pub fn operation_definitions() -> Vec<OperationDefinition> {
    vec![
        OperationDefinition {
            name: OP_CREATE_MEMORY,
            description: "Store a new memory attributed to the calling app.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "the content/memory to store into local storage"
                    },
                    "appName": {
                        "type": "string",
                        "description": "the name of the app/agent you are"
                    }
                },
                "required": ["content", "appName"]
            }),
        },
        OperationDefinition {
            name: OP_GET_MEMORIES,
            description: "Retrieve stored memories, optionally filtered by app or category.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "appName": {
                        "type": "string",
                        "description": "Filter by app name"
                    },
                    "category": {
                        "type": "string",
                        "description": "Filter by category label"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results (default 10)"
                    }
                }
            }),
        },
    ]
}

/// Operation context owning the process-wide store session.
///
/// Construction resolves the database location, applies migrations and
/// upserts the default user, so by the time a handler runs the store
/// is provisioned. All handlers share one connection behind a mutex.
pub struct MemoryOps {
    conn: Mutex<Connection>,
}

impl MemoryOps {
    /// Opens the store at the resolved path and runs bootstrap.
    ///
    /// # Operation contract
    /// - `explicit_path` wins over the `MEMOER_DB_PATH` environment
    ///   variable, which wins over the bundled default file.
    /// - Fails fast with a diagnostic string when the store cannot be
    ///   provisioned; handlers are never reachable in that state.
    pub fn open(explicit_path: Option<&Path>) -> Result<Self, String> {
        let db_path = resolve_db_path(explicit_path);
        let conn = open_db(&db_path).map_err(|err| format!("store open failed: {err}"))?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory store, mainly for tests and demos.
    pub fn open_in_memory() -> Result<Self, String> {
        let conn =
            open_db_in_memory().map_err(|err| format!("in-memory store open failed: {err}"))?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, String> {
        {
            let store = SqliteMemoryStore::try_new(&mut conn)
                .map_err(|err| format!("store init failed: {err}"))?;
            let service = MemoryService::new(store);
            let user = service
                .ensure_default_user()
                .map_err(|err| format!("default user bootstrap failed: {err}"))?;
            info!(
                "event=ops_bootstrap module=ops status=ok default_user={}",
                user.name
            );
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Stores one memory for the calling app.
    ///
    /// # Operation contract
    /// - Parameters: `content` (string), `appName` (string).
    /// - Never panics; malformed input and storage failures come back
    ///   as failure envelopes.
    /// - Success text reports the generated memory id.
    pub fn create_memory(&self, params: serde_json::Value) -> OpResponse {
        let started_at = Instant::now();
        respond(
            OP_CREATE_MEMORY,
            CREATE_ERROR_CONTEXT,
            self.try_create_memory(params),
            started_at,
        )
    }

    /// Retrieves memories with optional `appName`, `category` and
    /// `limit` parameters.
    ///
    /// # Operation contract
    /// - All parameters optional; an empty bag lists the most recent
    ///   memories across every app.
    /// - Never panics; success text is the matching records serialized
    ///   as pretty-printed JSON.
    pub fn get_memories(&self, params: serde_json::Value) -> OpResponse {
        let started_at = Instant::now();
        respond(
            OP_GET_MEMORIES,
            GET_ERROR_CONTEXT,
            self.try_get_memories(params),
            started_at,
        )
    }

    /// Dispatches a call by wire operation name.
    ///
    /// Unknown names produce a validation failure envelope instead of
    /// an error, keeping the never-throw contract at the outermost
    /// entry point.
    pub fn invoke(&self, operation: &str, params: serde_json::Value) -> OpResponse {
        match operation {
            OP_CREATE_MEMORY => self.create_memory(params),
            OP_GET_MEMORIES => self.get_memories(params),
            other => {
                error!("event=op_invoke module=ops op={other} status=error kind=validation");
                OpResponse::failure(
                    INVOKE_ERROR_CONTEXT,
                    OpError::new(
                        ErrorKind::Validation,
                        format!("unknown operation `{other}`"),
                    ),
                )
            }
        }
    }

    fn try_create_memory(&self, params: serde_json::Value) -> Result<String, OpError> {
        let params: CreateMemoryParams = parse_params(params)?;
        let record = self.with_service(|service| {
            service.create_memory(params.content, &params.app_name)
        })?;
        Ok(format!("Memory created successfully with ID: {}", record.id))
    }

    fn try_get_memories(&self, params: serde_json::Value) -> Result<String, OpError> {
        let params: GetMemoriesParams = parse_params(params)?;
        let result = self.with_service(|service| {
            service.list_memories(params.app_name, params.category, params.limit)
        })?;
        serde_json::to_string_pretty(&result.items).map_err(|err| {
            OpError::new(
                ErrorKind::Internal,
                format!("response serialization failed: {err}"),
            )
        })
    }

    fn with_service<T>(
        &self,
        run: impl FnOnce(&mut MemoryService<SqliteMemoryStore<'_>>) -> Result<T, ServiceError>,
    ) -> Result<T, OpError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| OpError::new(ErrorKind::Internal, "store session lock poisoned"))?;
        let store =
            SqliteMemoryStore::try_new(&mut guard).map_err(|err| OpError::from_repo(&err))?;
        let mut service = MemoryService::new(store);
        run(&mut service).map_err(|err| OpError::from_service(&err))
    }
}

fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, OpError> {
    serde_json::from_value(params).map_err(|err| {
        OpError::new(ErrorKind::Validation, format!("invalid parameters: {err}"))
    })
}

fn respond(
    op: &str,
    error_context: &str,
    outcome: Result<String, OpError>,
    started_at: Instant,
) -> OpResponse {
    let duration_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(text) => {
            info!("event=op_invoke module=ops op={op} status=ok duration_ms={duration_ms}");
            OpResponse::success(text)
        }
        Err(op_error) => {
            error!(
                "event=op_invoke module=ops op={op} status=error kind={} duration_ms={duration_ms}",
                op_error.kind.as_str()
            );
            OpResponse::failure(error_context, op_error)
        }
    }
}
