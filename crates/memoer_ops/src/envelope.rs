//! Response envelope and failure classification for operation calls.
//!
//! # Responsibility
//! - Define the uniform `ok + text + error` shape every operation
//!   returns.
//! - Map layered core errors onto the four boundary failure kinds.
//!
//! # Invariants
//! - A failed response always carries both the structured error and a
//!   human-readable `text` rendering of it.
//! - Classification only inspects errors; it never alters them.

use memoer_core::{RepoError, ServiceError};
use serde::Serialize;

/// Failure classes reported across the operation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing caller input.
    Validation,
    /// Referential or uniqueness rules were violated in storage.
    Integrity,
    /// Storage is unreachable or its schema is not provisioned.
    Unavailable,
    /// Any failure outside the other classes.
    Internal,
}

impl ErrorKind {
    /// Stable lowercase label used in logs and serialized envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Integrity => "integrity",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

/// Structured failure detail carried by unsuccessful responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpError {
    /// Failure class for caller-side branching.
    pub kind: ErrorKind,
    /// Human-readable failure description.
    pub message: String,
}

impl OpError {
    /// Builds an error with an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classifies a persistence-layer failure.
    pub fn from_repo(err: &RepoError) -> Self {
        Self::new(classify_repo_error(err), err.to_string())
    }

    /// Classifies a service-layer failure.
    pub fn from_service(err: &ServiceError) -> Self {
        Self::new(classify_service_error(err), err.to_string())
    }
}

/// Uniform response envelope for every operation call.
///
/// Operations always return an envelope; failures never cross the
/// boundary as panics or typed errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable payload: confirmation text or serialized records
    /// on success, failure description otherwise.
    pub text: String,
    /// Structured failure detail; `None` on success.
    pub error: Option<OpError>,
}

impl OpResponse {
    /// Builds a successful response carrying the given payload text.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
            error: None,
        }
    }

    /// Builds a failed response, rendering `text` as the operation
    /// context followed by the error message.
    pub fn failure(context: &str, error: OpError) -> Self {
        Self {
            ok: false,
            text: format!("{context}: {}", error.message),
            error: Some(error),
        }
    }
}

fn classify_repo_error(err: &RepoError) -> ErrorKind {
    if err.is_unavailable() {
        ErrorKind::Unavailable
    } else if err.is_constraint_violation() {
        ErrorKind::Integrity
    } else {
        match err {
            RepoError::MemoryNotFound(_) => ErrorKind::Integrity,
            _ => ErrorKind::Internal,
        }
    }
}

fn classify_service_error(err: &ServiceError) -> ErrorKind {
    match err {
        ServiceError::Validation(_) => ErrorKind::Validation,
        ServiceError::Repo(repo_err) => classify_repo_error(repo_err),
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, OpError, OpResponse};
    use memoer_core::{MemoryValidationError, RepoError, ServiceError};
    use uuid::Uuid;

    #[test]
    fn validation_errors_classify_as_validation() {
        let err = ServiceError::Validation(MemoryValidationError::EmptyContent);
        assert_eq!(OpError::from_service(&err).kind, ErrorKind::Validation);
    }

    #[test]
    fn readiness_errors_classify_as_unavailable() {
        let err = RepoError::MissingRequiredTable("memories");
        assert_eq!(OpError::from_repo(&err).kind, ErrorKind::Unavailable);

        let err = RepoError::UninitializedConnection {
            expected_version: 2,
            actual_version: 0,
        };
        assert_eq!(OpError::from_repo(&err).kind, ErrorKind::Unavailable);
    }

    #[test]
    fn missing_memory_classifies_as_integrity() {
        let err = RepoError::MemoryNotFound(Uuid::new_v4());
        assert_eq!(OpError::from_repo(&err).kind, ErrorKind::Integrity);
    }

    #[test]
    fn opaque_data_errors_classify_as_internal() {
        let err = RepoError::InvalidData("bad row".to_string());
        assert_eq!(OpError::from_repo(&err).kind, ErrorKind::Internal);
    }

    #[test]
    fn failure_text_prefixes_context() {
        let response = OpResponse::failure(
            "Error creating memory",
            OpError::new(ErrorKind::Validation, "content must not be empty"),
        );
        assert!(!response.ok);
        assert_eq!(
            response.text,
            "Error creating memory: content must not be empty"
        );
        let error = response.error.expect("failure carries error detail");
        assert_eq!(error.kind, ErrorKind::Validation);
    }

    #[test]
    fn success_carries_no_error() {
        let response = OpResponse::success("done");
        assert!(response.ok);
        assert!(response.error.is_none());
    }
}
