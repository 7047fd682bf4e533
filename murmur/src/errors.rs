use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the document store layer.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Target entity was not found when performing a mutation.
    #[error("entity not found")]
    NotFound { entity_id: Option<String> },

    /// Invalid input supplied to a store operation.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Unique constraint violation - the value already exists on another entity.
    #[error("unique constraint violation: field '{field}' with value '{value}' already exists on entity '{existing_entity_id}'")]
    UniqueConstraintViolation {
        field: String,
        value: String,
        existing_entity_id: String,
    },

    /// A declared reference field points at an entity that does not exist.
    #[error("reference '{field}' points at missing entity '{entity_id}'")]
    ReferenceNotFound { field: String, entity_id: String },

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl RepoError {
    pub(crate) fn other(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Other { message: message.into() }
    }
}

/// Collection of validation issues encountered while preparing a mutation.
#[derive(Debug, Clone, Error)]
#[error("{}", join_messages(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn join_messages(issues: &[ValidationIssue]) -> String {
    issues.iter().map(|issue| issue.message.as_str()).collect::<Vec<_>>().join("; ")
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }
}

/// Detailed validation failure for a single field or logical path.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Domain errors raised by the engines and surfaced through the façade.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An anonymous caller invoked a protected mutation.
    #[error("Please login")]
    AuthenticationRequired,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    NotFound { message: Cow<'static, str> },

    #[error("Credentials not match")]
    CredentialMismatch,

    /// Store failures propagate unchanged.
    #[error(transparent)]
    Store(#[from] RepoError),

    /// Hashing or signing infrastructure failed.
    #[error("credential service failure: {0}")]
    Credential(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable discriminant of [`ServiceError`] for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthenticationRequired,
    Validation,
    NotFound,
    CredentialMismatch,
    Store,
    Internal,
}

impl ServiceError {
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn validation(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::single(field, code, message))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::AuthenticationRequired => ErrorKind::AuthenticationRequired,
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::CredentialMismatch => ErrorKind::CredentialMismatch,
            ServiceError::Store(_) => ErrorKind::Store,
            ServiceError::Credential(_) | ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
