//! Error types for schema extraction and expression compilation

use thiserror::Error;

use crate::types::{IndexKind, KeyType};

/// Errors that can occur while extracting a schema or compiling expressions
#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("Too many {kind} secondary indexes: limit is {limit}")]
    TooManyIndexes { kind: IndexKind, limit: usize },

    #[error("Record '{0}' has no hash key field")]
    MissingHashKey(String),

    #[error("Duplicate {role} key: '{first}' and '{second}' both claim the role")]
    DuplicateKeyRole {
        role: KeyType,
        first: String,
        second: String,
    },

    #[error("Unknown attribute type '{kind}' on field '{field}'")]
    UnknownAttributeType { field: String, kind: String },

    #[error("Malformed annotation '{annotation}' on field '{field}'")]
    MalformedAnnotation { field: String, annotation: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Condition on '{0}' has a null value")]
    NilValue(String),

    #[error("Update expression is empty")]
    EmptyUpdate,

    #[error("Field '{0}' is assigned more than once in the same update")]
    DuplicateAssignment(String),

    #[error("Invalid item shape: {0}")]
    InvalidItemShape(String),

    #[error("Index not declared by schema: {0}")]
    UnknownIndex(String),

    #[error("Key mismatch: expected '{expected}', got '{found}'")]
    KeyMismatch { expected: String, found: String },

    #[error("Schema has no range key")]
    MissingRangeKey,

    #[error("No attribute type declared for key field '{0}'")]
    MissingAttributeType(String),

    #[error("Field '{field}' is declared {expected} but its value resolves to {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BlueprintError {
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    pub fn invalid_item_shape(msg: impl Into<String>) -> Self {
        Self::InvalidItemShape(msg.into())
    }

    pub fn invalid_condition(msg: impl Into<String>) -> Self {
        Self::InvalidCondition(msg.into())
    }

    pub fn key_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::KeyMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn malformed(field: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self::MalformedAnnotation {
            field: field.into(),
            annotation: annotation.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BlueprintError>;
