//! Error types for type generation and definitions loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a type or evaluating its fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("`{option}` option *should* be provided")]
    MissingOption { option: &'static str },

    #[error("invalid `class` option specified: \"{value}\"")]
    InvalidClassKind { value: String },

    #[error("unknown primitive object instance name: \"{kind}\"")]
    UnknownPrimitiveKind { kind: String },

    #[error("attempt to create type with already existing name \"{name}\"")]
    DuplicateName { name: String },

    #[error(
        "type with name \"{reference}\" doesn't exist, but was specified as population reference \
         (while creating \"{type_name}\")"
    )]
    UnresolvedReference {
        reference: String,
        type_name: String,
    },

    #[error("fields of \"{type_name}\" were evaluated before the type itself was constructed")]
    SelfTypeUnavailable { type_name: String },

    #[error("embedded schema cycle while generating types: {}", .path.join(" -> "))]
    EmbeddingCycle { path: Vec<String> },
}

impl BuildError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a definitions document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid definitions document ({} error(s))", .errors.len())]
    InvalidDocument { errors: Vec<DocumentError> },

    #[error("unknown schema \"{schema}\" referenced from {context}")]
    UnknownSchema { schema: String, context: String },

    #[error("embedding cycle between schemas: {}", .path.join(" -> "))]
    EmbeddingCycle { path: Vec<String> },

    #[error("invalid type expression \"{expr}\"")]
    InvalidTypeExpr { expr: String },

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::Build(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Single structural error in a definitions document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentError {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
