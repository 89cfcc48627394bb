//! Primitive instance kind to target scalar mapping.

use crate::error::BuildError;
use crate::types::{InstanceKind, Scalar};

/// Map a primitive instance kind to its target scalar.
///
/// Identifier, date and untyped kinds become `String`; boolean and binary
/// kinds become `Boolean`; numbers become `Int`.
///
/// # Errors
///
/// Returns `BuildError::UnknownPrimitiveKind` for any other kind.
pub fn classify(kind: &InstanceKind) -> Result<Scalar, BuildError> {
    match kind {
        InstanceKind::ObjectId
        | InstanceKind::String
        | InstanceKind::Date
        | InstanceKind::Mixed => Ok(Scalar::String),
        InstanceKind::Boolean | InstanceKind::Buffer => Ok(Scalar::Boolean),
        InstanceKind::Number => Ok(Scalar::Int),
        InstanceKind::Other(name) => Err(BuildError::UnknownPrimitiveKind { kind: name.clone() }),
    }
}
