//! Structural validation of definitions documents.

use serde_json::{json, Value};

use crate::error::{DocumentError, LoadError};

/// JSON Schema every definitions document must satisfy.
pub fn document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "schemas": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "additionalProperties": { "$ref": "#/$defs/field" }
                }
            },
            "types": {
                "type": "array",
                "items": { "$ref": "#/$defs/declaration" }
            }
        },
        "required": ["schemas"],
        "additionalProperties": false,
        "$defs": {
            "element": {
                "oneOf": [
                    { "type": "string", "minLength": 1 },
                    {
                        "type": "object",
                        "properties": { "schema": { "type": "string" } },
                        "required": ["schema"],
                        "additionalProperties": false
                    },
                    {
                        "type": "object",
                        "properties": { "ref": { "type": "string" } },
                        "required": ["ref"],
                        "additionalProperties": false
                    }
                ]
            },
            "field": {
                "oneOf": [
                    { "$ref": "#/$defs/element" },
                    {
                        "type": "array",
                        "items": { "$ref": "#/$defs/element" },
                        "minItems": 1,
                        "maxItems": 1
                    }
                ]
            },
            "typeMap": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            },
            "declaration": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "schema": { "type": "string" },
                    "class": { "type": "string" },
                    "description": { "type": "string" },
                    "exclude": { "type": "array", "items": { "type": "string" } },
                    "extend": { "$ref": "#/$defs/typeMap" },
                    "props": { "$ref": "#/$defs/typeMap" }
                },
                "required": ["name", "schema", "class"],
                "additionalProperties": false
            }
        }
    })
}

/// Validate `document` against [`document_schema`].
///
/// # Errors
///
/// Returns `LoadError::InvalidDocument` listing every violation.
pub fn validate_document(document: &Value) -> Result<(), LoadError> {
    let validator = jsonschema::validator_for(&document_schema()).map_err(|e| {
        LoadError::InvalidDocument {
            errors: vec![DocumentError {
                path: String::new(),
                message: format!("document schema is invalid: {}", e),
            }],
        }
    })?;

    let errors: Vec<DocumentError> = validator
        .iter_errors(document)
        .map(|e| DocumentError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::InvalidDocument { errors })
    }
}
