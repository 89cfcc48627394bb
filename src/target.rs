//! Target type system: generated types, per-kind constructors and rendering.

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use serde_json::{json, Map, Value};

use crate::error::BuildError;
use crate::thunk::FieldThunk;
use crate::types::{ClassKind, FieldMap, TypeRef};

/// Constructor input: the type's identity plus its (unevaluated) fields.
#[derive(Debug)]
pub struct TypeConfig {
    pub name: String,
    pub description: Option<String>,
    pub fields: FieldThunk,
}

/// A named type produced by a constructor.
///
/// Fields are kept as a thunk and evaluated on each [`GeneratedType::fields`]
/// call, never during construction.
pub struct GeneratedType {
    name: String,
    description: Option<String>,
    kind: ClassKind,
    fields: FieldThunk,
}

impl GeneratedType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Evaluate the field map.
    ///
    /// # Errors
    ///
    /// Returns whatever error a deferred field producer raises (unresolved
    /// population references, for instance).
    pub fn fields(&self) -> Result<FieldMap, BuildError> {
        tracing::trace!(name = %self.name, "evaluating fields");
        self.fields.evaluate()
    }

    /// Expand this type and every nested type into a JSON snapshot.
    ///
    /// Each named type is expanded once, at its first occurrence; every
    /// later occurrence (including recursive ones) renders as `{"$ref": name}`.
    pub fn to_json(&self) -> Result<Value, BuildError> {
        let mut seen = HashSet::new();
        self.to_json_inner(&mut seen)
    }

    fn to_json_inner(&self, seen: &mut HashSet<String>) -> Result<Value, BuildError> {
        seen.insert(self.name.clone());
        let mut fields = Map::new();
        for (name, spec) in self.fields()? {
            let mut entry = Map::new();
            entry.insert("type".into(), type_ref_json(&spec.ty, seen)?);
            if let Some(description) = spec.description {
                entry.insert("description".into(), Value::String(description));
            }
            fields.insert(name, Value::Object(entry));
        }

        Ok(json!({
            "name": self.name,
            "description": self.description,
            "kind": self.kind.keyword(),
            "fields": fields,
        }))
    }
}

impl fmt::Debug for GeneratedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .finish()
    }
}

fn type_ref_json(ty: &TypeRef, seen: &mut HashSet<String>) -> Result<Value, BuildError> {
    match ty {
        TypeRef::Scalar(s) => Ok(Value::String(s.name().to_string())),
        TypeRef::List(inner) => Ok(json!({ "listOf": type_ref_json(inner, seen)? })),
        TypeRef::Named(named) => {
            if seen.contains(named.name()) {
                Ok(json!({ "$ref": named.name() }))
            } else {
                named.to_json_inner(seen)
            }
        }
    }
}

/// Constructor for one class kind.
pub type Constructor = fn(TypeConfig) -> GeneratedType;

/// Constructor registered for `kind`.
pub fn constructor_for(kind: ClassKind) -> Constructor {
    match kind {
        ClassKind::Object => object_type,
        ClassKind::InputObject => input_object_type,
        ClassKind::Interface => interface_type,
        ClassKind::Union => union_type,
        ClassKind::Enum => enum_type,
    }
}

fn with_kind(kind: ClassKind, config: TypeConfig) -> GeneratedType {
    GeneratedType {
        name: config.name,
        description: config.description,
        kind,
        fields: config.fields,
    }
}

fn object_type(config: TypeConfig) -> GeneratedType {
    with_kind(ClassKind::Object, config)
}

fn input_object_type(config: TypeConfig) -> GeneratedType {
    with_kind(ClassKind::InputObject, config)
}

fn interface_type(config: TypeConfig) -> GeneratedType {
    with_kind(ClassKind::Interface, config)
}

fn union_type(config: TypeConfig) -> GeneratedType {
    with_kind(ClassKind::Union, config)
}

fn enum_type(config: TypeConfig) -> GeneratedType {
    with_kind(ClassKind::Enum, config)
}

/// Render `roots` and every named type reachable from them as SDL.
///
/// Each named type is printed once, roots first, then in discovery order.
pub fn print_sdl(roots: &[Rc<GeneratedType>]) -> Result<String, BuildError> {
    let mut queue: Vec<Rc<GeneratedType>> = roots.to_vec();
    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < queue.len() {
        let ty = Rc::clone(&queue[i]);
        i += 1;
        if !seen.insert(ty.name().to_string()) {
            continue;
        }
        let fields = ty.fields()?;
        for spec in fields.values() {
            if let Some(named) = spec.ty.named_type() {
                queue.push(Rc::clone(named));
            }
        }
        blocks.push(sdl_block(&ty, &fields));
    }

    Ok(blocks.join("\n"))
}

fn sdl_block(ty: &GeneratedType, fields: &FieldMap) -> String {
    let mut out = String::new();
    if let Some(description) = ty.description() {
        let _ = writeln!(out, "\"\"\"\n{}\n\"\"\"", description);
    }
    match ty.kind() {
        ClassKind::Union => {
            let mut members: Vec<&str> = Vec::new();
            for spec in fields.values() {
                if let Some(named) = spec.ty.named_type() {
                    if !members.contains(&named.name()) {
                        members.push(named.name());
                    }
                }
            }
            let _ = writeln!(out, "union {} = {}", ty.name(), members.join(" | "));
        }
        ClassKind::Enum => {
            let _ = writeln!(out, "enum {} {{", ty.name());
            for name in fields.keys() {
                let _ = writeln!(out, "  {}", name);
            }
            out.push_str("}\n");
        }
        kind => {
            let _ = writeln!(out, "{} {} {{", kind.keyword(), ty.name());
            for (name, spec) in fields {
                if let Some(description) = &spec.description {
                    let _ = writeln!(out, "  \"{}\"", description);
                }
                let _ = writeln!(out, "  {}: {}", name, spec.ty);
            }
            out.push_str("}\n");
        }
    }
    out
}
