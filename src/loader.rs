//! Definitions document loading.
//!
//! Handles loading definitions from files, strings, and HTTP URLs, turning
//! named schema descriptions into [`Schema`] values and type declarations
//! into [`BuildRequest`]s.

use std::path::Path;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::assembler::build;
use crate::error::{BuildError, DocumentError, LoadError};
use crate::registry::{TypeRegistry, WeakRegistry};
use crate::schema::{Caster, PathDescriptor, Schema, SchemaLink};
use crate::target::GeneratedType;
use crate::types::{
    BuildRequest, ClassKind, FieldMap, FieldSource, FieldSpec, InstanceKind, Scalar, TypeRef,
};
use crate::validator::validate_document;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Document {
    schemas: IndexMap<String, IndexMap<String, FieldDef>>,
    #[serde(default)]
    types: Vec<TypeDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FieldDef {
    Kind(String),
    Embedded {
        schema: String,
    },
    Reference {
        #[serde(rename = "ref")]
        reference: String,
    },
    Array(Vec<FieldDef>),
}

/// One `types` entry of a definitions document.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    /// Name of the schema in the document's `schemas` section.
    pub schema: String,
    pub class: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Field name to type expression.
    #[serde(default)]
    pub extend: IndexMap<String, String>,
    #[serde(default)]
    pub props: IndexMap<String, String>,
}

/// Loaded definitions: materialized schemas plus the declared types.
#[derive(Debug)]
pub struct Definitions {
    schemas: IndexMap<String, Rc<Schema>>,
    types: Vec<TypeDeclaration>,
}

impl Definitions {
    /// Validate and materialize a parsed definitions document.
    pub fn from_value(document: &Value) -> Result<Self, LoadError> {
        validate_document(document)?;
        let parsed: Document = serde_json::from_value(document.clone())
            .map_err(|source| LoadError::InvalidJson { source })?;

        let mut built = IndexMap::new();
        for name in parsed.schemas.keys() {
            materialize(name, &parsed.schemas, &mut built, &mut Vec::new())?;
        }
        // Document order rather than dependency order.
        let schemas = parsed
            .schemas
            .keys()
            .filter_map(|name| built.get(name).map(|s| (name.clone(), Rc::clone(s))))
            .collect();

        Ok(Self {
            schemas,
            types: parsed.types,
        })
    }

    pub fn schema(&self, name: &str) -> Option<&Rc<Schema>> {
        self.schemas.get(name)
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn types(&self) -> &[TypeDeclaration] {
        &self.types
    }

    /// Turn a declaration into a build request bound to `registry`.
    ///
    /// Named types in `extend`/`props` are looked up in `registry` when the
    /// fields are evaluated, not now.
    pub fn request(
        &self,
        declaration: &TypeDeclaration,
        registry: &TypeRegistry,
    ) -> Result<BuildRequest, LoadError> {
        let schema = self
            .schema(&declaration.schema)
            .ok_or_else(|| LoadError::UnknownSchema {
                schema: declaration.schema.clone(),
                context: format!("type \"{}\"", declaration.name),
            })?;
        let class_kind: ClassKind = declaration.class.parse()?;

        let mut request = BuildRequest::new(&declaration.name, class_kind, Rc::clone(schema))
            .exclude(declaration.exclude.iter().cloned())
            .extend(type_map_source(&declaration.extend, &declaration.name, registry)?)
            .props(type_map_source(&declaration.props, &declaration.name, registry)?);
        request.description = declaration.description.clone();
        Ok(request)
    }

    /// Build every declared type, in document order.
    pub fn build_all(
        &self,
        registry: &TypeRegistry,
    ) -> Result<Vec<Rc<GeneratedType>>, LoadError> {
        let mut generated = Vec::with_capacity(self.types.len());
        for declaration in &self.types {
            let request = self.request(declaration, registry)?;
            generated.push(build(registry, &request)?);
        }
        Ok(generated)
    }
}

/// Embedded schema target, resolved before the owning schema is allocated.
enum Target {
    Itself,
    Other(Rc<Schema>),
}

impl Target {
    fn link(&self, me: &Weak<Schema>) -> SchemaLink {
        match self {
            Target::Itself => SchemaLink::from(me),
            Target::Other(schema) => SchemaLink::from(schema),
        }
    }
}

enum PendingPath {
    Primitive(InstanceKind),
    Embedded(Target),
    Reference(String),
    ArrayPrimitive(InstanceKind),
    ArrayEmbedded(Target),
    ArrayReference(String),
}

impl PendingPath {
    fn descriptor(&self, me: &Weak<Schema>) -> PathDescriptor {
        match self {
            PendingPath::Primitive(kind) => PathDescriptor::Primitive(kind.clone()),
            PendingPath::Embedded(target) => PathDescriptor::Embedded(target.link(me)),
            PendingPath::Reference(name) => PathDescriptor::Reference(name.clone()),
            PendingPath::ArrayPrimitive(kind) => {
                PathDescriptor::Array(Caster::Primitive(kind.clone()))
            }
            PendingPath::ArrayEmbedded(target) => {
                PathDescriptor::Array(Caster::Schema(target.link(me)))
            }
            PendingPath::ArrayReference(name) => {
                PathDescriptor::Array(Caster::Reference(name.clone()))
            }
        }
    }
}

type RawSchemas = IndexMap<String, IndexMap<String, FieldDef>>;

/// Materialize schema `name`, first materializing every schema it embeds.
///
/// `stack` holds the chain of schemas currently being materialized; meeting
/// one of them again is an embedding cycle (self-embedding excepted).
fn materialize(
    name: &str,
    raw: &RawSchemas,
    built: &mut IndexMap<String, Rc<Schema>>,
    stack: &mut Vec<String>,
) -> Result<Rc<Schema>, LoadError> {
    if let Some(schema) = built.get(name) {
        return Ok(Rc::clone(schema));
    }
    if let Some(pos) = stack.iter().position(|n| n == name) {
        let mut path = stack[pos..].to_vec();
        path.push(name.to_string());
        return Err(LoadError::EmbeddingCycle { path });
    }
    let fields = raw.get(name).ok_or_else(|| LoadError::UnknownSchema {
        schema: name.to_string(),
        context: "document".to_string(),
    })?;

    stack.push(name.to_string());
    let mut pending = Vec::with_capacity(fields.len());
    for (field, def) in fields {
        let context = format!("/schemas/{}/{}", name, field);
        let path = match def {
            FieldDef::Array(elements) => match elements.as_slice() {
                [FieldDef::Kind(kind)] => PendingPath::ArrayPrimitive(InstanceKind::parse(kind)),
                [FieldDef::Embedded { schema }] => {
                    PendingPath::ArrayEmbedded(target(schema, name, &context, raw, built, stack)?)
                }
                [FieldDef::Reference { reference }] => {
                    PendingPath::ArrayReference(reference.clone())
                }
                _ => {
                    return Err(LoadError::InvalidDocument {
                        errors: vec![DocumentError {
                            path: context,
                            message: "array fields take exactly one non-array element".into(),
                        }],
                    })
                }
            },
            FieldDef::Kind(kind) => PendingPath::Primitive(InstanceKind::parse(kind)),
            FieldDef::Embedded { schema } => {
                PendingPath::Embedded(target(schema, name, &context, raw, built, stack)?)
            }
            FieldDef::Reference { reference } => PendingPath::Reference(reference.clone()),
        };
        pending.push((field.clone(), path));
    }
    stack.pop();

    let schema = Schema::cyclic(|me| {
        pending
            .iter()
            .fold(Schema::builder(), |builder, (field, path)| {
                builder.path(field.clone(), path.descriptor(me))
            })
    });
    tracing::debug!(schema = name, paths = schema.paths().len(), "materialized schema");
    built.insert(name.to_string(), Rc::clone(&schema));
    Ok(schema)
}

fn target(
    schema: &str,
    owner: &str,
    context: &str,
    raw: &RawSchemas,
    built: &mut IndexMap<String, Rc<Schema>>,
    stack: &mut Vec<String>,
) -> Result<Target, LoadError> {
    if schema == owner {
        return Ok(Target::Itself);
    }
    if !raw.contains_key(schema) {
        return Err(LoadError::UnknownSchema {
            schema: schema.to_string(),
            context: context.to_string(),
        });
    }
    materialize(schema, raw, built, stack).map(Target::Other)
}

/// Type expression used in `extend`/`props`: a scalar, `[expr]`, or a type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Scalar(Scalar),
    List(Box<TypeExpr>),
    Named(String),
}

impl TypeExpr {
    pub fn parse(expr: &str) -> Result<Self, LoadError> {
        let trimmed = expr.trim();
        if let Some(inner) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Ok(TypeExpr::List(Box::new(TypeExpr::parse(inner).map_err(
                |_| LoadError::InvalidTypeExpr {
                    expr: expr.to_string(),
                },
            )?)));
        }
        if let Some(scalar) = Scalar::parse(trimmed) {
            return Ok(TypeExpr::Scalar(scalar));
        }
        if is_type_name(trimmed) {
            return Ok(TypeExpr::Named(trimmed.to_string()));
        }
        Err(LoadError::InvalidTypeExpr {
            expr: expr.to_string(),
        })
    }

    /// Resolve against `registry`; `context` names the type being extended.
    pub fn resolve(&self, registry: &WeakRegistry, context: &str) -> Result<TypeRef, BuildError> {
        match self {
            TypeExpr::Scalar(scalar) => Ok(TypeRef::Scalar(*scalar)),
            TypeExpr::List(inner) => Ok(TypeRef::list(inner.resolve(registry, context)?)),
            TypeExpr::Named(name) => registry
                .lookup(name)
                .map(TypeRef::Named)
                .ok_or_else(|| BuildError::UnresolvedReference {
                    reference: name.clone(),
                    type_name: context.to_string(),
                }),
        }
    }
}

fn is_type_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn type_map_source(
    map: &IndexMap<String, String>,
    type_name: &str,
    registry: &TypeRegistry,
) -> Result<FieldSource, LoadError> {
    if map.is_empty() {
        return Ok(FieldSource::default());
    }
    let exprs = map
        .iter()
        .map(|(field, expr)| TypeExpr::parse(expr).map(|parsed| (field.clone(), parsed)))
        .collect::<Result<Vec<_>, LoadError>>()?;
    let lookup = registry.downgrade();
    let type_name = type_name.to_string();

    Ok(FieldSource::deferred(move || {
        let mut fields = FieldMap::new();
        for (field, expr) in &exprs {
            fields.insert(field.clone(), FieldSpec::new(expr.resolve(&lookup, &type_name)?));
        }
        Ok(fields)
    }))
}

/// Load definitions from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// `LoadError::InvalidJson` if it isn't valid JSON, or a document error.
pub fn load_definitions(path: &Path) -> Result<Definitions, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_definitions_str(&content)
}

/// Load definitions from a JSON string.
pub fn load_definitions_str(content: &str) -> Result<Definitions, LoadError> {
    let document: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    Definitions::from_value(&document)
}

/// Load definitions from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
pub fn load_definitions_url(url: &str) -> Result<Definitions, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let document: Value = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network_error)?;

    Definitions::from_value(&document)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load definitions from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
pub fn load_definitions_auto(source: &str) -> Result<Definitions, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_definitions_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_definitions(Path::new(source))
    }
}
