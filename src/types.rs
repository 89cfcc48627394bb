//! Core types for schema-to-type generation.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::BuildError;
use crate::schema::Schema;
use crate::target::GeneratedType;

/// Primitive kind tag carried by a primitive path or array caster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    ObjectId,
    String,
    Date,
    Mixed,
    Boolean,
    Buffer,
    Number,
    /// Any tag without a known mapping (e.g. `Decimal128`, `Map`).
    Other(String),
}

impl InstanceKind {
    /// Parse an instance tag. Never fails: unrecognized tags become [`InstanceKind::Other`].
    pub fn parse(s: &str) -> Self {
        match s {
            "ObjectID" | "ObjectId" => InstanceKind::ObjectId,
            "String" => InstanceKind::String,
            "Date" => InstanceKind::Date,
            "Mixed" => InstanceKind::Mixed,
            "Boolean" => InstanceKind::Boolean,
            "Buffer" => InstanceKind::Buffer,
            "Number" => InstanceKind::Number,
            other => InstanceKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstanceKind::ObjectId => "ObjectID",
            InstanceKind::String => "String",
            InstanceKind::Date => "Date",
            InstanceKind::Mixed => "Mixed",
            InstanceKind::Boolean => "Boolean",
            InstanceKind::Buffer => "Buffer",
            InstanceKind::Number => "Number",
            InstanceKind::Other(s) => s,
        }
    }
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of type the factory should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Object,
    InputObject,
    Interface,
    Union,
    Enum,
}

impl ClassKind {
    pub const ALL: [ClassKind; 5] = [
        ClassKind::Object,
        ClassKind::InputObject,
        ClassKind::Interface,
        ClassKind::Union,
        ClassKind::Enum,
    ];

    /// SDL keyword for this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            ClassKind::Object => "type",
            ClassKind::InputObject => "input",
            ClassKind::Interface => "interface",
            ClassKind::Union => "union",
            ClassKind::Enum => "enum",
        }
    }
}

impl FromStr for ClassKind {
    type Err = BuildError;

    /// Accepts short names (`object`, `input`, ...) and `GraphQL*Type` class names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" | "GraphQLObjectType" => Ok(ClassKind::Object),
            "input" | "input-object" | "input_object" | "GraphQLInputObjectType" => {
                Ok(ClassKind::InputObject)
            }
            "interface" | "GraphQLInterfaceType" => Ok(ClassKind::Interface),
            "union" | "GraphQLUnionType" => Ok(ClassKind::Union),
            "enum" | "GraphQLEnumType" => Ok(ClassKind::Enum),
            other => Err(BuildError::InvalidClassKind {
                value: other.to_string(),
            }),
        }
    }
}

/// Built-in target scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    String,
    Int,
    Float,
    Boolean,
    Id,
}

impl Scalar {
    pub fn name(&self) -> &'static str {
        match self {
            Scalar::String => "String",
            Scalar::Int => "Int",
            Scalar::Float => "Float",
            Scalar::Boolean => "Boolean",
            Scalar::Id => "ID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "String" => Some(Scalar::String),
            "Int" => Some(Scalar::Int),
            "Float" => Some(Scalar::Float),
            "Boolean" => Some(Scalar::Boolean),
            "ID" => Some(Scalar::Id),
            _ => None,
        }
    }
}

/// Type of a generated field.
#[derive(Debug, Clone)]
pub enum TypeRef {
    Scalar(Scalar),
    List(Box<TypeRef>),
    Named(Rc<GeneratedType>),
}

impl TypeRef {
    /// List container wrapping `inner`.
    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    pub fn named(ty: &Rc<GeneratedType>) -> Self {
        TypeRef::Named(Rc::clone(ty))
    }

    /// The innermost named type, if any.
    pub fn named_type(&self) -> Option<&Rc<GeneratedType>> {
        match self {
            TypeRef::Scalar(_) => None,
            TypeRef::List(inner) => inner.named_type(),
            TypeRef::Named(ty) => Some(ty),
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Scalar(a), TypeRef::Scalar(b)) => a == b,
            (TypeRef::List(a), TypeRef::List(b)) => a == b,
            (TypeRef::Named(a), TypeRef::Named(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Scalar> for TypeRef {
    fn from(scalar: Scalar) -> Self {
        TypeRef::Scalar(scalar)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(s) => f.write_str(s.name()),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::Named(ty) => f.write_str(ty.name()),
        }
    }
}

/// One entry of a field map.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub ty: TypeRef,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered field name to spec mapping.
pub type FieldMap = IndexMap<String, FieldSpec>;

/// Producer of a field map, evaluated on demand.
pub type FieldMapFn = Rc<dyn Fn() -> Result<FieldMap, BuildError>>;

/// Either a ready field map or a deferred producer of one.
#[derive(Clone)]
pub enum FieldSource {
    Map(FieldMap),
    Deferred(FieldMapFn),
}

impl FieldSource {
    pub fn deferred(f: impl Fn() -> Result<FieldMap, BuildError> + 'static) -> Self {
        FieldSource::Deferred(Rc::new(f))
    }

    pub fn resolve(&self) -> Result<FieldMap, BuildError> {
        match self {
            FieldSource::Map(map) => Ok(map.clone()),
            FieldSource::Deferred(f) => f(),
        }
    }
}

impl Default for FieldSource {
    fn default() -> Self {
        FieldSource::Map(FieldMap::new())
    }
}

impl From<FieldMap> for FieldSource {
    fn from(map: FieldMap) -> Self {
        FieldSource::Map(map)
    }
}

impl fmt::Debug for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Map(map) => f.debug_tuple("Map").field(map).finish(),
            FieldSource::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Request to build one named type from a schema.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub name: String,
    pub description: Option<String>,
    pub class_kind: ClassKind,
    pub schema: Rc<Schema>,
    /// Field names skipped at this level and every nested level.
    pub exclude: BTreeSet<String>,
    pub extend: FieldSource,
    pub props: FieldSource,
}

impl BuildRequest {
    /// Create a request with empty `exclude`, `extend` and `props`.
    pub fn new(name: impl Into<String>, class_kind: ClassKind, schema: Rc<Schema>) -> Self {
        Self {
            name: name.into(),
            description: None,
            class_kind,
            schema,
            exclude: BTreeSet::new(),
            extend: FieldSource::default(),
            props: FieldSource::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn extend(mut self, fields: impl Into<FieldSource>) -> Self {
        self.extend = fields.into();
        self
    }

    pub fn props(mut self, fields: impl Into<FieldSource>) -> Self {
        self.props = fields.into();
        self
    }
}
