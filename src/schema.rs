//! Document schema introspection.
//!
//! A [`Schema`] is an ordered mapping from field name to [`PathDescriptor`].
//! Schemas are shared as `Rc<Schema>`; two descriptors refer to the "same"
//! schema when they point at the same allocation. A schema that embeds itself
//! is built with [`Schema::cyclic`], which hands the builder a weak handle to
//! the schema under construction.

use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::types::InstanceKind;

/// Field descriptors of one document schema.
#[derive(Debug, Default)]
pub struct Schema {
    paths: IndexMap<String, PathDescriptor>,
}

impl Schema {
    /// Start building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Build a schema that may embed itself through the weak handle passed to `f`.
    pub fn cyclic(f: impl FnOnce(&Weak<Schema>) -> SchemaBuilder) -> Rc<Schema> {
        Rc::new_cyclic(|me| f(me).into_schema())
    }

    /// Field name to descriptor mapping, in declaration order.
    pub fn paths(&self) -> &IndexMap<String, PathDescriptor> {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Handle to an embedded schema.
#[derive(Debug, Clone)]
pub enum SchemaLink {
    Shared(Rc<Schema>),
    /// Back-edge to a schema still being built, or to an ancestor.
    Cyclic(Weak<Schema>),
}

impl SchemaLink {
    /// Whether this link designates `schema` itself.
    pub fn points_to(&self, schema: &Rc<Schema>) -> bool {
        match self {
            SchemaLink::Shared(rc) => Rc::ptr_eq(rc, schema),
            SchemaLink::Cyclic(weak) => std::ptr::eq(weak.as_ptr(), Rc::as_ptr(schema)),
        }
    }

    /// Strong handle to the linked schema, if it is still alive.
    pub fn upgrade(&self) -> Option<Rc<Schema>> {
        match self {
            SchemaLink::Shared(rc) => Some(Rc::clone(rc)),
            SchemaLink::Cyclic(weak) => weak.upgrade(),
        }
    }
}

impl From<Rc<Schema>> for SchemaLink {
    fn from(schema: Rc<Schema>) -> Self {
        SchemaLink::Shared(schema)
    }
}

impl From<&Rc<Schema>> for SchemaLink {
    fn from(schema: &Rc<Schema>) -> Self {
        SchemaLink::Shared(Rc::clone(schema))
    }
}

impl From<&Weak<Schema>> for SchemaLink {
    fn from(schema: &Weak<Schema>) -> Self {
        SchemaLink::Cyclic(Weak::clone(schema))
    }
}

/// Per-field metadata.
#[derive(Debug, Clone)]
pub enum PathDescriptor {
    Primitive(InstanceKind),
    Embedded(SchemaLink),
    Array(Caster),
    /// Population reference to another named type.
    Reference(String),
}

impl PathDescriptor {
    /// Name of the referenced type when this is a population path.
    ///
    /// Arrays whose caster is a reference count as population paths too.
    pub fn reference(&self) -> Option<&str> {
        match self {
            PathDescriptor::Reference(name) | PathDescriptor::Array(Caster::Reference(name)) => {
                Some(name)
            }
            _ => None,
        }
    }
}

/// Element description of an array path.
#[derive(Debug, Clone)]
pub enum Caster {
    Primitive(InstanceKind),
    Schema(SchemaLink),
    Reference(String),
}

/// Incremental schema construction.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    paths: IndexMap<String, PathDescriptor>,
}

impl SchemaBuilder {
    pub fn path(mut self, name: impl Into<String>, descriptor: PathDescriptor) -> Self {
        self.paths.insert(name.into(), descriptor);
        self
    }

    pub fn primitive(self, name: impl Into<String>, kind: InstanceKind) -> Self {
        self.path(name, PathDescriptor::Primitive(kind))
    }

    pub fn embedded(self, name: impl Into<String>, schema: impl Into<SchemaLink>) -> Self {
        self.path(name, PathDescriptor::Embedded(schema.into()))
    }

    pub fn reference(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.path(name, PathDescriptor::Reference(type_name.into()))
    }

    pub fn array_of(self, name: impl Into<String>, kind: InstanceKind) -> Self {
        self.path(name, PathDescriptor::Array(Caster::Primitive(kind)))
    }

    pub fn array_of_schema(self, name: impl Into<String>, schema: impl Into<SchemaLink>) -> Self {
        self.path(name, PathDescriptor::Array(Caster::Schema(schema.into())))
    }

    pub fn array_of_refs(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.path(name, PathDescriptor::Array(Caster::Reference(type_name.into())))
    }

    pub fn into_schema(self) -> Schema {
        Schema { paths: self.paths }
    }

    pub fn build(self) -> Rc<Schema> {
        Rc::new(self.into_schema())
    }
}
