//! Document schema to GraphQL type generation.
//!
//! Derives named API types from a document schema description: primitive
//! paths map to scalars, embedded sub-schemas become nested `Parent_field`
//! types, arrays become lists, and population references resolve by name
//! against the types already generated in the same [`TypeRegistry`].
//!
//! # Example
//!
//! ```
//! use docschema_graphql::{
//!     build, BuildRequest, ClassKind, InstanceKind, Scalar, Schema, TypeRef, TypeRegistry,
//! };
//!
//! let schema = Schema::builder()
//!     .primitive("name", InstanceKind::String)
//!     .primitive("age", InstanceKind::Number)
//!     .primitive("password", InstanceKind::String)
//!     .build();
//!
//! let registry = TypeRegistry::new();
//! let request = BuildRequest::new("Animal", ClassKind::Object, schema)
//!     .description("Type which represents an animal")
//!     .exclude(["password"]);
//! let animal = build(&registry, &request).unwrap();
//!
//! let fields = animal.fields().unwrap();
//! assert_eq!(fields["name"].ty, TypeRef::Scalar(Scalar::String));
//! assert_eq!(fields["age"].ty, TypeRef::Scalar(Scalar::Int));
//! assert!(fields.get("password").is_none());
//! ```
//!
//! # Primitive mapping
//!
//! | Instance kind | Scalar |
//! |---------------|--------|
//! | `ObjectID`, `String`, `Date`, `Mixed` | `String` |
//! | `Boolean`, `Buffer` | `Boolean` |
//! | `Number` | `Int` |
//! | anything else | error |
//!
//! # Self reference
//!
//! A schema that embeds itself (see [`Schema::cyclic`]) produces a field
//! whose type is the generated type itself. Field maps are therefore lazy:
//! [`GeneratedType::fields`] evaluates them on demand, after construction.

mod assembler;
mod classify;
mod error;
mod loader;
mod registry;
mod schema;
mod target;
mod thunk;
mod types;
mod validator;
mod walker;

pub use assembler::build;
pub use classify::classify;
pub use error::{BuildError, DocumentError, LoadError};
pub use loader::{
    is_url, load_definitions, load_definitions_auto, load_definitions_str, Definitions,
    TypeDeclaration, TypeExpr,
};
pub use registry::{TypeRegistry, WeakRegistry};
pub use schema::{Caster, PathDescriptor, Schema, SchemaBuilder, SchemaLink};
pub use target::{constructor_for, print_sdl, Constructor, GeneratedType, TypeConfig};
pub use thunk::FieldThunk;
pub use types::{
    BuildRequest, ClassKind, FieldMap, FieldMapFn, FieldSource, FieldSpec, InstanceKind, Scalar,
    TypeRef,
};
pub use validator::{document_schema, validate_document};
pub use walker::{sub_field_description, sub_field_name};

#[cfg(feature = "remote")]
pub use loader::load_definitions_url;
