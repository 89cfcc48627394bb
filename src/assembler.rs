//! Type assembly: the public entry point of generation.

use std::rc::Rc;

use crate::error::BuildError;
use crate::registry::TypeRegistry;
use crate::target::{constructor_for, GeneratedType, TypeConfig};
use crate::thunk::FieldThunk;
use crate::types::BuildRequest;
use crate::walker::{walk, Lineage, SelfCell};

/// Build the type described by `request`, or return the one already
/// registered under `request.name`.
///
/// Fields are generated from the schema, then merged with `request.extend`
/// and finally `request.props` (later wins). Nested `Parent_field` types are
/// built and registered along the way.
///
/// # Errors
///
/// Validation errors (`MissingOption`) are returned before the registry is
/// touched. `UnknownPrimitiveKind`, `EmbeddingCycle` and `DuplicateName`
/// surface here; errors of deferred fields (population references) surface
/// from [`GeneratedType::fields`].
pub fn build(
    registry: &TypeRegistry,
    request: &BuildRequest,
) -> Result<Rc<GeneratedType>, BuildError> {
    build_within(registry, request, &[])
}

/// [`build`] for a type nested under `ancestors` (outermost first).
pub(crate) fn build_within(
    registry: &TypeRegistry,
    request: &BuildRequest,
    ancestors: &Lineage<'_>,
) -> Result<Rc<GeneratedType>, BuildError> {
    validate(request)?;

    if let Some(existing) = registry.lookup(&request.name) {
        tracing::debug!(name = %request.name, "type already generated");
        return Ok(existing);
    }

    tracing::debug!(
        name = %request.name,
        kind = request.class_kind.keyword(),
        paths = request.schema.paths().len(),
        "generating type"
    );

    let self_cell = SelfCell::default();
    let mut fields = FieldThunk::new();
    walk(request, registry, &mut fields, &self_cell, ancestors)?;
    fields.extend(request.extend.clone());
    fields.extend(request.props.clone());

    let construct = constructor_for(request.class_kind);
    let generated = Rc::new(construct(TypeConfig {
        name: request.name.clone(),
        description: request.description.clone(),
        fields,
    }));
    if self_cell.set(Rc::downgrade(&generated)).is_err() {
        tracing::warn!(name = %request.name, "self type cell was already populated");
    }

    registry.register(&request.name, Rc::clone(&generated))?;
    Ok(generated)
}

fn validate(request: &BuildRequest) -> Result<(), BuildError> {
    if request.schema.is_empty() {
        return Err(BuildError::MissingOption { option: "schema" });
    }
    if request.name.is_empty() {
        return Err(BuildError::MissingOption { option: "name" });
    }
    Ok(())
}
