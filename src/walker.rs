//! Schema walking: classify each path and record its field in the thunk.

use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use crate::assembler::build_within;
use crate::classify::classify;
use crate::error::BuildError;
use crate::registry::TypeRegistry;
use crate::schema::{Caster, PathDescriptor, Schema, SchemaLink};
use crate::target::GeneratedType;
use crate::thunk::FieldThunk;
use crate::types::{BuildRequest, FieldSpec, TypeRef};

/// Write-once handle to the type under construction.
pub(crate) type SelfCell = Rc<OnceCell<Weak<GeneratedType>>>;

/// Types (and their schemas) enclosing the one being built, outermost first.
pub(crate) type Lineage<'a> = [(&'a str, &'a Rc<Schema>)];

/// Name of the type generated for sub-field `field` of type `parent`.
pub fn sub_field_name(parent: &str, field: &str) -> String {
    format!("{}_{}", parent, field)
}

/// Description of the type generated for sub-field `field` of type `parent`.
pub fn sub_field_description(parent: &str, field: &str) -> String {
    format!("{}'s '{}' sub-field", parent, field)
}

/// Populate `thunk` with one field per non-excluded path of `request.schema`.
///
/// Embedded and array-of-embedded paths recursively build `Parent_field`
/// types in `registry`, unless they embed `request.schema` itself; those
/// read `self_cell` at evaluation time instead. Embedding any schema of
/// `ancestors` is an `EmbeddingCycle`.
pub(crate) fn walk(
    request: &BuildRequest,
    registry: &TypeRegistry,
    thunk: &mut FieldThunk,
    self_cell: &SelfCell,
    ancestors: &Lineage<'_>,
) -> Result<(), BuildError> {
    for (field, descriptor) in request.schema.paths() {
        if request.exclude.contains(field) {
            continue;
        }

        if let Some(reference) = descriptor.reference() {
            tracing::trace!(
                type_name = %request.name,
                field = %field,
                reference,
                "population field"
            );
            let lookup = registry.downgrade();
            let reference = reference.to_string();
            let type_name = request.name.clone();
            thunk.set_field_deferred(field.as_str(), move || {
                let ty = lookup.lookup(&reference).ok_or_else(|| {
                    BuildError::UnresolvedReference {
                        reference: reference.clone(),
                        type_name: type_name.clone(),
                    }
                })?;
                Ok(FieldSpec::new(TypeRef::Named(ty)))
            });
            continue;
        }

        match descriptor {
            PathDescriptor::Embedded(link) => {
                tracing::trace!(type_name = %request.name, field = %field, "embedded field");
                if link.points_to(&request.schema) {
                    let cell = Rc::clone(self_cell);
                    let type_name = request.name.clone();
                    thunk.set_field_deferred(field.as_str(), move || {
                        Ok(FieldSpec::new(TypeRef::Named(read_self(&cell, &type_name)?)))
                    });
                } else {
                    let sub = build_sub_type(request, registry, field, link, ancestors)?;
                    thunk.set_field(field.as_str(), FieldSpec::new(TypeRef::Named(sub)));
                }
            }
            PathDescriptor::Array(Caster::Schema(link)) => {
                tracing::trace!(
                    type_name = %request.name,
                    field = %field,
                    "array of embedded field"
                );
                if link.points_to(&request.schema) {
                    let cell = Rc::clone(self_cell);
                    let type_name = request.name.clone();
                    thunk.set_field_deferred(field.as_str(), move || {
                        let me = read_self(&cell, &type_name)?;
                        Ok(FieldSpec::new(TypeRef::list(TypeRef::Named(me))))
                    });
                } else {
                    let sub = build_sub_type(request, registry, field, link, ancestors)?;
                    thunk.set_field(
                        field.as_str(),
                        FieldSpec::new(TypeRef::list(TypeRef::Named(sub))),
                    );
                }
            }
            PathDescriptor::Array(Caster::Primitive(kind)) => {
                tracing::trace!(
                    type_name = %request.name,
                    field = %field,
                    %kind,
                    "primitive array field"
                );
                let element = classify(kind)?;
                thunk.set_field(
                    field.as_str(),
                    FieldSpec::new(TypeRef::list(TypeRef::Scalar(element))),
                );
            }
            PathDescriptor::Primitive(kind) => {
                tracing::trace!(
                    type_name = %request.name,
                    field = %field,
                    %kind,
                    "primitive field"
                );
                thunk.set_field(field.as_str(), FieldSpec::new(classify(kind)?));
            }
            // Handled above through `descriptor.reference()`.
            PathDescriptor::Reference(_) | PathDescriptor::Array(Caster::Reference(_)) => {}
        }
    }
    Ok(())
}

/// Build the `Parent_field` type for an embedded schema other than the root.
///
/// The sub-request inherits the parent's class kind and exclusions.
fn build_sub_type(
    request: &BuildRequest,
    registry: &TypeRegistry,
    field: &str,
    link: &SchemaLink,
    ancestors: &Lineage<'_>,
) -> Result<Rc<GeneratedType>, BuildError> {
    if let Some(pos) = ancestors
        .iter()
        .position(|(_, schema)| link.points_to(schema))
    {
        let mut path: Vec<String> = ancestors[pos..]
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        path.push(request.name.clone());
        path.push(sub_field_name(&request.name, field));
        return Err(BuildError::EmbeddingCycle { path });
    }

    let schema = link
        .upgrade()
        .ok_or(BuildError::MissingOption { option: "schema" })?;
    let mut sub = BuildRequest::new(
        sub_field_name(&request.name, field),
        request.class_kind,
        schema,
    )
    .description(sub_field_description(&request.name, field));
    sub.exclude = request.exclude.clone();

    let mut lineage = ancestors.to_vec();
    lineage.push((request.name.as_str(), &request.schema));
    build_within(registry, &sub, &lineage)
}

fn read_self(cell: &SelfCell, type_name: &str) -> Result<Rc<GeneratedType>, BuildError> {
    cell.get()
        .and_then(Weak::upgrade)
        .ok_or_else(|| BuildError::SelfTypeUnavailable {
            type_name: type_name.to_string(),
        })
}
