//! Lazily evaluated field maps.
//!
//! A [`FieldThunk`] records field assignments in order and only produces the
//! merged map when [`FieldThunk::evaluate`] is called. Deferred producers run
//! on every evaluation, so a field may depend on a type that does not exist
//! yet when the assignment is recorded (the enclosing type itself, or a
//! population reference registered later).

use std::fmt;

use crate::error::BuildError;
use crate::types::{FieldMap, FieldSource, FieldSpec};

type FieldFn = Box<dyn Fn() -> Result<FieldSpec, BuildError>>;

enum Layer {
    Field(String, FieldSpec),
    Deferred(String, FieldFn),
    Extend(FieldSource),
}

/// Ordered, deferred composition of field assignments.
#[derive(Default)]
pub struct FieldThunk {
    layers: Vec<Layer>,
}

impl FieldThunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to a fixed spec.
    pub fn set_field(&mut self, name: impl Into<String>, spec: FieldSpec) {
        self.layers.push(Layer::Field(name.into(), spec));
    }

    /// Set `name` to whatever `producer` returns at evaluation time.
    pub fn set_field_deferred(
        &mut self,
        name: impl Into<String>,
        producer: impl Fn() -> Result<FieldSpec, BuildError> + 'static,
    ) {
        self.layers
            .push(Layer::Deferred(name.into(), Box::new(producer)));
    }

    /// Merge a whole field map (or a producer of one); later keys win.
    pub fn extend(&mut self, fields: impl Into<FieldSource>) {
        self.layers.push(Layer::Extend(fields.into()));
    }

    /// Number of recorded assignments.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Compose every recorded assignment, in order, into one field map.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a deferred producer.
    pub fn evaluate(&self) -> Result<FieldMap, BuildError> {
        let mut fields = FieldMap::new();
        for layer in &self.layers {
            match layer {
                Layer::Field(name, spec) => {
                    fields.insert(name.clone(), spec.clone());
                }
                Layer::Deferred(name, producer) => {
                    fields.insert(name.clone(), producer()?);
                }
                Layer::Extend(source) => {
                    fields.extend(source.resolve()?);
                }
            }
        }
        Ok(fields)
    }
}

impl fmt::Debug for FieldThunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldThunk")
            .field("layers", &self.layers.len())
            .finish()
    }
}
