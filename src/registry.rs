//! Name-keyed store of generated types.
//!
//! One registry is one compilation session: names are unique within it, and
//! independent sessions use independent registries.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::BuildError;
use crate::target::GeneratedType;

type Entries = IndexMap<String, Rc<GeneratedType>>;

/// Write-once mapping from type name to generated type.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: Rc<RefCell<Entries>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a type by name. Safe to call before the type exists.
    pub fn lookup(&self, name: &str) -> Option<Rc<GeneratedType>> {
        self.entries.borrow().get(name).cloned()
    }

    /// Store `ty` under `name`.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::DuplicateName` if `name` is already present.
    pub fn register(&self, name: &str, ty: Rc<GeneratedType>) -> Result<(), BuildError> {
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(name) {
            return Err(BuildError::DuplicateName {
                name: name.to_string(),
            });
        }
        entries.insert(name.to_string(), ty);
        tracing::debug!(name, total = entries.len(), "registered type");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Registered types in registration order.
    pub fn types(&self) -> Vec<Rc<GeneratedType>> {
        self.entries.borrow().values().cloned().collect()
    }

    /// Evaluate the fields of every registered type, collecting the failures.
    pub fn evaluate_all(&self) -> Vec<(String, BuildError)> {
        self.types()
            .into_iter()
            .filter_map(|ty| ty.fields().err().map(|e| (ty.name().to_string(), e)))
            .collect()
    }

    /// Non-owning handle, for producers stored inside generated types.
    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            entries: Rc::downgrade(&self.entries),
        }
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Weak handle to a [`TypeRegistry`].
#[derive(Clone, Debug)]
pub struct WeakRegistry {
    entries: Weak<RefCell<Entries>>,
}

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<TypeRegistry> {
        self.entries
            .upgrade()
            .map(|entries| TypeRegistry { entries })
    }

    /// Look up a type by name; a dropped registry holds nothing.
    pub fn lookup(&self, name: &str) -> Option<Rc<GeneratedType>> {
        self.upgrade().and_then(|registry| registry.lookup(name))
    }
}
