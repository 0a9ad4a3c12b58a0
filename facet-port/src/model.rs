//! Model identity: the trait every portable model implements, and the
//! type handle used to ask for one.

use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

use facet::Shape;

/// A model that carries its own unique identifier.
///
/// Only models can be ported: the identifier is what gets persisted in place
/// of the model, and what the [`Resolver`](crate::Resolver) turns back into
/// a live instance.
pub trait Unique: Any + Send + Sync + fmt::Debug {
    /// The identifier this model is stored under.
    fn id(&self) -> &str;
}

/// A materialized, shareable model instance.
pub type Model = Arc<dyn Unique>;

/// Runtime handle for a concrete model type.
///
/// Two handles are equal when they name the same Rust type.
#[derive(Clone, Copy)]
pub struct ModelType {
    type_id: TypeId,
    name: &'static str,
}

impl ModelType {
    /// Handle for the model type `T`.
    pub fn of<T: Unique>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Handle for the model type reflected by `shape`.
    pub fn from_shape(shape: &'static Shape) -> Self {
        Self {
            type_id: shape.id.get(),
            name: shape.type_identifier,
        }
    }

    /// The [`TypeId`] of the model type.
    pub const fn type_id(self) -> TypeId {
        self.type_id
    }

    /// The type name, for diagnostics. Handles built from a shape carry the
    /// short reflected name.
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Whether `model` is an instance of this type.
    pub fn is_type_of(self, model: &dyn Unique) -> bool {
        let model: &dyn Any = model;
        model.type_id() == self.type_id
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModelType {}

impl Hash for ModelType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelType({})", self.name)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Downcast a [`Model`] to its concrete type, handing the model back on mismatch.
pub fn downcast<T: Unique>(model: Model) -> Result<Arc<T>, Model> {
    let any: Arc<dyn Any + Send + Sync> = model.clone();
    any.downcast::<T>().map_err(|_| model)
}
