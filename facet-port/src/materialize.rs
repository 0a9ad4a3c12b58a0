//! Building the output container from negotiated entries.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use indexmap::IndexMap;

use crate::{
    EntryRef, Model, ModelType, Negotiated, PortError, Resolver, TargetShape, Unique, downcast,
};

/// A fully resolved ported field.
#[derive(Debug, Clone)]
pub enum Container {
    /// A single model.
    Scalar(Model),
    /// Models in stored order.
    List(Vec<Model>),
    /// Models keyed either by stored key or by their own id.
    Map(IndexMap<String, Model>),
}

impl Container {
    /// Number of models held.
    pub fn len(&self) -> usize {
        match self {
            Container::Scalar(_) => 1,
            Container::List(models) => models.len(),
            Container::Map(models) => models.len(),
        }
    }

    /// Whether no models are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single model, typed.
    ///
    /// Returns `None` if this is not a [`Container::Scalar`].
    pub fn into_model<T: Unique>(self) -> Option<Result<Arc<T>, PortError>> {
        match self {
            Container::Scalar(model) => Some(typed(model)),
            _ => None,
        }
    }

    /// The models of a [`Container::List`], typed.
    pub fn into_list<T: Unique>(self) -> Option<Result<Vec<Arc<T>>, PortError>> {
        match self {
            Container::List(models) => Some(models.into_iter().map(typed).collect()),
            _ => None,
        }
    }

    /// The models of a [`Container::Map`], typed.
    pub fn into_map<T: Unique>(self) -> Option<Result<IndexMap<String, Arc<T>>, PortError>> {
        match self {
            Container::Map(models) => Some(
                models
                    .into_iter()
                    .map(|(key, model)| typed(model).map(|model| (key, model)))
                    .collect(),
            ),
            _ => None,
        }
    }
}

fn typed<T: Unique>(model: Model) -> Result<Arc<T>, PortError> {
    downcast(model).map_err(|model| PortError::WrongType {
        expected: ModelType::of::<T>(),
        id: model.id().to_string(),
    })
}

/// Resolve every negotiated entry as a `element` model and assemble `target`.
///
/// All or nothing: the first entry that fails to resolve aborts the whole
/// container. Models already present in the stored data pass through as-is.
/// Without preserved keys, map entries are keyed by model id, so entries that
/// resolve to the same id collapse into one.
pub fn materialize(
    resolver: &Resolver,
    negotiated: &Negotiated<'_>,
    target: TargetShape,
    element: ModelType,
) -> Result<Container, PortError> {
    let resolve = |value: EntryRef<'_>| -> Result<Model, PortError> {
        match value {
            EntryRef::Model(model) if element.is_type_of(&**model) => Ok(model.clone()),
            EntryRef::Model(model) => Err(PortError::WrongType {
                expected: element,
                id: model.id().to_string(),
            }),
            EntryRef::Id(id) => resolver.resolve(element, id),
        }
    };

    match target {
        TargetShape::Scalar => match negotiated.entries.first() {
            Some(entry) => Ok(Container::Scalar(resolve(entry.value)?)),
            None => Err(PortError::Missing {
                ty: element,
                field: negotiated.field,
            }),
        },
        TargetShape::List => negotiated
            .entries
            .iter()
            .map(|entry| resolve(entry.value))
            .collect::<Result<_, _>>()
            .map(Container::List),
        TargetShape::Map { .. } => {
            let mut models = IndexMap::with_capacity(negotiated.entries.len());
            for entry in &negotiated.entries {
                let model = resolve(entry.value)?;
                let key = match entry.key {
                    Some(key) => key.to_string(),
                    None => model.id().to_string(),
                };
                models.insert(key, model);
            }
            Ok(Container::Map(models))
        }
    }
}
