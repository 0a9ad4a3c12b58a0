//! Identifier resolution: identity cache first, then the fallback fetch.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::any::TypeId;
use std::collections::HashMap;

use parking_lot::RwLock;

use crate::tracing_macros::{debug, trace};
use crate::{FetchError, Model, ModelType, PortError, Unique};

/// Read access to models that were already materialized.
///
/// Implementations are shared between concurrent construction passes, so
/// lookups must be safe to run concurrently and must observe earlier inserts.
pub trait IdentityCache: Send + Sync {
    /// The cached model of type `ty` with identifier `id`.
    fn try_get(&self, ty: ModelType, id: &str) -> Option<Model>;
}

/// Host-supplied way of loading a model that is not cached yet.
///
/// A fetch may populate the identity cache as a side effect; the
/// [`Resolver`] does not rely on it.
pub trait FetchModel: Send + Sync {
    /// Load the model of type `ty` with identifier `id`.
    fn try_fetch(&self, ty: ModelType, id: &str) -> Result<Model, FetchError>;
}

impl<F> FetchModel for F
where
    F: Fn(ModelType, &str) -> Result<Model, FetchError> + Send + Sync,
{
    fn try_fetch(&self, ty: ModelType, id: &str) -> Result<Model, FetchError> {
        self(ty, id)
    }
}

/// Thread-safe [`IdentityCache`] keyed by model type and identifier.
#[derive(Default)]
pub struct ModelCache {
    models: RwLock<HashMap<TypeId, HashMap<String, Model>>>,
}

impl ModelCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a typed model under its own identifier, returning it type-erased.
    pub fn insert<T: Unique>(&self, model: Arc<T>) -> Model {
        let model: Model = model;
        self.insert_model(ModelType::of::<T>(), model.clone());
        model
    }

    /// Cache `model` as an instance of `ty`, returning whatever it replaced.
    pub fn insert_model(&self, ty: ModelType, model: Model) -> Option<Model> {
        trace!("caching {} `{}`", ty, model.id());
        self.models
            .write()
            .entry(ty.type_id())
            .or_default()
            .insert(model.id().to_string(), model)
    }

    /// Evict the model of type `ty` with identifier `id`.
    pub fn remove(&self, ty: ModelType, id: &str) -> Option<Model> {
        self.models.write().get_mut(&ty.type_id())?.remove(id)
    }

    /// Number of cached models, across all types.
    pub fn len(&self) -> usize {
        self.models.read().values().map(HashMap::len).sum()
    }

    /// Whether the cache holds no models.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityCache for ModelCache {
    fn try_get(&self, ty: ModelType, id: &str) -> Option<Model> {
        self.models.read().get(&ty.type_id())?.get(id).cloned()
    }
}

impl core::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModelCache")
            .field("len", &self.len())
            .finish()
    }
}

/// Turns identifiers back into models.
///
/// Every lookup goes through the identity cache before the fallback fetch,
/// so an identifier that was materialized once keeps resolving to the same
/// instance. Nothing is retried: one failed fetch is one [`PortError::NotFound`].
#[derive(Clone)]
pub struct Resolver {
    cache: Arc<dyn IdentityCache>,
    fetch: Option<Arc<dyn FetchModel>>,
}

impl Resolver {
    /// A resolver that falls back to `fetch` on cache misses.
    pub fn new(cache: Arc<dyn IdentityCache>, fetch: Arc<dyn FetchModel>) -> Self {
        Self {
            cache,
            fetch: Some(fetch),
        }
    }

    /// A resolver that only consults the cache.
    pub fn cache_only(cache: Arc<dyn IdentityCache>) -> Self {
        Self { cache, fetch: None }
    }

    /// Resolve `id` to a model of type `ty`.
    pub fn resolve(&self, ty: ModelType, id: &str) -> Result<Model, PortError> {
        if let Some(model) = self.cache.try_get(ty, id) {
            trace!("cache hit for {} `{}`", ty, id);
            return checked(ty, model);
        }

        let Some(fetch) = &self.fetch else {
            debug!("cache miss for {} `{}` and no fallback fetch", ty, id);
            return Err(PortError::NotFound {
                ty,
                id: id.to_string(),
                source: None,
            });
        };

        trace!("cache miss for {} `{}`, fetching", ty, id);
        match fetch.try_fetch(ty, id) {
            Ok(model) => checked(ty, model),
            Err(error) => {
                debug!("fetching {} `{}` failed: {}", ty, id, error);
                Err(PortError::NotFound {
                    ty,
                    id: id.to_string(),
                    source: Some(error),
                })
            }
        }
    }
}

fn checked(ty: ModelType, model: Model) -> Result<Model, PortError> {
    if ty.is_type_of(&*model) {
        Ok(model)
    } else {
        Err(PortError::WrongType {
            expected: ty,
            id: model.id().to_string(),
        })
    }
}

impl core::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resolver")
            .field("fallback", &self.fetch.is_some())
            .finish_non_exhaustive()
    }
}
