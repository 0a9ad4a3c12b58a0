//! The per-field entry point used while constructing a model.

use alloc::sync::Arc;

use crate::tracing_macros::{debug, trace};
use crate::{
    Container, FetchModel, FieldSchema, IdentityCache, PortError, RawStore, Resolver, materialize,
    negotiate,
};

/// What happened to a field during construction.
#[derive(Debug)]
pub enum FieldOutcome {
    /// The field is not persisted, not auto-ported, or opted out of
    /// construction. Whatever else builds the model decides its value.
    Skipped,
    /// The field was built from stored data.
    Value(Container),
    /// No stored data was found; the field's default applies.
    Absent,
    /// Construction of the owning model must abort.
    Failed(PortError),
}

impl FieldOutcome {
    /// `Ok(Some(..))` for a built value, `Ok(None)` for skipped or absent
    /// fields, and the error for failed ones.
    pub fn into_result(self) -> Result<Option<Container>, PortError> {
        match self {
            FieldOutcome::Value(container) => Ok(Some(container)),
            FieldOutcome::Skipped | FieldOutcome::Absent => Ok(None),
            FieldOutcome::Failed(error) => Err(error),
        }
    }

    /// Whether this is [`FieldOutcome::Value`].
    pub fn is_value(&self) -> bool {
        matches!(self, FieldOutcome::Value(_))
    }
}

/// Ports model references stored as identifiers back into models.
///
/// ```
/// use std::sync::Arc;
/// use facet::Facet;
/// use facet_port::*;
/// use facet_port as port;
///
/// #[derive(Debug, Facet)]
/// struct Tile {
///     id: String,
/// }
///
/// impl Unique for Tile {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
///
/// #[derive(Facet)]
/// struct Board {
///     #[facet(port::auto_port)]
///     tiles: Vec<Arc<Tile>>,
/// }
///
/// let cache = Arc::new(ModelCache::new());
/// cache.insert(Arc::new(Tile { id: "t1".into() }));
/// let porter = Porter::cache_only(cache);
///
/// let schema = SchemaRegistry::global().register::<Board>().unwrap();
/// let record = RawRecord::new().with("tiles", RawValue::IdList(vec!["t1".into()]));
///
/// let tiles = porter
///     .resolve_field(schema.field("tiles").unwrap(), &record)
///     .into_result()
///     .unwrap()
///     .unwrap();
/// assert_eq!(tiles.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Porter {
    resolver: Resolver,
}

impl Porter {
    /// Port through `resolver`.
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Port with `cache` first and `fetch` on cache misses.
    pub fn with_fallback(cache: Arc<dyn IdentityCache>, fetch: Arc<dyn FetchModel>) -> Self {
        Self::new(Resolver::new(cache, fetch))
    }

    /// Port from `cache` alone.
    pub fn cache_only(cache: Arc<dyn IdentityCache>) -> Self {
        Self::new(Resolver::cache_only(cache))
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Whether `field` takes part in persisted I/O.
    pub fn is_included(&self, field: &FieldSchema) -> bool {
        field.is_included()
    }

    /// Build `field` from the data stored under its parameter name in `store`.
    pub fn resolve_field<S>(&self, field: &FieldSchema, store: &S) -> FieldOutcome
    where
        S: RawStore + ?Sized,
    {
        let name = field.param_name();
        if !field.is_included() {
            trace!("field `{}` skipped: not persisted", name);
            return FieldOutcome::Skipped;
        }
        let Some(port) = field.port() else {
            trace!("field `{}` skipped: not auto-ported", name);
            return FieldOutcome::Skipped;
        };
        if port.ignore_during_auto_building {
            trace!("field `{}` skipped: ignored during auto-building", name);
            return FieldOutcome::Skipped;
        }

        let negotiated = match negotiate(store, name, port.target) {
            Some(negotiated) => negotiated,
            None if field.is_required() => {
                debug!("required field `{}` has no stored data", name);
                return FieldOutcome::Failed(PortError::Missing {
                    ty: port.element,
                    field: name,
                });
            }
            None => {
                trace!("field `{}` absent, using default", name);
                return FieldOutcome::Absent;
            }
        };

        match materialize(&self.resolver, &negotiated, port.target, port.element) {
            Ok(container) => {
                trace!(
                    "field `{}` resolved {} models from {:?}",
                    name,
                    container.len(),
                    negotiated.shape
                );
                FieldOutcome::Value(container)
            }
            Err(error) => {
                debug!("field `{}` failed: {}", name, error);
                FieldOutcome::Failed(error)
            }
        }
    }
}
