//! Per-field persistence metadata, read from facet reflection once per type.
//!
//! The fields of a type come from its [`Shape`]. What reflection decides for
//! a field (`#[facet(skip)]`, `#[facet(skip_serializing)]`) is the baseline,
//! and the `#[facet(port::...)]` attributes declared by [`Attr`] override it.
//! Registration turns both into a [`TypeSchema`], whose answers never change
//! afterwards.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use std::collections::HashMap;
use std::sync::LazyLock;

use facet::{Def, Facet, Field, Shape, Type, UserType};
use parking_lot::RwLock;

use crate::tracing_macros::debug;
use crate::{Attr, ModelType, SchemaError, TargetShape};

const PORT_NS: &str = "port";

/// Whether a field takes part in persisted I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Inclusion {
    /// The field is persisted.
    Include,
    /// The field is left out.
    #[default]
    Exclude,
}

impl Inclusion {
    /// `true` for [`Inclusion::Include`].
    pub const fn is_included(self) -> bool {
        matches!(self, Inclusion::Include)
    }
}

/// What reflection alone decides for `field`.
///
/// Fields facet never serializes are excluded. `skip_serializing_if` is a
/// per-value decision and does not change the baseline.
pub fn reflected_inclusion(field: &Field) -> Inclusion {
    if field.has_builtin_attr("skip") || field.has_builtin_attr("skip_serializing") {
        Inclusion::Exclude
    } else {
        Inclusion::Include
    }
}

/// Apply the inclusion attributes of `field` on top of `baseline`.
///
/// An attribute always beats the baseline. If both `port::save_data` and
/// `port::not_save_data` are present, the negative one wins.
pub fn decide_inclusion(baseline: Inclusion, field: &Field) -> Inclusion {
    if field.has_attr(Some(PORT_NS), "not_save_data") {
        Inclusion::Exclude
    } else if field.has_attr(Some(PORT_NS), "save_data") {
        Inclusion::Include
    } else {
        baseline
    }
}

#[derive(Default)]
struct PortAttrs {
    rename: Option<&'static str>,
    param_name: Option<&'static str>,
    auto_port: bool,
    preserve_keys: bool,
    ignore_during_auto_building: bool,
    required: bool,
}

impl PortAttrs {
    fn read(ty: &'static str, field: &Field) -> Result<Self, SchemaError> {
        let mut attrs = Self::default();
        let mut seen: Vec<&'static str> = Vec::new();

        for attr in field.attributes.iter().filter(|a| a.ns == Some(PORT_NS)) {
            if seen.contains(&attr.key) {
                return Err(SchemaError::AmbiguousMarker {
                    ty,
                    field: field.name,
                    marker: attr.key,
                });
            }
            seen.push(attr.key);

            match attr.get_as::<Attr>() {
                Some(Attr::Rename(name)) => attrs.rename = Some(*name),
                Some(Attr::ParamName(name)) => attrs.param_name = Some(*name),
                Some(Attr::AutoPort) => attrs.auto_port = true,
                Some(Attr::PreserveKeys) => attrs.preserve_keys = true,
                Some(Attr::IgnoreDuringAutoBuilding) => attrs.ignore_during_auto_building = true,
                Some(Attr::Required) => attrs.required = true,
                // inclusion is decided by `decide_inclusion`
                Some(Attr::SaveData | Attr::NotSaveData) | None => {}
            }
        }

        if !attrs.auto_port {
            let options = [
                (attrs.preserve_keys, "preserve_keys"),
                (attrs.ignore_during_auto_building, "ignore_during_auto_building"),
            ];
            if let Some((_, marker)) = options.into_iter().find(|(set, _)| *set) {
                return Err(SchemaError::DetachedOption {
                    ty,
                    field: field.name,
                    marker,
                });
            }
        }

        Ok(attrs)
    }
}

/// The container and element type a field of `shape` is built into, if it
/// holds models.
///
/// Models are held behind a pointer (`Arc<T>`, `Box<T>`, ...), alone, in a
/// list, or as map values. An `Option` around any of these is looked through.
fn declared_target(shape: &'static Shape, preserve_keys: bool) -> Option<(TargetShape, ModelType)> {
    match &shape.def {
        Def::Option(option) => declared_target(option.t(), preserve_keys),
        Def::List(list) => model_type(list.t()).map(|element| (TargetShape::List, element)),
        Def::Map(map) => {
            model_type(map.v()).map(|element| (TargetShape::Map { preserve_keys }, element))
        }
        Def::Pointer(_) => model_type(shape).map(|element| (TargetShape::Scalar, element)),
        _ => None,
    }
}

fn model_type(shape: &'static Shape) -> Option<ModelType> {
    match &shape.def {
        Def::Pointer(pointer) => pointer.pointee().map(ModelType::from_shape),
        _ => None,
    }
}

/// Porting metadata of a field marked `port::auto_port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortedField {
    /// The container the field is built into.
    pub target: TargetShape,
    /// The model type of each element.
    pub element: ModelType,
    /// Leave the field alone during construction.
    pub ignore_during_auto_building: bool,
}

/// Registration-time view of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    name: &'static str,
    stored_name: &'static str,
    param_name: &'static str,
    inclusion: Inclusion,
    port: Option<PortedField>,
    required: bool,
}

impl FieldSchema {
    fn new(ty: &'static str, field: &Field) -> Result<Self, SchemaError> {
        let attrs = PortAttrs::read(ty, field)?;

        let port = if attrs.auto_port {
            let Some((target, element)) = declared_target(field.shape(), attrs.preserve_keys)
            else {
                return Err(SchemaError::NotPortable {
                    ty,
                    field: field.name,
                });
            };
            Some(PortedField {
                target,
                element,
                ignore_during_auto_building: attrs.ignore_during_auto_building,
            })
        } else {
            None
        };

        Ok(Self {
            name: field.name,
            stored_name: attrs.rename.unwrap_or(field.name),
            param_name: attrs.param_name.unwrap_or(field.name),
            inclusion: decide_inclusion(reflected_inclusion(field), field),
            port,
            required: attrs.required,
        })
    }

    /// The field's name on the type.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The name the field is written under when saved.
    pub const fn stored_name(&self) -> &'static str {
        self.stored_name
    }

    /// The name the field's data is read from during construction.
    pub const fn param_name(&self) -> &'static str {
        self.param_name
    }

    /// The resolved inclusion decision.
    pub const fn inclusion(&self) -> Inclusion {
        self.inclusion
    }

    /// Whether the field takes part in persisted I/O.
    pub const fn is_included(&self) -> bool {
        self.inclusion.is_included()
    }

    /// Porting metadata, if the field is marked for auto-porting.
    pub const fn port(&self) -> Option<&PortedField> {
        self.port.as_ref()
    }

    /// Whether missing stored data is an error.
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Field schemas of one type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    name: &'static str,
    fields: Vec<FieldSchema>,
}

impl TypeSchema {
    /// Build the schema of `T` from its reflected fields.
    pub fn of<T: Facet<'static>>() -> Result<Self, SchemaError> {
        Self::from_shape(T::SHAPE)
    }

    /// Build the schema of the struct described by `shape`.
    pub fn from_shape(shape: &'static Shape) -> Result<Self, SchemaError> {
        match &shape.ty {
            Type::User(UserType::Struct(struct_type)) => {
                Self::new(shape.type_identifier, struct_type.fields)
            }
            _ => Err(SchemaError::NotAStruct {
                ty: shape.type_identifier,
            }),
        }
    }

    /// Build a schema from reflected fields.
    pub fn new(name: &'static str, fields: &[Field]) -> Result<Self, SchemaError> {
        let fields = fields
            .iter()
            .map(|field| FieldSchema::new(name, field))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, fields })
    }

    /// The type's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// All fields.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// The field called `name`.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that take part in persisted I/O.
    pub fn included_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.is_included())
    }
}

/// Process-wide cache of [`TypeSchema`]s.
///
/// A type's schema is computed on first registration and shared from then on.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<TypeSchema>>>,
}

static GLOBAL: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::new);

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL
    }

    /// The schema of `T`, computing it on first use.
    pub fn register<T: Facet<'static>>(&self) -> Result<Arc<TypeSchema>, SchemaError> {
        self.register_shape(T::SHAPE)
    }

    /// The schema of the struct described by `shape`, computing it on first use.
    pub fn register_shape(&self, shape: &'static Shape) -> Result<Arc<TypeSchema>, SchemaError> {
        let key = shape.id.get();
        if let Some(schema) = self.schemas.read().get(&key) {
            return Ok(schema.clone());
        }

        let schema = Arc::new(TypeSchema::from_shape(shape)?);
        debug!(
            "registered {} ({} fields, {} persisted)",
            schema.name(),
            schema.fields().len(),
            schema.included_fields().count()
        );
        Ok(self.schemas.write().entry(key).or_insert(schema).clone())
    }

    /// The schema of `T`, if it was registered.
    pub fn get<T: Facet<'static>>(&self) -> Option<Arc<TypeSchema>> {
        self.schemas.read().get(&T::SHAPE.id.get()).cloned()
    }
}
