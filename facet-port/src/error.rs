use alloc::boxed::Box;
use alloc::string::String;

use crate::ModelType;

/// Error reported by a [`FetchModel`](crate::FetchModel) strategy.
pub type FetchError = Box<dyn core::error::Error + Send + Sync>;

/// Errors that abort the construction of a ported field.
#[derive(Debug)]
pub enum PortError {
    /// An identifier could be resolved neither from the identity cache nor
    /// by the fallback fetch.
    NotFound {
        /// The model type that was asked for.
        ty: ModelType,
        /// The identifier that failed to resolve.
        id: String,
        /// What the fallback fetch reported, if anything.
        source: Option<FetchError>,
    },

    /// A required field had no stored data in any shape it accepts.
    Missing {
        /// The declared element type of the field.
        ty: ModelType,
        /// The name the field's data is read from.
        field: &'static str,
    },

    /// An entry or fetched instance was not of the field's element type.
    WrongType {
        /// The element type the field declares.
        expected: ModelType,
        /// Identifier of the offending instance.
        id: String,
    },
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PortError::NotFound { ty, id, source } => {
                write!(f, "no {ty} with id `{id}` in the cache or the fallback store")?;
                if let Some(source) = source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
            PortError::Missing { ty, field } => write!(
                f,
                "missing param of type {ty} or a portable id for that type under the name `{field}`"
            ),
            PortError::WrongType { expected, id } => {
                write!(f, "model `{id}` is not a {expected}")
            }
        }
    }
}

impl core::error::Error for PortError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            PortError::NotFound {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Errors detected while registering a type's field schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field carries the same kind of marker more than once.
    AmbiguousMarker {
        /// The type being registered.
        ty: &'static str,
        /// The offending field.
        field: &'static str,
        /// The repeated marker.
        marker: &'static str,
    },

    /// A field is marked for auto-porting but does not reference models.
    NotPortable {
        /// The type being registered.
        ty: &'static str,
        /// The offending field.
        field: &'static str,
    },

    /// An auto-port option was given on a field that is not auto-ported.
    DetachedOption {
        /// The type being registered.
        ty: &'static str,
        /// The offending field.
        field: &'static str,
        /// The option.
        marker: &'static str,
    },

    /// The registered type is not a struct.
    NotAStruct {
        /// The type being registered.
        ty: &'static str,
    },
}

impl core::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SchemaError::AmbiguousMarker { ty, field, marker } => {
                write!(f, "{ty}::{field} carries more than one `{marker}` marker")
            }
            SchemaError::NotPortable { ty, field } => write!(
                f,
                "{ty}::{field} is marked for auto-porting but does not hold models"
            ),
            SchemaError::DetachedOption { ty, field, marker } => write!(
                f,
                "{ty}::{field} has `port::{marker}` but is not marked `port::auto_port`"
            ),
            SchemaError::NotAStruct { ty } => {
                write!(f, "{ty} is not a struct, so it has no fields to port")
            }
        }
    }
}

impl core::error::Error for SchemaError {}
