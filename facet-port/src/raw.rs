//! Stored, not-yet-resolved field data.
//!
//! A [`RawValue`] is what the persistence layer hands back for a field: one
//! of a handful of encodings, each identified by a [`RawInputShape`]. Entries
//! are either identifiers or models that were already materialized.

use alloc::string::String;
use alloc::vec::Vec;

use indexmap::IndexMap;

use crate::Model;

/// A single stored reference: an identifier to port, or a model that is
/// already live.
#[derive(Debug, Clone)]
pub enum RawEntry {
    /// Identifier of a model that still has to be resolved.
    Id(String),
    /// A model that was already materialized.
    Model(Model),
}

impl RawEntry {
    /// The identifier this entry refers to.
    pub fn id(&self) -> &str {
        match self {
            RawEntry::Id(id) => id,
            RawEntry::Model(model) => model.id(),
        }
    }
}

impl From<&str> for RawEntry {
    fn from(id: &str) -> Self {
        RawEntry::Id(id.into())
    }
}

impl From<String> for RawEntry {
    fn from(id: String) -> Self {
        RawEntry::Id(id)
    }
}

impl From<Model> for RawEntry {
    fn from(model: Model) -> Self {
        RawEntry::Model(model)
    }
}

/// The encodings a ported field can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawInputShape {
    /// One entry.
    SingleValue,
    /// An ordered list of entries.
    ListOfValues,
    /// Entries under author-supplied string keys.
    MapOfStringToValue,
    /// Legacy: an ordered list of bare identifiers.
    ListOfStrings,
    /// Legacy: bare identifiers under string keys.
    MapOfStringToString,
    /// Nothing was stored.
    Missing,
}

impl RawInputShape {
    /// Whether this is one of the legacy, identifier-only encodings.
    pub const fn is_legacy(self) -> bool {
        matches!(
            self,
            RawInputShape::ListOfStrings | RawInputShape::MapOfStringToString
        )
    }
}

/// A stored field value in one of the [`RawInputShape`] encodings.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// [`RawInputShape::SingleValue`]
    Single(RawEntry),
    /// [`RawInputShape::ListOfValues`]
    List(Vec<RawEntry>),
    /// [`RawInputShape::MapOfStringToValue`]
    Map(IndexMap<String, RawEntry>),
    /// [`RawInputShape::ListOfStrings`]
    IdList(Vec<String>),
    /// [`RawInputShape::MapOfStringToString`]
    IdMap(IndexMap<String, String>),
}

impl RawValue {
    /// The encoding this value is stored in.
    pub const fn shape(&self) -> RawInputShape {
        match self {
            RawValue::Single(_) => RawInputShape::SingleValue,
            RawValue::List(_) => RawInputShape::ListOfValues,
            RawValue::Map(_) => RawInputShape::MapOfStringToValue,
            RawValue::IdList(_) => RawInputShape::ListOfStrings,
            RawValue::IdMap(_) => RawInputShape::MapOfStringToString,
        }
    }
}

impl From<RawEntry> for RawValue {
    fn from(entry: RawEntry) -> Self {
        RawValue::Single(entry)
    }
}

/// Source of stored field data during construction.
///
/// A store may hold more than one encoding under the same name (for example
/// data written before and after a migration); `get` is asked for one
/// encoding at a time.
pub trait RawStore {
    /// The value stored under `name` in the given encoding, if any.
    fn get(&self, name: &str, shape: RawInputShape) -> Option<&RawValue>;
}

impl<S: RawStore + ?Sized> RawStore for &S {
    fn get(&self, name: &str, shape: RawInputShape) -> Option<&RawValue> {
        (**self).get(name, shape)
    }
}

/// In-memory [`RawStore`], keyed by stored field name.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    fields: IndexMap<String, Vec<RawValue>>,
}

impl RawRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, next to any other encodings already there.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) -> &mut Self {
        self.fields
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Drop everything stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Vec<RawValue>> {
        self.fields.shift_remove(name)
    }

    /// Number of distinct field names.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl RawStore for RawRecord {
    fn get(&self, name: &str, shape: RawInputShape) -> Option<&RawValue> {
        self.fields
            .get(name)?
            .iter()
            .find(|value| value.shape() == shape)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use alloc::string::String;
    use alloc::vec::Vec;

    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{RawEntry, RawRecord, RawValue};

    // Models are persisted as their identifiers.
    impl Serialize for RawEntry {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.id())
        }
    }

    impl Serialize for RawValue {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                RawValue::Single(entry) => entry.serialize(serializer),
                RawValue::List(entries) => entries.serialize(serializer),
                RawValue::Map(entries) => entries.serialize(serializer),
                RawValue::IdList(ids) => ids.serialize(serializer),
                RawValue::IdMap(ids) => ids.serialize(serializer),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Id(String),
        List(Vec<String>),
        Map(IndexMap<String, String>),
    }

    impl<'de> Deserialize<'de> for RawValue {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            Ok(match Stored::deserialize(deserializer)? {
                Stored::Id(id) => RawValue::Single(RawEntry::Id(id)),
                Stored::List(ids) => RawValue::List(ids.into_iter().map(RawEntry::Id).collect()),
                Stored::Map(ids) => RawValue::Map(
                    ids.into_iter()
                        .map(|(key, id)| (key, RawEntry::Id(id)))
                        .collect(),
                ),
            })
        }
    }

    impl<'de> Deserialize<'de> for RawRecord {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let fields = IndexMap::<String, RawValue>::deserialize(deserializer)?;
            let mut record = RawRecord::new();
            for (name, value) in fields {
                record.insert(name, value);
            }
            Ok(record)
        }
    }
}
