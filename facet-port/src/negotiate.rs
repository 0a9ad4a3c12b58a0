//! Shape negotiation: picking which stored encoding of a field to read.
//!
//! Each [`TargetShape`] accepts a fixed, ordered list of [`RawInputShape`]s.
//! The first encoding the store actually holds wins, so primary encodings
//! (which can carry live models and author-supplied keys) always beat the
//! legacy identifier-only ones.

use alloc::vec::Vec;

use crate::tracing_macros::trace;
use crate::{Model, RawEntry, RawInputShape, RawStore, RawValue};

/// The container a ported field is declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetShape {
    /// A single model.
    Scalar,
    /// An ordered list of models.
    List,
    /// Models under string keys.
    Map {
        /// Keep the stored keys instead of re-keying entries by model id.
        preserve_keys: bool,
    },
}

impl TargetShape {
    /// The encodings this shape accepts, highest priority first.
    pub const fn candidates(self) -> &'static [RawInputShape] {
        match self {
            TargetShape::Scalar => SCALAR_CANDIDATES,
            TargetShape::List => LIST_CANDIDATES,
            TargetShape::Map {
                preserve_keys: true,
            } => KEYED_MAP_CANDIDATES,
            TargetShape::Map {
                preserve_keys: false,
            } => MAP_CANDIDATES,
        }
    }

    /// Whether stored keys survive into the output container.
    ///
    /// Always `false` for scalars and lists.
    pub const fn preserves_keys(self) -> bool {
        matches!(
            self,
            TargetShape::Map {
                preserve_keys: true
            }
        )
    }
}

const SCALAR_CANDIDATES: &[RawInputShape] = &[RawInputShape::SingleValue];

const LIST_CANDIDATES: &[RawInputShape] = &[
    RawInputShape::ListOfValues,
    RawInputShape::ListOfStrings,
];

const KEYED_MAP_CANDIDATES: &[RawInputShape] = &[
    RawInputShape::MapOfStringToValue,
    RawInputShape::MapOfStringToString,
];

const MAP_CANDIDATES: &[RawInputShape] = &[
    RawInputShape::MapOfStringToValue,
    RawInputShape::MapOfStringToString,
    // keyless: only usable when keys are derived from model ids
    RawInputShape::ListOfValues,
    RawInputShape::ListOfStrings,
];

/// A borrowed stored reference.
#[derive(Debug, Clone, Copy)]
pub enum EntryRef<'a> {
    /// Identifier still to be resolved.
    Id(&'a str),
    /// Model that is already live.
    Model(&'a Model),
}

impl<'a> From<&'a RawEntry> for EntryRef<'a> {
    fn from(entry: &'a RawEntry) -> Self {
        match entry {
            RawEntry::Id(id) => EntryRef::Id(id),
            RawEntry::Model(model) => EntryRef::Model(model),
        }
    }
}

/// One negotiated entry.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    /// The stored key, when the output keeps stored keys. `None` leaves the
    /// key to be derived from the resolved model.
    pub key: Option<&'a str>,
    /// The reference to resolve.
    pub value: EntryRef<'a>,
}

/// The uniform result of negotiation: which encoding was read, and its
/// entries in stored order.
#[derive(Debug, Clone)]
pub struct Negotiated<'a> {
    /// The name the field was read from.
    pub field: &'static str,
    /// The encoding that was selected.
    pub shape: RawInputShape,
    /// The stored entries.
    pub entries: Vec<Entry<'a>>,
}

/// Read the field stored under `name` as `target`.
///
/// Returns `None` when the store holds none of the accepted encodings;
/// whether that is acceptable is up to the caller. A map that preserves keys
/// accepts keyed encodings only, so a keyless list counts as no data.
pub fn negotiate<'a, S>(
    store: &'a S,
    name: &'static str,
    target: TargetShape,
) -> Option<Negotiated<'a>>
where
    S: RawStore + ?Sized,
{
    let keep_keys = target.preserves_keys();

    for &shape in target.candidates() {
        let Some(value) = store.get(name, shape) else {
            continue;
        };

        trace!("field `{}` negotiated as {:?} for {:?}", name, shape, target);
        return Some(Negotiated {
            field: name,
            shape,
            entries: entries(value, keep_keys),
        });
    }

    trace!("field `{}` has no stored data for {:?}", name, target);
    None
}

fn entries(value: &RawValue, keep_keys: bool) -> Vec<Entry<'_>> {
    match value {
        RawValue::Single(entry) => vec![Entry {
            key: None,
            value: entry.into(),
        }],
        RawValue::List(list) => list
            .iter()
            .map(|entry| Entry {
                key: None,
                value: entry.into(),
            })
            .collect(),
        RawValue::IdList(ids) => ids
            .iter()
            .map(|id| Entry {
                key: None,
                value: EntryRef::Id(id),
            })
            .collect(),
        RawValue::Map(map) => map
            .iter()
            .map(|(k, entry)| Entry {
                key: keep_keys.then_some(k.as_str()),
                value: entry.into(),
            })
            .collect(),
        RawValue::IdMap(map) => map
            .iter()
            .map(|(k, id)| Entry {
                key: keep_keys.then_some(k.as_str()),
                value: EntryRef::Id(id),
            })
            .collect(),
    }
}
