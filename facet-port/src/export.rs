//! Porting out: turning resolved containers back into identifiers for storage.

use alloc::string::ToString;

use crate::{Container, FieldSchema, RawEntry, RawRecord, RawValue, TargetShape};

/// The persisted form of `container` when declared as `target`.
///
/// Models are replaced by their ids. Maps keep their keys only when `target`
/// preserves keys; otherwise they are written as a plain list of ids, since
/// the keys can be derived again from the models.
pub fn export(container: &Container, target: TargetShape) -> RawValue {
    let id = |model: &crate::Model| RawEntry::Id(model.id().to_string());
    match container {
        Container::Scalar(model) => RawValue::Single(id(model)),
        Container::List(models) => RawValue::List(models.iter().map(id).collect()),
        Container::Map(models) if target.preserves_keys() => RawValue::Map(
            models
                .iter()
                .map(|(key, model)| (key.clone(), id(model)))
                .collect(),
        ),
        Container::Map(models) => RawValue::List(models.values().map(id).collect()),
    }
}

/// Write `container` into `record` under `field`'s stored name.
///
/// Returns `false` without writing anything if the field is not persisted or
/// does not hold models.
pub fn export_field(field: &FieldSchema, container: &Container, record: &mut RawRecord) -> bool {
    let Some(port) = field.port().filter(|_| field.is_included()) else {
        return false;
    };
    record.insert(field.stored_name(), export(container, port.target));
    true
}
