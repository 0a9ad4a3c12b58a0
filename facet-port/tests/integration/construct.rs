use facet_port::{Container, FieldOutcome, PortError, RawEntry, RawRecord, RawValue, SchemaRegistry};
use indexmap::IndexMap;

use super::fixtures::{Board, Ledger, Tile, ids, porter, tile};

fn id_map(pairs: &[(&str, &str)]) -> RawValue {
    RawValue::IdMap(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<IndexMap<_, _>>(),
    )
}

fn id_list(items: &[&str]) -> RawValue {
    RawValue::IdList(items.iter().map(|id| id.to_string()).collect())
}

#[test]
fn list_of_ids_keeps_stored_order() {
    let (porter, db) = porter([tile("t1", 'a'), tile("t2", 'b'), tile("t3", 'c')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("tiles", id_list(&["t3", "t1", "t2"]));

    let outcome = porter.resolve_field(schema.field("tiles").unwrap(), &record);
    let Some(Container::List(models)) = outcome.into_result().unwrap() else {
        panic!("expected a list");
    };
    assert_eq!(ids(&models), ["t3", "t1", "t2"]);
    assert_eq!(db.fetch_count(), 3);
}

#[test]
fn one_unresolvable_id_fails_the_whole_map() {
    let (porter, _db) = porter([tile("id1", 'a')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("by_slot", id_map(&[("a", "id1"), ("b", "id2")]));

    let outcome = porter.resolve_field(schema.field("by_slot").unwrap(), &record);
    let FieldOutcome::Failed(PortError::NotFound { id, source, .. }) = &outcome else {
        panic!("expected a not-found failure, got {outcome:?}");
    };
    assert_eq!(id, "id2");
    assert!(source.is_some());
}

#[test]
fn derived_keys_collapse_duplicate_ids() {
    let (porter, db) = porter([tile("id1", 'a')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("palette", id_map(&[("x", "id1"), ("y", "id1")]));

    let container = porter
        .resolve_field(schema.field("palette").unwrap(), &record)
        .into_result()
        .unwrap()
        .unwrap();
    let palette = container.into_map::<Tile>().unwrap().unwrap();
    assert_eq!(palette.len(), 1);
    assert_eq!(palette["id1"].glyph, 'a');
    // the second lookup is a cache hit
    assert_eq!(db.fetch_count(), 1);
}

#[test]
fn preserved_keys_survive_duplicate_ids() {
    let (porter, _db) = porter([tile("id1", 'a')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("by_slot", id_map(&[("x", "id1"), ("y", "id1")]));

    let container = porter
        .resolve_field(schema.field("by_slot").unwrap(), &record)
        .into_result()
        .unwrap()
        .unwrap();
    let by_slot = container.into_map::<Tile>().unwrap().unwrap();
    assert_eq!(by_slot.keys().collect::<Vec<_>>(), ["x", "y"]);
    assert!(std::sync::Arc::ptr_eq(&by_slot["x"], &by_slot["y"]));
}

#[test]
fn derived_keys_read_legacy_id_lists() {
    let (porter, _db) = porter([tile("t1", 'a'), tile("t2", 'b')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("palette", id_list(&["t2", "t1"]));

    let container = porter
        .resolve_field(schema.field("palette").unwrap(), &record)
        .into_result()
        .unwrap()
        .unwrap();
    let Container::Map(palette) = container else {
        panic!("expected a map");
    };
    for (key, model) in &palette {
        assert_eq!(key, model.id());
    }
    assert_eq!(palette.keys().collect::<Vec<_>>(), ["t2", "t1"]);
}

#[test]
fn keyless_data_leaves_optional_keyed_map_absent() {
    let (porter, db) = porter([tile("t1", 'a')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("by_slot", id_list(&["t1"]));

    let outcome = porter.resolve_field(schema.field("by_slot").unwrap(), &record);
    assert!(matches!(outcome, FieldOutcome::Absent), "got {outcome:?}");
    assert_eq!(db.fetch_count(), 0);
}

#[test]
fn keyless_data_fails_required_keyed_map() {
    let (porter, db) = porter([tile("t1", 'a')]);
    let schema = SchemaRegistry::global().register::<Ledger>().unwrap();
    let record = RawRecord::new().with("entries", id_list(&["t1"]));

    let outcome = porter.resolve_field(schema.field("entries").unwrap(), &record);
    let FieldOutcome::Failed(err) = &outcome else {
        panic!("expected a failure, got {outcome:?}");
    };
    insta::assert_snapshot!(err.to_string(), @"missing param of type Tile or a portable id for that type under the name `entries`");
    assert_eq!(db.fetch_count(), 0);
}

#[test]
fn absent_data_falls_back_to_default() {
    let (porter, db) = porter([]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new();

    let outcome = porter.resolve_field(schema.field("tiles").unwrap(), &record);
    assert!(matches!(outcome, FieldOutcome::Absent));
    assert!(outcome.into_result().unwrap().is_none());
    assert_eq!(db.fetch_count(), 0);
}

#[test]
fn required_field_without_data_fails() {
    let (porter, _db) = porter([]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();

    let outcome = porter.resolve_field(schema.field("cover").unwrap(), &RawRecord::new());
    assert!(matches!(
        outcome,
        FieldOutcome::Failed(PortError::Missing { field: "cover", .. })
    ));
}

#[test]
fn ignored_fields_are_never_built() {
    let (porter, db) = porter([tile("s1", 'a')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("thumbnail", RawValue::from(RawEntry::from("s1")));

    let outcome = porter.resolve_field(schema.field("thumbnail").unwrap(), &record);
    assert!(matches!(outcome, FieldOutcome::Skipped));
    assert_eq!(db.fetch_count(), 0);
}

#[test]
fn excluded_fields_are_skipped_even_with_data() {
    let (porter, db) = porter([tile("t1", 'a')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("owner", RawValue::from(RawEntry::from("t1")));

    let owner = schema.field("owner").unwrap();
    assert!(!porter.is_included(owner));
    assert!(matches!(
        porter.resolve_field(owner, &record),
        FieldOutcome::Skipped
    ));
    assert_eq!(db.fetch_count(), 0);
}

#[test]
fn param_name_selects_stored_data() {
    let (porter, _db) = porter([tile("t1", 'a')]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let history = schema.field("history").unwrap();
    assert_eq!(history.param_name(), "old_tiles");
    assert_eq!(history.stored_name(), "history");

    let record = RawRecord::new()
        .with("history", id_list(&["missing"]))
        .with("old_tiles", id_list(&["t1"]));
    let container = porter
        .resolve_field(history, &record)
        .into_result()
        .unwrap()
        .unwrap();
    let history = container.into_list::<Tile>().unwrap().unwrap();
    assert_eq!(history[0].id, "t1");
}

#[test]
fn fetch_failure_keeps_the_fetch_error() {
    use std::error::Error;

    let (porter, _db) = porter([]);
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    let record = RawRecord::new().with("cover", RawValue::from(RawEntry::from("gone")));

    let err = porter
        .resolve_field(schema.field("cover").unwrap(), &record)
        .into_result()
        .unwrap_err();
    let source = err.source().expect("fetch error is kept as the source");
    assert!(source.to_string().starts_with("no "));
    assert!(source.to_string().ends_with("row with id gone"));
}
