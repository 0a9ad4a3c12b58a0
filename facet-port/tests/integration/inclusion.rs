use std::sync::Arc;

use facet::Facet;
use facet_port as port;
use facet_port::{ModelType, SchemaError, SchemaRegistry, TargetShape, TypeSchema};

use super::fixtures::{Board, Tile, init_tracing};

#[derive(Facet)]
struct Journal {
    #[facet(skip_serializing)]
    notes: String,
}

#[derive(Facet)]
struct MarkedJournal {
    #[facet(skip_serializing, port::save_data)]
    notes: String,
}

#[test]
fn positive_marker_flips_an_excluded_field() {
    init_tracing();
    let before = TypeSchema::of::<Journal>().unwrap();
    let after = TypeSchema::of::<MarkedJournal>().unwrap();
    assert!(!before.field("notes").unwrap().is_included());
    assert!(after.field("notes").unwrap().is_included());
}

#[derive(Facet)]
struct Toggles {
    plain: String,
    #[facet(skip)]
    skipped: String,
    #[facet(port::save_data)]
    saved: String,
    #[facet(skip_serializing, port::save_data)]
    rescued: String,
    #[facet(port::not_save_data)]
    dropped: String,
    #[facet(port::save_data, port::not_save_data)]
    both: String,
    #[facet(skip_serializing, port::save_data, port::not_save_data)]
    both_skipped: String,
}

#[test]
fn markers_beat_the_baseline() {
    let schema = TypeSchema::of::<Toggles>().unwrap();
    let included: Vec<_> = schema.included_fields().map(|f| f.name()).collect();
    assert_eq!(included, ["plain", "saved", "rescued"]);
}

#[test]
fn board_schema() {
    init_tracing();
    let schema = SchemaRegistry::global().register::<Board>().unwrap();
    assert_eq!(schema.name(), "Board");

    let included: Vec<_> = schema.included_fields().map(|f| f.stored_name()).collect();
    assert_eq!(
        included,
        [
            "tiles",
            "by_slot",
            "palette",
            "cover",
            "thumbnail",
            "history",
            "author_notes",
            "title"
        ]
    );

    let by_slot = schema.field("by_slot").unwrap().port().unwrap();
    assert_eq!(
        by_slot.target,
        TargetShape::Map {
            preserve_keys: true
        }
    );
    assert_eq!(by_slot.element, ModelType::of::<Tile>());

    let cover = schema.field("cover").unwrap();
    assert!(cover.is_required());
    assert_eq!(cover.port().unwrap().target, TargetShape::Scalar);

    let thumbnail = schema.field("thumbnail").unwrap().port().unwrap();
    assert!(thumbnail.ignore_during_auto_building);
    assert_eq!(thumbnail.target, TargetShape::Scalar);

    assert_eq!(
        schema.field("palette").unwrap().port().unwrap().target,
        TargetShape::Map {
            preserve_keys: false
        }
    );
    assert!(schema.field("title").unwrap().port().is_none());
    assert!(schema.field("scratch").is_some_and(|f| !f.is_included()));
    assert!(schema.field("missing").is_none());
}

#[test]
fn registration_happens_once() {
    init_tracing();
    let registry = SchemaRegistry::new();
    assert!(registry.get::<Board>().is_none());

    let first = registry.register::<Board>().unwrap();
    let second = registry.register::<Board>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &registry.get::<Board>().unwrap()));
}

#[derive(Facet)]
struct Doubled {
    #[facet(port::not_save_data, port::not_save_data)]
    flag: bool,
}

#[test]
fn repeated_markers_are_rejected() {
    let registry = SchemaRegistry::new();
    let err = registry.register::<Doubled>().unwrap_err();
    assert!(matches!(
        err,
        SchemaError::AmbiguousMarker {
            field: "flag",
            marker: "not_save_data",
            ..
        }
    ));
    assert!(registry.get::<Doubled>().is_none());
}

#[derive(Facet)]
struct Counter {
    #[facet(port::auto_port)]
    count: u32,
}

#[test]
fn auto_port_needs_a_model_field() {
    let err = TypeSchema::of::<Counter>().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Counter::count is marked for auto-porting but does not hold models");
}

#[derive(Facet)]
struct Loose {
    #[facet(port::preserve_keys)]
    slots: std::collections::HashMap<String, Arc<Tile>>,
}

#[test]
fn auto_port_options_need_auto_port() {
    let err = TypeSchema::of::<Loose>().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Loose::slots has `port::preserve_keys` but is not marked `port::auto_port`");
}

#[derive(Facet)]
struct Names {
    #[facet(port::rename = "stored", port::param_name = "param")]
    a: String,
    #[facet(port::param_name = "param")]
    b: String,
    c: String,
}

#[test]
fn rename_and_param_name_are_independent() {
    let schema = TypeSchema::of::<Names>().unwrap();
    let names = |field: &str| {
        let field = schema.field(field).unwrap();
        (field.stored_name(), field.param_name())
    };
    assert_eq!(names("a"), ("stored", "param"));
    assert_eq!(names("b"), ("b", "param"));
    assert_eq!(names("c"), ("c", "c"));
}

#[test]
fn only_structs_register() {
    let err = SchemaRegistry::new().register::<Vec<Arc<Tile>>>().unwrap_err();
    assert!(matches!(err, SchemaError::NotAStruct { .. }));
}
