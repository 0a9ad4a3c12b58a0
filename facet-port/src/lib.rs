#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;
extern crate self as facet_port;

mod tracing_macros;

mod error;
pub use error::*;

mod model;
pub use model::*;

mod raw;
pub use raw::*;

mod resolve;
pub use resolve::*;

mod negotiate;
pub use negotiate::*;

mod materialize;
pub use materialize::*;

mod schema;
pub use schema::*;

mod port;
pub use port::*;

mod export;
pub use export::*;

// Porting attribute grammar. This generates:
// - `Attr` enum with all porting attribute variants
// - `__attr!` macro that dispatches `#[facet(port::...)]` to an `Attr` value
// - `__parse_attr!` macro for parsing (internal use)
facet::define_attr_grammar! {
    ns "port";
    crate_path ::facet_port;

    /// Porting attributes, used as `#[facet(port::...)]` on struct fields.
    pub enum Attr {
        /// Persist the field even if reflection skips it.
        ///
        /// Usage: `#[facet(port::save_data)]`
        SaveData,
        /// Never persist the field, even if reflection includes it.
        ///
        /// Usage: `#[facet(port::not_save_data)]`
        NotSaveData,
        /// Name to write the field under when it is saved.
        ///
        /// Usage: `#[facet(port::rename = "stored_name")]`
        Rename(&'static str),
        /// The field references models that are stored as identifiers.
        ///
        /// Usage: `#[facet(port::auto_port)]`
        AutoPort,
        /// For auto-ported maps: keep the stored keys instead of keying
        /// entries by model id.
        ///
        /// Usage: `#[facet(port::auto_port, port::preserve_keys)]`
        PreserveKeys,
        /// For auto-ported fields: leave the field alone during construction.
        ///
        /// Usage: `#[facet(port::auto_port, port::ignore_during_auto_building)]`
        IgnoreDuringAutoBuilding,
        /// Name to read the field's stored data from during construction.
        ///
        /// Usage: `#[facet(port::param_name = "old_name")]`
        ParamName(&'static str),
        /// Construction fails when no stored data is found for the field.
        ///
        /// Usage: `#[facet(port::required)]`
        Required,
    }
}
