//! Declarative log parsing: declare a tree of regex [`Container`]s and
//! mine a nested, typed value tree out of a log in a single pass.
//!
//! See [`Container`] for the schema surface and [`compile`] for the
//! compile-once/parse-many flow. The engine internals are documented in
//! `src/engine.rs`.

extern crate self as logquarry;

#[macro_use]
mod macros;
mod api;
mod assume;
mod convert;
mod engine;
mod error;
mod schema;
mod value;

pub use api::{Session, compile};
pub use assume::Assumptions;
pub use convert::{Convert, KeyValue, NumberArray, Projection, TimeOfDay};
pub use engine::Chain;
pub use error::{Error, Result};
pub use schema::Container;
pub use value::Value;
