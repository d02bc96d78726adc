//! Error taxonomy for schema compilation and parsing.
//!
//! Three families, with different propagation rules:
//!
//! - **Configuration errors**: a broken schema (pattern without a named
//!   capturing group, conflicting group names, converter misuse). Always
//!   fatal, raised during [`compile`](crate::compile) or on first converter
//!   use.
//! - **Ambiguity errors**: raised while converting or merging values
//!   (multiple assumption triggers on one value, merging a non-map into a
//!   map slot). Always fatal; they abort the whole parse.
//! - **IO/serialization errors**: propagated unchanged from `std::io` and
//!   `serde_json`.
//!
//! Conversion *fallbacks* (an unrecognized scalar, an out-of-range time
//! signature, an unmatched key-value pattern) are not errors: converters
//! return the original string instead and log through `tracing`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A container declares a pattern that captures nothing.
    #[error("container '{container}' pattern '{pattern}' doesn't include a named capturing group; no matches would be added")]
    MissingCaptureGroup { container: String, pattern: String },

    /// Two unrelated containers try to claim the same attribute name on one
    /// runtime node.
    #[error("conflicting group name '{group}' on '{node}'")]
    GroupCollision { group: String, node: String },

    /// Sibling containers sharing a representative disagree on `infer_type`.
    #[error("container '{container}' infer_type state conflicts with other containers sharing the representative '{representative}'")]
    InferTypeConflict { container: String, representative: String },

    /// A converter pattern is missing a required named-group marker,
    /// e.g. a key-value pattern without `(?P<key>..)`.
    #[error("{converter} pattern needs a '{marker}' named capturing group")]
    MissingMarker { converter: &'static str, marker: &'static str },

    /// Key prefixing only works with string keys.
    #[error("key-value prefix patterns require the key projection to be a string")]
    PrefixKeyType,

    /// A prefix pattern was configured but never matched the input value.
    #[error("no prefix match using '{pattern}' found in '{value}'")]
    PrefixNotFound { pattern: String, value: String },

    /// More than one assumption trigger matched the same value.
    #[error("multiple assumptions matching on value '{value}'")]
    AmbiguousAssumption { value: String },

    /// A map-valued attribute can only absorb further maps.
    #[error("can only merge into the existing value for '{attr}' if it is of the same type; got {found} for value '{value}', expected a map")]
    MergeTypeMismatch { attr: String, found: &'static str, value: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
