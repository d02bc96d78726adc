//! Container definitions: the schema side of a parse.
//!
//! A [`Container`] declares a regex pattern with named capturing groups, an
//! optional `representative` name (its level in the output tree; empty
//! means "flatten into the parent"), child containers, and type-inference
//! settings. Containers are plain data; the engine compiles a tree of them
//! into a single [`Chain`](crate::Chain).
//!
//! Trees can be spelled with the builder or the [`container!`] macro:
//!
//! ```
//! use logquarry::container;
//!
//! let schema = container! {
//!     name: "FamilyLog",
//!     sub: [
//!         container! {
//!             name: "MotherContainer",
//!             pattern: r"mother:\s(?P<mother>.*)",
//!             representative: "parents",
//!         },
//!         container! {
//!             name: "FatherContainer",
//!             pattern: r"father:\s(?P<father>.*)",
//!             representative: "parents",
//!         },
//!     ],
//! };
//! let session = schema.parse_str("mother: Jane\nfather: Peter\n").unwrap();
//! assert_eq!(session.get_value("parents.mother").unwrap().to_string(), "Jane");
//! ```

use std::path::Path;

use crate::Session;
use crate::assume::Assumptions;
use crate::engine::{self, Chain};
use crate::error::Result;

/// A schema node: pattern, tree position and children.
///
/// The `name` is the container's type identifier; it namespaces the
/// pattern's capturing groups in the compiled chain, so it must be unique
/// across the tree (and a valid group-name fragment: word characters only).
#[derive(Debug, Clone)]
pub struct Container {
    pub(crate) name: String,
    pub(crate) pattern: String,
    pub(crate) representative: String,
    pub(crate) sub_containers: Vec<Container>,
    pub(crate) infer_type: bool,
    pub(crate) assumptions: Assumptions,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: String::new(),
            representative: String::new(),
            sub_containers: Vec::new(),
            infer_type: true,
            assumptions: Assumptions::generic(),
        }
    }

    /// The regex pattern. Must contain at least one named capturing group
    /// when non-empty; aggregator nodes may leave it empty.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// The name this container's captures are grouped under in the output
    /// tree. Empty (the default) attaches captures directly to the parent.
    pub fn representative(mut self, representative: impl Into<String>) -> Self {
        self.representative = representative.into();
        self
    }

    /// Whether captured strings run through the assumption registry
    /// (default: true). When disabled, conversions are reported through
    /// `tracing` but the raw string is kept.
    pub fn infer_type(mut self, infer_type: bool) -> Self {
        self.infer_type = infer_type;
        self
    }

    pub fn assumptions(mut self, assumptions: impl Into<Assumptions>) -> Self {
        self.assumptions = assumptions.into();
        self
    }

    /// Append a child container.
    pub fn sub(mut self, container: Container) -> Self {
        self.sub_containers.push(container);
        self
    }

    /// Compile this container tree into a reusable [`Chain`].
    pub fn compile(&self) -> Result<Chain> {
        engine::compile(self)
    }

    /// Compile and parse an in-memory blob in one go.
    pub fn parse_str(&self, text: &str) -> Result<Session> {
        self.compile()?.parse_str(text)
    }

    /// Compile and parse a log file in one go. A missing or unreadable file
    /// surfaces as the underlying IO error.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<Session> {
        self.compile()?.parse_path(path)
    }
}
