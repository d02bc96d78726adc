//! Chain compilation and matching engine.
//!
//! This module is the entry point for the core pipeline. Parsing a log is a
//! strict two-phase affair:
//!
//! ```text
//! container tree ──> compile (chain.rs)
//!                      - walk the tree depth-first, pre-order
//!                      - merge siblings sharing a representative
//!                      - namespace capturing groups, join patterns with |
//!                      - build the group -> {node, attr, path} map
//!                            │
//!                            v
//!                          Chain
//!                            │
//! input text ──────> scan (scan.rs)
//!                      - clone the node arena
//!                      - run the global regex line by line
//!                      - convert captures via each node's assumptions
//!                      - merge values (scalar -> list/map accumulation)
//!                            │
//!                            v
//!                    materialize (tree.rs)
//!                      - sorted dotted paths -> nested value tree
//! ```
//!
//! ## Responsibilities by module
//!
//! - `chain.rs`: derives a [`Chain`] from a [`Container`](crate::Container)
//!   tree; all configuration errors (missing capture groups, group-name
//!   collisions, `infer_type` conflicts, invalid trigger patterns) surface
//!   here, before any input is read.
//! - `scan.rs`: runs the compiled alternation over the input and
//!   accumulates converted values into the arena; ambiguity and merge
//!   type-mismatch errors abort the parse here.
//! - `tree.rs`: turns the populated arena into the serialization-ready
//!   nested tree.
//!
//! A `Chain` is immutable after compilation and can be reused across
//! parses; every parse clones its node arena, so sessions never share
//! mutable state.

#[path = "engine/chain.rs"]
mod chain;
#[path = "engine/scan.rs"]
mod scan;
#[path = "engine/tree.rs"]
mod tree;

pub use chain::Chain;
pub(crate) use chain::{GroupTarget, RuntimeNode, compile};
pub(crate) use scan::scan;
pub(crate) use tree::materialize;
