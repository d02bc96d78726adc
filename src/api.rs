//! Public parsing API.
//!
//! The flow is compile-once, parse-many: [`compile`] turns a
//! [`Container`] tree into a reusable [`Chain`], and each call to
//! [`Chain::parse_str`] or [`Chain::parse_path`] produces a fresh
//! [`Session`] holding the populated value tree. Sessions are single-use
//! products of one parse; they own their state exclusively and never see
//! another parse's values.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::engine::{self, Chain, GroupTarget, RuntimeNode};
use crate::error::Result;
use crate::schema::Container;
use crate::value::Value;

/// Compile a container tree into a reusable [`Chain`].
///
/// All configuration errors (patterns without named groups, group-name
/// collisions, `infer_type` conflicts, invalid assumption triggers)
/// surface here.
pub fn compile(container: &Container) -> Result<Chain> {
    engine::compile(container)
}

impl Chain {
    /// Parse an in-memory text blob.
    pub fn parse_str(&self, text: &str) -> Result<Session> {
        let nodes = engine::scan(self, text)?;
        let tree = engine::materialize(self, &nodes);
        Ok(Session { groups: self.groups.clone(), nodes, tree })
    }

    /// Parse a log file. A missing or unreadable file propagates as the
    /// underlying IO error.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<Session> {
        let text = fs::read_to_string(path)?;
        self.parse_str(&text)
    }
}

/// One completed parse: the populated runtime nodes and the materialized
/// member tree.
#[derive(Debug)]
pub struct Session {
    groups: BTreeMap<String, GroupTarget>,
    nodes: Vec<RuntimeNode>,
    tree: Value,
}

impl Session {
    /// Resolve the value at a dotted leaf path, e.g. `"parents.father"`.
    ///
    /// Returns `None` when the path is not a recognized leaf; a recognized
    /// leaf that never matched resolves to [`Value::Null`].
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        let target = self.groups.values().find(|target| target.path == path)?;
        let slot = self.nodes[target.node].attrs.get(&target.attr);
        Some(slot.and_then(|value| value.as_ref()).unwrap_or(&Value::Null))
    }

    /// Like [`get_value`](Self::get_value), but falling back to `default`
    /// for unrecognized paths.
    pub fn get_value_or(&self, path: &str, default: impl Into<Value>) -> Value {
        match self.get_value(path) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// The materialized member tree: nested maps keyed by representative
    /// names, leaves holding the resolved attribute values.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Write the member tree as pretty JSON (four-space indent, sorted
    /// keys). IO and serialization failures propagate unchanged.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.tree.to_json_pretty()?;
        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tree.to_json_pretty().map_err(|_| fmt::Error)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assume::Assumptions;
    use crate::container;
    use crate::convert::{Convert, KeyValue};
    use serde_json::json;

    const LOG: &str = "mother: Jane\nfather: Peter\nchild1: Dave\nchild2: Lea\n";

    fn family_schema() -> Container {
        container! {
            name: "FamilyLog",
            sub: [
                container! {
                    name: "MotherContainer",
                    pattern: r"mother:\s(?P<mother>.*)",
                    representative: "parents",
                },
                container! {
                    name: "FatherContainer",
                    pattern: r"father:\s(?P<father>.*)",
                    representative: "parents",
                },
                container! {
                    name: "ChildrenContainer",
                    representative: "children",
                    sub: [
                        container! {
                            name: "Child1Container",
                            pattern: r"child1:\s(?P<name>.*)",
                            representative: "child1",
                        },
                        container! {
                            name: "Child2Container",
                            pattern: r"child2:\s(?P<name>.*)",
                            representative: "child2",
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn family_log_materializes_the_expected_tree() {
        let session = family_schema().parse_str(LOG).unwrap();
        assert_eq!(
            serde_json::to_value(session.tree()).unwrap(),
            json!({
                "children": {
                    "child1": {"name": "Dave"},
                    "child2": {"name": "Lea"},
                },
                "parents": {"father": "Peter", "mother": "Jane"},
            }),
        );
    }

    #[test]
    fn get_value_resolves_leaves_only() {
        let session = family_schema().parse_str(LOG).unwrap();
        assert_eq!(session.get_value("parents.father"), Some(&Value::Str("Peter".into())));
        assert_eq!(session.get_value("parents.mother"), Some(&Value::Str("Jane".into())));
        assert_eq!(session.get_value("children.child1.name"), Some(&Value::Str("Dave".into())));
        assert_eq!(session.get_value("children.child2.name"), Some(&Value::Str("Lea".into())));
        // Interior levels and unknown paths are not leaves.
        assert_eq!(session.get_value("mother"), None);
        assert_eq!(session.get_value_or("parents", 6), Value::Int(6));
        assert_eq!(session.get_value_or("nonexistent", 6), Value::Int(6));
    }

    #[test]
    fn recognized_but_unmatched_leaves_resolve_to_null() {
        let session = family_schema().parse_str("father: Peter\n").unwrap();
        assert_eq!(session.get_value("parents.mother"), Some(&Value::Null));
        assert_eq!(session.get_value_or("parents.mother", 6), Value::Null);
    }

    #[test]
    fn multi_match_accumulates_a_sorted_list() {
        let schema = Container::new("EveryoneContainer").pattern(r".*:\s(?P<family>.*)");
        let session = schema.parse_str(LOG).unwrap();
        assert_eq!(
            session.get_value("family"),
            Some(&Value::List(vec![
                Value::Str("Dave".into()),
                Value::Str("Jane".into()),
                Value::Str("Lea".into()),
                Value::Str("Peter".into()),
            ])),
        );
    }

    #[test]
    fn key_value_assumptions_accumulate_a_map() {
        let schema = Container::new("EveryoneContainer")
            .pattern(r"(?P<family>.*)")
            .assumptions(Convert::from(KeyValue::new(r"(?P<key>.*):\s(?P<value>.*)")));
        let session = schema.parse_str(LOG).unwrap();
        assert_eq!(
            serde_json::to_value(session.get_value("family").unwrap()).unwrap(),
            json!({"child1": "Dave", "child2": "Lea", "father": "Peter", "mother": "Jane"}),
        );
    }

    #[test]
    fn scalar_inference_applies_per_node_registries() {
        let schema = Container::new("Stats")
            .pattern(r"samples=(?P<samples>\d+)\slevel=(?P<level>[\w.]+)\sseed=(?P<seed>\w+)");
        let session = schema.parse_str("samples=64 level=0.5 seed=none\n").unwrap();
        assert_eq!(session.get_value("samples"), Some(&Value::Int(64)));
        assert_eq!(session.get_value("level"), Some(&Value::Float(0.5)));
        assert_eq!(session.get_value("seed"), Some(&Value::Null));
    }

    #[test]
    fn ambiguous_assumptions_abort_the_parse() {
        let schema = Container::new("Stats").pattern(r"samples=(?P<samples>\d+)").assumptions(
            Assumptions::generic().assume(r"^\d+$", Convert::Float).assume(r"^\d", Convert::Int),
        );
        let err = schema.parse_str("samples=64\n").unwrap_err();
        assert!(matches!(err, crate::Error::AmbiguousAssumption { .. }), "{err}");
    }

    #[test]
    fn reparsing_is_deterministic() {
        let chain = family_schema().compile().unwrap();
        let first = chain.parse_str(LOG).unwrap();
        let second = chain.parse_str(LOG).unwrap();
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn parse_path_matches_parse_str() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("family.log");
        std::fs::write(&log_path, LOG).unwrap();

        let chain = family_schema().compile().unwrap();
        let from_file = chain.parse_path(&log_path).unwrap();
        let from_text = chain.parse_str(LOG).unwrap();
        assert_eq!(from_file.to_string(), from_text.to_string());
    }

    #[test]
    fn parse_path_propagates_missing_files() {
        let err = family_schema().parse_path("/nonexistent/family.log").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)), "{err}");
    }

    #[test]
    fn dump_writes_the_tree_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tree.json");

        let session = family_schema().parse_str(LOG).unwrap();
        session.dump(&out).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written, serde_json::to_value(session.tree()).unwrap());

        assert!(session.dump(dir.path().join("missing").join("tree.json")).is_err());
    }

    #[test]
    fn display_renders_indented_json() {
        let session = family_schema().parse_str(LOG).unwrap();
        let rendered = session.to_string();
        assert!(rendered.starts_with("{\n    \"children\""), "{rendered}");
        assert!(rendered.contains("\"father\": \"Peter\""), "{rendered}");
    }
}
