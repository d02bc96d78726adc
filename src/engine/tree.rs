//! Tree materialization: dotted paths -> nested value tree.
//!
//! After a scan, every group-map entry contributes its dotted logical path
//! and resolved value. Paths are split on `.` and inserted into nested
//! maps; attributes that never matched materialize as null leaves. The
//! result is fully deterministic (`BTreeMap` keeps keys sorted) and ready
//! for serialization.

use std::collections::BTreeMap;

use super::chain::{Chain, RuntimeNode};
use crate::value::Value;

/// Build the nested member tree from a populated arena.
pub(crate) fn materialize(chain: &Chain, nodes: &[RuntimeNode]) -> Value {
    let mut root = BTreeMap::new();
    for target in chain.groups.values() {
        let value = nodes[target.node]
            .attrs
            .get(&target.attr)
            .and_then(|slot| slot.as_ref())
            .cloned()
            .unwrap_or(Value::Null);
        let segments: Vec<&str> = target.path.split('.').collect();
        insert(&mut root, &segments, value);
    }
    Value::Map(root)
}

fn insert(map: &mut BTreeMap<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            map.entry((*leaf).to_string()).or_insert(value);
        }
        [head, rest @ ..] => {
            let entry =
                map.entry((*head).to_string()).or_insert_with(|| Value::Map(BTreeMap::new()));
            // Interior segments are always maps: the chain builder rejects
            // leaf paths that prefix other paths.
            if let Value::Map(child) = entry {
                insert(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{compile, scan};
    use crate::schema::Container;

    #[test]
    fn unmatched_attributes_materialize_as_null() {
        let schema = Container::new("Root")
            .sub(Container::new("Seen").pattern(r"seen=(?P<seen>\w+)").representative("flags"))
            .sub(Container::new("Missed").pattern(r"missed=(?P<missed>\w+)").representative("flags"));
        let chain = compile(&schema).unwrap();
        let nodes = scan(&chain, "seen=yes\n").unwrap();
        let tree = materialize(&chain, &nodes);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json, serde_json::json!({"flags": {"seen": "yes", "missed": null}}));
    }

    #[test]
    fn deep_paths_nest_one_level_per_segment() {
        let schema = Container::new("Root").sub(
            Container::new("Outer").representative("a").sub(
                Container::new("Inner")
                    .representative("b")
                    .sub(Container::new("Leaf").pattern(r"x=(?P<x>\d+)").representative("c")),
            ),
        );
        let chain = compile(&schema).unwrap();
        let nodes = scan(&chain, "x=1\n").unwrap();
        let json = serde_json::to_value(materialize(&chain, &nodes)).unwrap();
        assert_eq!(json, serde_json::json!({"a": {"b": {"c": {"x": 1}}}}));
    }
}
