//! Matching and accumulation.
//!
//! The scanner runs the compiled alternation line by line over the input
//! and merges every captured value into its attribute slot. The merge
//! policy is fixed:
//!
//! - unset slot: take the converted value as-is;
//! - existing list: append, then de-duplicate and sort;
//! - existing map: the incoming value must also be a map (fatal mismatch
//!   otherwise); merge key by key, later values winning;
//! - existing scalar: promote to a list of the old and new value,
//!   de-duplicated and sorted.
//!
//! Captures that match the empty string are treated as absent, mirroring
//! the falsy filter of the original accumulation semantics. A node with
//! `infer_type` disabled keeps the raw string but notes what the
//! conversion would have produced.

use tracing::info;

use super::chain::{Chain, GroupTarget, RuntimeNode};
use crate::error::{Error, Result};
use crate::value::Value;

/// Scan `text` and return a populated clone of the chain's node arena.
pub(crate) fn scan(chain: &Chain, text: &str) -> Result<Vec<RuntimeNode>> {
    let mut nodes = chain.nodes.clone();
    let names: Vec<&str> = chain.regex().capture_names().flatten().collect();

    for line in text.lines() {
        for caps in chain.regex().captures_iter(line) {
            for &name in &names {
                let Some(capture) = caps.name(name) else { continue };
                if capture.as_str().is_empty() {
                    continue;
                }
                let Some(target) = chain.groups.get(name) else { continue };
                merge_capture(&mut nodes, target, capture.as_str())?;
            }
        }
    }
    Ok(nodes)
}

/// Convert one captured string and fold it into its attribute slot.
fn merge_capture(nodes: &mut [RuntimeNode], target: &GroupTarget, raw: &str) -> Result<()> {
    let node = &mut nodes[target.node];

    let mut converted = node.actions.call_action(raw)?;
    if !node.infer_type && converted != Value::Str(raw.to_string()) {
        info!(
            value = raw,
            attribute = %target.path,
            inferred = converted.type_name(),
            "match could be converted automatically if infer_type were enabled",
        );
        converted = Value::Str(raw.to_string());
    }

    let slot = node.attrs.entry(target.attr.clone()).or_insert(None);
    match slot.take() {
        None => *slot = Some(converted),
        Some(Value::List(mut items)) => {
            items.push(converted);
            dedup_sorted(&mut items);
            *slot = Some(Value::List(items));
        }
        Some(Value::Map(mut entries)) => {
            let Value::Map(incoming) = converted else {
                return Err(Error::MergeTypeMismatch {
                    attr: target.path.clone(),
                    found: converted.type_name(),
                    value: raw.to_string(),
                });
            };
            entries.extend(incoming);
            *slot = Some(Value::Map(entries));
        }
        Some(previous) => {
            let mut items = vec![previous, converted];
            dedup_sorted(&mut items);
            *slot = Some(Value::List(items));
        }
    }
    Ok(())
}

fn dedup_sorted(items: &mut Vec<Value>) {
    items.sort();
    items.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assume::Assumptions;
    use crate::convert::{Convert, KeyValue};
    use crate::engine::compile;
    use crate::schema::Container;

    fn value_of<'n>(chain: &Chain, nodes: &'n [RuntimeNode], group: &str) -> Option<&'n Value> {
        let target = &chain.groups[group];
        nodes[target.node].attrs[&target.attr].as_ref()
    }

    #[test]
    fn single_match_stays_scalar() {
        let chain = compile(&Container::new("Counter").pattern(r"count=(?P<count>\d+)")).unwrap();
        let nodes = scan(&chain, "count=12\n").unwrap();
        assert_eq!(value_of(&chain, &nodes, "Counter_count"), Some(&Value::Int(12)));
    }

    #[test]
    fn repeated_matches_promote_to_a_sorted_list() {
        let chain = compile(&Container::new("Words").pattern(r"word=(?P<word>\w+)")).unwrap();
        let nodes = scan(&chain, "word=beta word=alpha\nword=beta\nword=gamma\n").unwrap();
        assert_eq!(
            value_of(&chain, &nodes, "Words_word"),
            Some(&Value::List(vec![
                Value::Str("alpha".into()),
                Value::Str("beta".into()),
                Value::Str("gamma".into()),
            ])),
        );
    }

    #[test]
    fn map_values_merge_key_by_key() {
        let schema = Container::new("Pairs")
            .pattern(r"(?P<pair>\w+=\w+)")
            .assumptions(Convert::from(KeyValue::new(r"(?P<key>\w+)=(?P<value>\w+)")));
        let chain = compile(&schema).unwrap();
        let nodes = scan(&chain, "a=1\nb=2\na=3\n").unwrap();
        let Some(Value::Map(entries)) = value_of(&chain, &nodes, "Pairs_pair") else {
            panic!("expected a map");
        };
        // Later values overwrite earlier ones for the same key.
        assert_eq!(entries["a"], Value::Str("3".into()));
        assert_eq!(entries["b"], Value::Str("2".into()));
    }

    #[test]
    fn merging_a_scalar_into_a_map_is_fatal() {
        // First line produces a map, second a plain string.
        let schema = Container::new("Pairs")
            .pattern(r"(?P<pair>.+)")
            .assumptions(
                Assumptions::empty()
                    .assume(r"\w+=\w+", Convert::from(KeyValue::new(r"(?P<key>\w+)=(?P<value>\w+)"))),
            );
        let chain = compile(&schema).unwrap();
        let err = scan(&chain, "a=1\nplain text\n").unwrap_err();
        assert!(matches!(err, Error::MergeTypeMismatch { .. }), "{err}");
    }

    #[test]
    fn empty_captures_are_absent() {
        let chain = compile(&Container::new("Tail").pattern(r"tail:(?P<tail>.*)")).unwrap();
        let nodes = scan(&chain, "tail:\n").unwrap();
        assert_eq!(value_of(&chain, &nodes, "Tail_tail"), None);
    }

    #[test]
    fn infer_type_off_keeps_raw_strings() {
        let chain = compile(
            &Container::new("Counter").pattern(r"count=(?P<count>\d+)").infer_type(false),
        )
        .unwrap();
        let nodes = scan(&chain, "count=12\n").unwrap();
        assert_eq!(value_of(&chain, &nodes, "Counter_count"), Some(&Value::Str("12".into())));
    }

    #[test]
    fn merged_siblings_accumulate_into_one_attribute() {
        let schema = Container::new("Root")
            .sub(Container::new("First").pattern(r"a:\s(?P<name>\w+)").representative("shared"))
            .sub(Container::new("Second").pattern(r"b:\s(?P<name>\w+)").representative("shared"));
        let chain = compile(&schema).unwrap();
        let nodes = scan(&chain, "a: left\nb: right\n").unwrap();
        assert_eq!(
            value_of(&chain, &nodes, "First_name"),
            Some(&Value::List(vec![Value::Str("left".into()), Value::Str("right".into())])),
        );
    }
}
