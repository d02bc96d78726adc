//! Chain building: container tree -> one global alternation pattern.
//!
//! Every container contributes its pattern to a single `|`-joined regex.
//! Capturing groups are namespaced as `<ContainerName>_<group>` so the
//! merged pattern stays unambiguous, and a parallel group map records where
//! each namespaced group lands: the owning runtime node, the raw attribute
//! name, and the dotted logical path used by the output tree.
//!
//! Runtime nodes live in a flat arena indexed by [`NodeId`]; sibling
//! containers that declare the same `representative` share one node (their
//! diagnostic patterns are concatenated, their assumption registries merged
//! with the later container winning on equal triggers, and their
//! `infer_type` flags must agree). All configuration errors surface here,
//! before any input is scanned.

use std::collections::BTreeMap;

use regex::Regex;

use crate::assume::{Assumptions, CompiledAssumptions};
use crate::error::{Error, Result};
use crate::schema::Container;
use crate::value::Value;

pub(crate) type NodeId = usize;

/// Materialized counterpart of a container, holding the attribute slots
/// that captured values are merged into. Tree structure lives in the group
/// map's dotted paths; the node itself only needs its conversion settings
/// and slots.
#[derive(Debug, Clone)]
pub(crate) struct RuntimeNode {
    /// Merged pattern of every container attached here. Diagnostic only;
    /// matching always runs on the global alternation.
    #[allow(dead_code)]
    pub pattern: String,
    pub infer_type: bool,
    pub actions: CompiledAssumptions,
    /// Attribute slots, unset until the scanner merges a first value.
    pub attrs: BTreeMap<String, Option<Value>>,
}

/// Where a namespaced capturing group delivers its values.
#[derive(Debug, Clone)]
pub(crate) struct GroupTarget {
    pub node: NodeId,
    pub attr: String,
    pub path: String,
}

/// A compiled container tree: the global pattern, the node arena and the
/// group map. Immutable; reusable across any number of parses.
#[derive(Debug)]
pub struct Chain {
    pattern: String,
    regex: Regex,
    pub(crate) nodes: Vec<RuntimeNode>,
    pub(crate) groups: BTreeMap<String, GroupTarget>,
}

impl Chain {
    /// The global alternation pattern (namespaced groups, trailing
    /// alternator trimmed).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Flatten `root` and its sub-containers into a [`Chain`].
pub(crate) fn compile(root: &Container) -> Result<Chain> {
    let mut builder = ChainBuilder::default();

    // The root is materialized first so a pattern on the root container
    // contributes attributes directly onto the session.
    builder.nodes.push(BuildNode {
        name: root.representative.clone(),
        prefix: root.representative.clone(),
        label: root.name.clone(),
        pattern: root.pattern.clone(),
        infer_type: root.infer_type,
        assumptions: root.assumptions.clone(),
        attrs: Vec::new(),
        children: BTreeMap::new(),
    });
    builder.register_groups(root, 0)?;
    builder.walk(&root.sub_containers, 0)?;
    builder.finish()
}

/// Arena node under construction; frozen into a [`RuntimeNode`] once the
/// whole tree has been walked.
#[derive(Debug)]
struct BuildNode {
    name: String,
    prefix: String,
    /// Name used in error messages: the dotted prefix, or the root
    /// container's name for the session root.
    label: String,
    pattern: String,
    infer_type: bool,
    assumptions: Assumptions,
    attrs: Vec<String>,
    children: BTreeMap<String, NodeId>,
}

#[derive(Debug, Default)]
struct ChainBuilder {
    nodes: Vec<BuildNode>,
    groups: BTreeMap<String, GroupTarget>,
    patterns: Vec<String>,
}

impl ChainBuilder {
    /// Depth-first, pre-order walk: attach each container at this level,
    /// then immediately descend into its sub-containers.
    fn walk(&mut self, containers: &[Container], parent: NodeId) -> Result<()> {
        for container in containers {
            let (node, merged) = self.attach(container, parent)?;
            let assumptions = container.assumptions.merged_into(&self.nodes[node].assumptions);
            self.nodes[node].assumptions = assumptions;
            self.register_groups_merged(container, node, merged)?;
            if self.nodes[node].infer_type != container.infer_type {
                return Err(Error::InferTypeConflict {
                    container: container.name.clone(),
                    representative: self.nodes[node].name.clone(),
                });
            }
            self.walk(&container.sub_containers, node)?;
        }
        Ok(())
    }

    /// Resolve the runtime node a container's attributes live on: the
    /// parent itself for an empty representative, an existing sibling node
    /// for a shared representative (the merge case, flagged in the second
    /// tuple slot), or a freshly created child node.
    fn attach(&mut self, container: &Container, parent: NodeId) -> Result<(NodeId, bool)> {
        if container.representative.is_empty() {
            return Ok((parent, false));
        }

        if let Some(&existing) = self.nodes[parent].children.get(&container.representative) {
            if !container.pattern.is_empty() && self.nodes[existing].pattern != container.pattern {
                let node = &mut self.nodes[existing];
                if node.pattern.is_empty() {
                    node.pattern = container.pattern.clone();
                } else {
                    node.pattern.push('|');
                    node.pattern.push_str(&container.pattern);
                }
            }
            return Ok((existing, true));
        }

        // A representative may not shadow an attribute already claimed on
        // the parent; the leaf path of one container must never be an
        // interior level of another.
        if self.nodes[parent].attrs.iter().any(|attr| attr == &container.representative) {
            return Err(Error::GroupCollision {
                group: container.representative.clone(),
                node: self.nodes[parent].label.clone(),
            });
        }

        let id = self.nodes.len();
        let parent_node = &self.nodes[parent];
        let prefix = join_dotted(&parent_node.prefix, &container.representative);
        let assumptions = parent_node.assumptions.clone();
        self.nodes.push(BuildNode {
            name: container.representative.clone(),
            label: prefix.clone(),
            prefix,
            pattern: container.pattern.clone(),
            infer_type: container.infer_type,
            assumptions,
            attrs: Vec::new(),
            children: BTreeMap::new(),
        });
        self.nodes[parent].children.insert(container.representative.clone(), id);
        Ok((id, false))
    }

    /// Namespace the container's capturing groups, append the renamed
    /// pattern to the global buffer and record one group-map entry per
    /// group.
    fn register_groups(&mut self, container: &Container, node: NodeId) -> Result<()> {
        self.register_groups_merged(container, node, false)
    }

    /// Like [`register_groups`](Self::register_groups), but aware of the
    /// sibling-merge case: containers merged onto one node by a shared
    /// representative may target the same attribute (their values
    /// accumulate), while any other raw name collision is fatal.
    fn register_groups_merged(&mut self, container: &Container, node: NodeId, merged: bool) -> Result<()> {
        if container.pattern.is_empty() {
            return Ok(());
        }

        let group_marker = regex!(r"\?P<(\w+)>");
        let names: Vec<String> =
            group_marker.captures_iter(&container.pattern).map(|caps| caps[1].to_string()).collect();
        if names.is_empty() {
            return Err(Error::MissingCaptureGroup {
                container: container.name.clone(),
                pattern: container.pattern.clone(),
            });
        }

        let mut renamed = container.pattern.clone();
        for name in &names {
            renamed = renamed
                .replace(&format!("(?P<{name}>"), &format!("(?P<{}_{name}>", container.name));
        }
        self.patterns.push(renamed);

        for name in names {
            let (label, prefix) =
                (self.nodes[node].label.clone(), self.nodes[node].prefix.clone());
            // A group may never shadow a child level, and may only repeat
            // an existing attribute when siblings were merged by a shared
            // representative.
            if self.nodes[node].children.contains_key(&name) {
                return Err(Error::GroupCollision { group: name, node: label });
            }
            let repeated = self.nodes[node].attrs.contains(&name);
            if repeated && !merged {
                return Err(Error::GroupCollision { group: name, node: label });
            }
            let group = format!("{}_{name}", container.name);
            if self.groups.contains_key(&group) {
                return Err(Error::GroupCollision { group, node: label });
            }
            let path = join_dotted(&prefix, &name);
            if !repeated {
                self.nodes[node].attrs.push(name.clone());
            }
            self.groups.insert(group, GroupTarget { node, attr: name, path });
        }
        Ok(())
    }

    fn finish(self) -> Result<Chain> {
        let pattern = self.patterns.join("|");
        let regex = Regex::new(&pattern)?;
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| {
                Ok(RuntimeNode {
                    pattern: node.pattern,
                    infer_type: node.infer_type,
                    actions: node.assumptions.compile()?,
                    attrs: node.attrs.into_iter().map(|attr| (attr, None)).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Chain { pattern, regex, nodes, groups: self.groups })
    }
}

/// Join dotted path segments, skipping empty ones.
fn join_dotted(prefix: &str, leaf: &str) -> String {
    if prefix.is_empty() { leaf.to_string() } else { format!("{prefix}.{leaf}") }
}
