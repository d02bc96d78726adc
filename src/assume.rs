//! Assumption registry: ordered trigger-pattern → converter rules.
//!
//! Every runtime node carries a registry. When the matcher captures a raw
//! string, the node's registry decides how to enrich it: each trigger is
//! matched against the *start* of the value, at most one trigger may fire
//! (two is a fatal ambiguity), and a value no trigger claims passes through
//! as a plain string.
//!
//! Registries compose down the container tree. A child registry that
//! `inherits` starts from its parent's effective rules and overrides
//! same-trigger entries with its own; a non-inheriting registry stands
//! alone. Merging happens at schema-compile time, where trigger patterns
//! are also compiled and validated (see [`Assumptions::compile`]).

use regex::Regex;

use crate::convert::Convert;
use crate::error::{Error, Result};
use crate::value::Value;

/// Ordered, mergeable trigger → converter rules.
#[derive(Debug, Clone)]
pub struct Assumptions {
    rules: Vec<(String, Convert)>,
    inherits: bool,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::generic()
    }
}

impl Assumptions {
    /// The generic base rules: signed integers, signed decimals, and
    /// case-insensitive none/null/nil tokens.
    pub fn generic() -> Self {
        Self::empty()
            .assume(r"^(\-?\d+)$", Convert::Int)
            .assume(r"^(\-?\d+\.\d+)$", Convert::Float)
            .assume(r"^((N|n)one)$|^NONE$|^((N|n)ull)$|^NULL$|^((N|n)il)$|^NIL$", Convert::Null)
    }

    /// A registry without any rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new(), inherits: true }
    }

    /// Add (or override) a rule. Later entries win over earlier entries
    /// with the same trigger pattern.
    pub fn assume(mut self, trigger: impl Into<String>, convert: impl Into<Convert>) -> Self {
        let trigger = trigger.into();
        let convert = convert.into();
        match self.rules.iter_mut().find(|(t, _)| *t == trigger) {
            Some(slot) => slot.1 = convert,
            None => self.rules.push((trigger, convert)),
        }
        self
    }

    /// Whether this registry folds in the rules of the registry above it in
    /// the container tree (default: true).
    pub fn inherits(mut self, inherits: bool) -> Self {
        self.inherits = inherits;
        self
    }

    /// The effective rule list, in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Convert)> {
        self.rules.iter().map(|(t, c)| (t.as_str(), c))
    }

    /// Merge this registry into `parent`'s effective rules.
    ///
    /// Own rules take precedence over inherited ones with the same trigger;
    /// without `inherits`, the parent is ignored entirely.
    pub(crate) fn merged_into(&self, parent: &Assumptions) -> Assumptions {
        if !self.inherits {
            return self.clone();
        }
        let mut merged = Assumptions { rules: parent.rules.clone(), inherits: self.inherits };
        for (trigger, convert) in &self.rules {
            merged = merged.assume(trigger.clone(), convert.clone());
        }
        merged
    }

    /// Compile every trigger pattern. An invalid trigger is a configuration
    /// error surfaced at schema-compile time.
    pub(crate) fn compile(&self) -> Result<CompiledAssumptions> {
        let rules = self
            .rules
            .iter()
            .map(|(trigger, convert)| Ok((Regex::new(trigger)?, convert.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledAssumptions { rules })
    }
}

impl From<Convert> for Assumptions {
    /// A single catch-all rule, handy for containers that convert every
    /// capture the same way.
    fn from(convert: Convert) -> Self {
        Self::empty().assume(".*", convert)
    }
}

/// A registry with pre-compiled triggers, owned by a runtime node.
#[derive(Debug, Clone)]
pub(crate) struct CompiledAssumptions {
    rules: Vec<(Regex, Convert)>,
}

impl CompiledAssumptions {
    /// Run the single matching converter on `value`.
    ///
    /// A trigger fires when its leftmost match starts at position zero
    /// (match-at-start semantics). More than one firing trigger is fatal;
    /// none returns the value as a plain string.
    pub fn call_action(&self, value: &str) -> Result<Value> {
        let mut hit: Option<&Convert> = None;
        for (trigger, convert) in &self.rules {
            if trigger.find(value).is_some_and(|m| m.start() == 0) {
                if hit.is_some() {
                    return Err(Error::AmbiguousAssumption { value: value.to_string() });
                }
                hit = Some(convert);
            }
        }
        match hit {
            Some(convert) => convert.apply(value),
            None => Ok(Value::Str(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(assumptions: &Assumptions, value: &str) -> Value {
        assumptions.compile().unwrap().call_action(value).unwrap()
    }

    #[test]
    fn generic_rules_infer_scalars() {
        let generic = Assumptions::generic();
        assert_eq!(call(&generic, "-2"), Value::Int(-2));
        assert_eq!(call(&generic, "5"), Value::Int(5));
        assert_eq!(call(&generic, "5.0"), Value::Float(5.0));
        assert_eq!(call(&generic, "-1.0"), Value::Float(-1.0));
        for token in ["None", "none", "NONE", "Null", "null", "NULL", "Nil", "nil", "NIL"] {
            assert_eq!(call(&generic, token), Value::Null, "{token}");
        }
        // Mixed-case variants outside the recognized spellings stay strings.
        assert_eq!(call(&generic, "NUll"), Value::Str("NUll".into()));
    }

    #[test]
    fn two_matching_triggers_are_ambiguous() {
        let ambiguous = Assumptions::empty().assume(r"\d+", Convert::Int).assume(r"^\d", Convert::Float);
        let err = ambiguous.compile().unwrap().call_action("42").unwrap_err();
        assert!(matches!(err, Error::AmbiguousAssumption { .. }));
    }

    #[test]
    fn triggers_match_at_start_only() {
        let anchored = Assumptions::empty().assume(r"\d", Convert::Int);
        assert_eq!(call(&anchored, "42"), Value::Int(42));
        // A match later in the value does not fire the trigger.
        assert_eq!(call(&anchored, "no 7"), Value::Str("no 7".into()));
    }

    #[test]
    fn child_rules_override_inherited_ones() {
        let parent = Assumptions::empty().assume(r"^\d+$", Convert::Int);
        let child = Assumptions::empty().assume(r"^\d+$", Convert::Float);
        let merged = child.merged_into(&parent);
        assert_eq!(call(&merged, "3"), Value::Float(3.0));
    }

    #[test]
    fn non_inheriting_registry_ignores_parent() {
        let parent = Assumptions::empty().assume(r"^\d+$", Convert::Int);
        let child = Assumptions::empty().inherits(false);
        let merged = child.merged_into(&parent);
        assert_eq!(call(&merged, "3"), Value::Str("3".into()));
    }

    #[test]
    fn invalid_trigger_fails_at_compile() {
        let broken = Assumptions::empty().assume("(unclosed", Convert::Int);
        assert!(matches!(broken.compile(), Err(Error::Pattern(_))));
    }
}
