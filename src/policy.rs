// Copyright 2025 Cowboy AI, LLC.

//! Policy combinators and mixin-with-policy
//!
//! A [`Policy`] decides how an *existing* method already on a receiver and an
//! *incoming* method from a provider are sequenced when a mixin brings a
//! second implementation for the same name:
//!
//! | Policy | Call semantics |
//! |---|---|
//! | `overwrite` | run only the incoming method |
//! | `discard` | run only the existing method |
//! | `before` | existing, then incoming; incoming's opinion wins |
//! | `after` | incoming, then existing; incoming's opinion wins |
//! | `around` | existing runs with the incoming method bound as its first argument |
//!
//! Policies never capture call-time arguments; they only build a new method
//! out of the two they are given.
//!
//! [`mixin_with_policy`] layers a provider onto a receiver in place. It is
//! meant for one-shot layering of a single object; freeze the receiver once
//! layering is done if it should not change afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::errors::{MetaobjectError, MetaobjectResult};
use crate::method::Method;
use crate::object::{ObjectRef, Slot};
use crate::value::Value;

/// Method name that selects every name not listed explicitly
pub const WILDCARD: &str = "*";

/// Strategy for merging two implementations of the same method
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Incoming replaces existing
    #[default]
    Overwrite,
    /// Existing is kept, incoming ignored
    Discard,
    /// Existing runs first
    Before,
    /// Incoming runs first
    After,
    /// Existing wraps incoming
    Around,
}

impl Policy {
    /// All policies in declaration order
    pub const ALL: [Policy; 5] = [
        Policy::Overwrite,
        Policy::Discard,
        Policy::Before,
        Policy::After,
        Policy::Around,
    ];

    /// Lowercase policy name
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Overwrite => "overwrite",
            Policy::Discard => "discard",
            Policy::Before => "before",
            Policy::After => "after",
            Policy::Around => "around",
        }
    }

    /// Combine `existing` with `incoming` into a single method
    pub fn combine(self, existing: &Method, incoming: &Method) -> Method {
        match self {
            Policy::Overwrite => incoming.clone(),
            Policy::Discard => existing.clone(),
            Policy::Before => {
                let (first, second) = (existing.clone(), incoming.clone());
                Method::new(move |this, args| {
                    let existing_outcome = first.call(this, args)?;
                    let incoming_outcome = second.call(this, args)?;
                    Ok(incoming_outcome.or(existing_outcome))
                })
            }
            Policy::After => {
                let (first, second) = (incoming.clone(), existing.clone());
                Method::new(move |this, args| {
                    let incoming_outcome = first.call(this, args)?;
                    let existing_outcome = second.call(this, args)?;
                    Ok(incoming_outcome.or(existing_outcome))
                })
            }
            Policy::Around => {
                let (outer, inner) = (existing.clone(), incoming.clone());
                Method::new(move |this, args| {
                    let mut wrapped = Vec::with_capacity(args.len() + 1);
                    wrapped.push(Value::Method(inner.bind(this)));
                    wrapped.extend_from_slice(args);
                    outer.call(this, &wrapped)
                })
            }
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = MetaobjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| MetaobjectError::configuration(format!("unknown policy: {s}")))
    }
}

/// One method name or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MethodSelector {
    /// A single name, or [`WILDCARD`]
    One(String),
    /// Several names
    Many(Vec<String>),
}

impl MethodSelector {
    fn names(&self) -> Vec<&str> {
        match self {
            MethodSelector::One(name) => vec![name.as_str()],
            MethodSelector::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Which policy applies to which method names
///
/// Serializes as a map from policy name to method selector:
///
/// ```
/// use cim_metaobject::{Policy, PolicyAssignment};
///
/// let assignment: PolicyAssignment =
///     serde_json::from_str(r#"{"after": ["render", "save"], "discard": "*"}"#).unwrap();
/// let mixin_policies = assignment.resolve().unwrap();
/// assert_eq!(mixin_policies.policy_for("render"), Policy::After);
/// assert_eq!(mixin_policies.policy_for("other"), Policy::Discard);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PolicyAssignment {
    entries: BTreeMap<Policy, MethodSelector>,
}

impl PolicyAssignment {
    /// Empty assignment: every clash is overwritten
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `policy` to each of `names`
    pub fn assign<I, S>(mut self, policy: Policy, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(existing) = self.entries.remove(&policy) {
            let mut merged: Vec<String> = existing.names().into_iter().map(String::from).collect();
            merged.append(&mut names);
            names = merged;
        }
        self.entries.insert(policy, MethodSelector::Many(names));
        self
    }

    /// Use `policy` for every name not assigned explicitly
    pub fn default_policy(self, policy: Policy) -> Self {
        self.assign(policy, [WILDCARD])
    }

    /// Flatten into a name lookup table
    ///
    /// # Errors
    ///
    /// [`MetaobjectError::Configuration`] if a name (or the wildcard) is
    /// assigned to more than one policy.
    pub fn resolve(&self) -> MetaobjectResult<ResolvedPolicies> {
        let mut by_name: HashMap<String, Policy> = HashMap::new();
        let mut default = None;
        for (policy, selector) in &self.entries {
            for name in selector.names() {
                if name == WILDCARD {
                    if let Some(previous) = default.replace(*policy) {
                        if previous != *policy {
                            return Err(MetaobjectError::configuration(format!(
                                "wildcard assigned to both {previous} and {policy}"
                            )));
                        }
                    }
                    continue;
                }
                if let Some(previous) = by_name.insert(name.to_string(), *policy) {
                    if previous != *policy {
                        return Err(MetaobjectError::configuration(format!(
                            "'{name}' assigned to both {previous} and {policy}"
                        )));
                    }
                }
            }
        }
        Ok(ResolvedPolicies {
            by_name,
            default: default.unwrap_or_default(),
        })
    }
}

/// A [`PolicyAssignment`] flattened for lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPolicies {
    by_name: HashMap<String, Policy>,
    default: Policy,
}

impl ResolvedPolicies {
    /// Exact name, then wildcard, then `overwrite`
    pub fn policy_for(&self, name: &str) -> Policy {
        self.by_name.get(name).copied().unwrap_or(self.default)
    }
}

/// A provider paired with its policies, ready to layer onto receivers
#[derive(Debug, Clone)]
pub struct Mixin {
    provider: ObjectRef,
    policies: ResolvedPolicies,
}

impl Mixin {
    /// Policy that applies to `name`
    pub fn policy_for(&self, name: &str) -> Policy {
        self.policies.policy_for(name)
    }

    /// Layer the provider onto `receiver` in place and return it
    ///
    /// Every slot is checked before any is written, so a failing mixin
    /// leaves the receiver untouched. On a frozen receiver the first planned
    /// write fails; a provider that plans no writes succeeds.
    ///
    /// # Errors
    ///
    /// - [`MetaobjectError::AmbiguousMerge`] if a method meets plain data
    /// - [`MetaobjectError::Frozen`] if the receiver is frozen
    pub fn apply(&self, receiver: &ObjectRef) -> MetaobjectResult<ObjectRef> {
        let mut plan = Vec::new();
        for (name, incoming) in self.provider.own_slots() {
            let existing = receiver.lookup(&name);
            let slot = match (existing, incoming) {
                (None | Some(Slot::Declared), incoming) => incoming,
                (Some(_), Slot::Declared) => continue,
                (
                    Some(Slot::Defined(Value::Method(existing))),
                    Slot::Defined(Value::Method(incoming)),
                ) => {
                    let policy = self.policy_for(&name);
                    trace!(method = %name, %policy, "combining methods");
                    Slot::from(policy.combine(&existing, &incoming))
                }
                (Some(Slot::Defined(existing)), Slot::Defined(incoming))
                    if existing.is_method() || incoming.is_method() =>
                {
                    return Err(MetaobjectError::AmbiguousMerge { name });
                }
                (Some(Slot::Defined(_)), incoming) => incoming,
            };
            plan.push((name, slot));
        }

        for (name, slot) in plan {
            receiver.define(&name, slot)?;
        }
        debug!(receiver = %receiver.id(), provider = %self.provider.id(), "mixin applied");
        Ok(receiver.clone())
    }

    /// Turn into a plain `receiver -> receiver` function
    pub fn into_fn(self) -> impl Fn(&ObjectRef) -> MetaobjectResult<ObjectRef> {
        move |receiver| self.apply(receiver)
    }
}

/// Prepare `provider` for layering under `assignment`
///
/// # Errors
///
/// [`MetaobjectError::Configuration`] if the assignment is contradictory.
pub fn mixin_with_policy(
    provider: &ObjectRef,
    assignment: &PolicyAssignment,
) -> MetaobjectResult<Mixin> {
    Ok(Mixin {
        provider: provider.clone(),
        policies: assignment.resolve()?,
    })
}
