// Copyright 2025 Cowboy AI, LLC.

//! Composition algebra
//!
//! [`compose_metaobjects`] merges N independently authored metaobjects into a
//! new one. Inputs are only read, never written, so each remains usable on
//! its own afterwards.
//!
//! ## Algorithm
//!
//! 1. **Prototype seed**: the prototype of the first input that has one.
//!    Every other prototype must be the seed or descend from it, otherwise
//!    composition fails before anything is built.
//! 2. **Group**: collect each name's slots across inputs, in input order,
//!    names ordered by first appearance.
//! 3. **Resolve**: a group of only declarations stays declared. Otherwise
//!    declarations are dropped; all-method groups go through the protocol,
//!    all-data groups keep the last value, and mixed groups are rejected.
//! 4. **Build**: a fresh object delegating to the seed.
//!
//! With the default [`OrderProtocol`] every merged method runs all
//! implementations first to last, and the last one that returns an opinion
//! decides the result.

use indexmap::IndexMap;
use tracing::debug;

use crate::errors::{MetaobjectError, MetaobjectResult};
use crate::object::{ObjectRef, Slot};
use crate::protocol::{OrderProtocol, Protocol};
use crate::value::Value;

/// Compose metaobjects under [`OrderProtocol`]
///
/// # Example
///
/// ```
/// use cim_metaobject::{compose_metaobjects, ObjectRef, Outcome};
///
/// let quiet = ObjectRef::builder().method("m", |_, _| Ok(Outcome::NoOpinion)).build();
/// let loud = ObjectRef::builder().method("m", |_, _| Ok(Outcome::value("V"))).build();
///
/// let composed = compose_metaobjects(&[quiet, loud]).unwrap();
/// let receiver = ObjectRef::with_prototype(&composed);
/// assert_eq!(receiver.send("m", &[]).unwrap(), Outcome::value("V"));
/// ```
pub fn compose_metaobjects(metaobjects: &[ObjectRef]) -> MetaobjectResult<ObjectRef> {
    compose_with(&OrderProtocol, metaobjects)
}

/// Compose metaobjects, merging shared method names with `protocol`
///
/// # Errors
///
/// - [`MetaobjectError::Configuration`] if `metaobjects` is empty
/// - [`MetaobjectError::IncompatiblePrototypes`] if prototypes are unrelated
/// - [`MetaobjectError::AmbiguousMerge`] if a name mixes methods and data
pub fn compose_with<P>(protocol: &P, metaobjects: &[ObjectRef]) -> MetaobjectResult<ObjectRef>
where
    P: Protocol + ?Sized,
{
    if metaobjects.is_empty() {
        return Err(MetaobjectError::configuration(
            "composition needs at least one metaobject",
        ));
    }

    let seed = prototype_seed(metaobjects)?;

    let mut groups: IndexMap<String, Vec<Slot>> = IndexMap::new();
    for metaobject in metaobjects {
        for (name, slot) in metaobject.own_slots() {
            groups.entry(name).or_default().push(slot);
        }
    }

    let mut slots = IndexMap::with_capacity(groups.len());
    for (name, group) in groups {
        let slot = resolve_group(protocol, &name, group)?;
        slots.insert(name, slot);
    }

    let composed = ObjectRef::from_parts(seed, slots, None);
    debug!(
        composed = %composed.id(),
        inputs = metaobjects.len(),
        methods = composed.method_names().len(),
        dependencies = composed.declared_names().len(),
        "metaobjects composed"
    );
    Ok(composed)
}

/// Prototype the composed object delegates to
///
/// `None` when no input has a prototype.
pub fn prototype_seed(metaobjects: &[ObjectRef]) -> MetaobjectResult<Option<ObjectRef>> {
    let mut prototypes = metaobjects.iter().filter_map(ObjectRef::prototype);
    let Some(seed) = prototypes.next() else {
        return Ok(None);
    };
    for other in prototypes {
        if other.ptr_eq(&seed) || other.has_ancestor(&seed) {
            continue;
        }
        return Err(MetaobjectError::IncompatiblePrototypes {
            seed: seed.id().to_string(),
            other: other.id().to_string(),
        });
    }
    Ok(Some(seed))
}

fn resolve_group<P>(protocol: &P, name: &str, group: Vec<Slot>) -> MetaobjectResult<Slot>
where
    P: Protocol + ?Sized,
{
    let defined: Vec<Value> = group
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Defined(value) => Some(value),
            Slot::Declared => None,
        })
        .collect();

    let method_count = defined.iter().filter(|value| value.is_method()).count();
    match defined.len() {
        0 => Ok(Slot::Declared),
        n if n == method_count => {
            let methods = defined
                .into_iter()
                .filter_map(|value| match value {
                    Value::Method(method) => Some(method),
                    _ => None,
                })
                .collect();
            Ok(Slot::from(protocol.merge(name, methods)))
        }
        _ if method_count > 0 => Err(MetaobjectError::AmbiguousMerge {
            name: name.to_string(),
        }),
        _ => Ok(defined.into_iter().last().map(Slot::Defined).unwrap_or(Slot::Declared)),
    }
}
