// Copyright 2025 Cowboy AI, LLC.

//! Forwarding and delegation primitives
//!
//! All three primitives install wrapper methods on a receiver and return it.
//! They differ in which object a routed call runs against and when the
//! target is resolved:
//!
//! | Primitive | Runs against | Target resolved |
//! |---|---|---|
//! | `forward` | the metaobject | fixed at attach time |
//! | `delegate` | the receiver | fixed at attach time |
//! | `delegate_to_own` | the receiver | read from a receiver property on every call |
//!
//! Wrappers stay bound to the receiver they were attached to, even when
//! reached through another object (a child delegating to the receiver, or a
//! metaobject derived from it). They hold the receiver weakly; calling one
//! after the receiver is gone fails with
//! [`MetaobjectError::ReceiverDropped`].
//!
//! None of them create private state.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{MetaobjectError, MetaobjectResult};
use crate::method::Method;
use crate::object::ObjectRef;
use crate::value::Outcome;

/// Call-routing role for receivers
pub trait Delegating: Sized {
    /// Route `methods` to `metaobject`, running them against the metaobject
    fn forward(&self, metaobject: &ObjectRef, methods: Option<&[&str]>) -> MetaobjectResult<Self>;

    /// Route `methods` to `metaobject`, running them against the receiver
    fn delegate(&self, metaobject: &ObjectRef, methods: Option<&[&str]>)
        -> MetaobjectResult<Self>;

    /// Route `methods` to whatever object the receiver's `property` holds at call time
    fn delegate_to_own(&self, property: &str, methods: Option<&[&str]>) -> MetaobjectResult<Self>;
}

impl Delegating for ObjectRef {
    fn forward(&self, metaobject: &ObjectRef, methods: Option<&[&str]>) -> MetaobjectResult<Self> {
        forward(self, metaobject, methods)
    }

    fn delegate(
        &self,
        metaobject: &ObjectRef,
        methods: Option<&[&str]>,
    ) -> MetaobjectResult<Self> {
        delegate(self, metaobject, methods)
    }

    fn delegate_to_own(&self, property: &str, methods: Option<&[&str]>) -> MetaobjectResult<Self> {
        delegate_to_own(self, property, methods)
    }
}

/// Method names reachable on `object`, own names first, then inherited ones
fn reachable_method_names(object: &ObjectRef) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut current = Some(object.clone());
    while let Some(obj) = current {
        for (name, slot) in obj.own_slots() {
            if seen.insert(name.clone()) && slot.is_method() {
                names.push(name);
            }
        }
        current = obj.prototype();
    }
    names
}

fn resolve_methods(target: &ObjectRef, methods: Option<&[&str]>) -> MetaobjectResult<Vec<String>> {
    let names = match methods {
        Some([]) => {
            return Err(MetaobjectError::configuration("method list is empty"));
        }
        Some(list) => {
            for name in list {
                if target.get_method(name).is_none() {
                    return Err(MetaobjectError::configuration(format!(
                        "target {} has no method '{name}'",
                        target.id()
                    )));
                }
            }
            list.iter().map(|s| s.to_string()).collect()
        }
        None => reachable_method_names(target),
    };
    if names.is_empty() {
        return Err(MetaobjectError::configuration(format!(
            "target {} has no methods to route",
            target.id()
        )));
    }
    Ok(names)
}

fn own_target(receiver: &ObjectRef, property: &str) -> MetaobjectResult<ObjectRef> {
    receiver
        .get_value(property)
        .and_then(|value| value.as_object().cloned())
        .ok_or_else(|| {
            MetaobjectError::configuration(format!(
                "receiver {} has no object in property '{property}'",
                receiver.id()
            ))
        })
}

/// Install forwarding methods on `receiver`
///
/// Calls run against `metaobject`. A result that is the metaobject itself is
/// replaced by `receiver`.
///
/// # Errors
///
/// [`MetaobjectError::Configuration`] if the method list is empty, or names a
/// method the metaobject lacks.
pub fn forward(
    receiver: &ObjectRef,
    metaobject: &ObjectRef,
    methods: Option<&[&str]>,
) -> MetaobjectResult<ObjectRef> {
    let names = resolve_methods(metaobject, methods)?;
    let bound = receiver.downgrade();
    for name in &names {
        let target = metaobject.clone();
        let bound = bound.clone();
        let method_name = name.clone();
        let wrapper = Method::new(move |_, args| {
            let outcome = target.send(&method_name, args)?;
            if outcome.refers_to(&target) {
                return Ok(Outcome::value(bound.upgrade()?));
            }
            Ok(outcome)
        });
        receiver.set_method(name, wrapper)?;
    }
    debug!(receiver = %receiver.id(), target = %metaobject.id(), methods = ?names, "forwarding attached");
    Ok(receiver.clone())
}

/// Install delegating methods on `receiver`
///
/// Calls run the metaobject's implementation with `receiver` as `this`.
pub fn delegate(
    receiver: &ObjectRef,
    metaobject: &ObjectRef,
    methods: Option<&[&str]>,
) -> MetaobjectResult<ObjectRef> {
    let names = resolve_methods(metaobject, methods)?;
    let bound = receiver.downgrade();
    for name in &names {
        let target = metaobject.clone();
        let bound = bound.clone();
        let method_name = name.clone();
        let wrapper = Method::new(move |_, args| {
            let receiver = bound.upgrade()?;
            let method = target
                .get_method(&method_name)
                .ok_or_else(|| MetaobjectError::MethodNotFound(method_name.clone()))?;
            method.call(&receiver, args)
        });
        receiver.set_method(name, wrapper)?;
    }
    debug!(receiver = %receiver.id(), target = %metaobject.id(), methods = ?names, "delegation attached");
    Ok(receiver.clone())
}

/// Install late-bound delegating methods on `receiver`
///
/// The target is re-read from `receiver[property]` on every call, so
/// replacing the property swaps behaviour without re-wiring.
///
/// # Errors
///
/// [`MetaobjectError::Configuration`] if the property does not hold an object
/// at attach time, or the method list is empty or names a method that object
/// lacks. A property emptied after attaching fails the same way at call time.
pub fn delegate_to_own(
    receiver: &ObjectRef,
    property: &str,
    methods: Option<&[&str]>,
) -> MetaobjectResult<ObjectRef> {
    let current = own_target(receiver, property)?;
    let names = resolve_methods(&current, methods)?;
    let bound = receiver.downgrade();
    for name in &names {
        let bound = bound.clone();
        let property = property.to_string();
        let method_name = name.clone();
        let wrapper = Method::new(move |_, args| {
            let receiver = bound.upgrade()?;
            let target = own_target(&receiver, &property)?;
            let method = target
                .get_method(&method_name)
                .ok_or_else(|| MetaobjectError::MethodNotFound(method_name.clone()))?;
            method.call(&receiver, args)
        });
        receiver.set_method(name, wrapper)?;
    }
    debug!(receiver = %receiver.id(), property, methods = ?names, "own delegation attached");
    Ok(receiver.clone())
}

/// Build a fresh object that forwards `methods` to `base`
pub fn proxy(base: &ObjectRef, methods: Option<&[&str]>) -> MetaobjectResult<ObjectRef> {
    forward(&ObjectRef::new(), base, methods)
}
