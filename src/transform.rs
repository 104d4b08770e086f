// Copyright 2025 Cowboy AI, LLC.

//! Transformations deriving a new metaobject from an existing one
//!
//! The source metaobject is never modified. The derived metaobject delegates
//! to the same prototype and carries the same slots in the same order, with
//! every method passed through the transformation.

use tracing::debug;

use crate::method::Method;
use crate::object::{ObjectRef, Slot};
use crate::value::{Outcome, Value};

/// Derive a metaobject whose methods are `decorate(name, original)`
///
/// Declarations and data slots are carried over unchanged.
pub fn transform_methods<F>(metaobject: &ObjectRef, decorate: F) -> ObjectRef
where
    F: Fn(&str, Method) -> Method,
{
    let slots = metaobject
        .own_slots()
        .into_iter()
        .map(|(name, slot)| {
            let slot = match slot {
                Slot::Defined(Value::Method(method)) => Slot::from(decorate(&name, method)),
                other => other,
            };
            (name, slot)
        })
        .collect();
    ObjectRef::from_parts(metaobject.prototype(), slots, None)
}

/// Derive a metaobject whose methods return the receiver instead of `NoOpinion`
///
/// # Example
///
/// ```
/// use cim_metaobject::{fluent_by_default, ObjectRef, Outcome};
///
/// let quiet = ObjectRef::builder().method("touch", |_, _| Ok(Outcome::NoOpinion)).build();
/// let fluent = fluent_by_default(&quiet);
///
/// let receiver = ObjectRef::with_prototype(&fluent);
/// assert!(receiver.send("touch", &[]).unwrap().refers_to(&receiver));
/// ```
pub fn fluent_by_default(metaobject: &ObjectRef) -> ObjectRef {
    let fluent = transform_methods(metaobject, |_, method| {
        Method::new(move |this, args| match method.call(this, args)? {
            Outcome::NoOpinion => Ok(Outcome::value(this)),
            opinion => Ok(opinion),
        })
    });
    debug!(source = %metaobject.id(), derived = %fluent.id(), "fluent metaobject derived");
    fluent
}
