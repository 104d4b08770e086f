// Copyright 2025 Cowboy AI, LLC.

//! Encapsulation engine
//!
//! [`encapsulate`] turns a behaviour definition into a frozen metaobject whose
//! public methods never run against the receiver directly. Each public method
//! resolves a private *context* for the receiver it was invoked on and runs
//! with that context as `this`.
//!
//! ## Contexts
//!
//! A context is created lazily, the first time any public method of the
//! encapsulation runs on a given receiver, and is stored in the receiver's
//! sidecar table under the encapsulation's [`EncapsulationId`]. It holds:
//!
//! - copies of every private method (names starting with the private prefix)
//! - a proxy for every public method and declared dependency, which
//!   re-dispatches to the receiver
//! - a weak back-reference to the receiver, see [`ObjectRef::owner`]
//!
//! Declared dependencies are public by nature: a declaration with a private
//! name could never be provided, so it is rejected as malformed.
//!
//! Fields written through `this` land on the context, so two receivers sharing
//! one encapsulated metaobject never see each other's state. The engine does
//! not initialise fields; a fresh context is empty until a method writes to it.
//!
//! ## Fluent returns
//!
//! When a public method returns its own context, the caller receives the
//! receiver instead, so chained calls keep working from the outside.
//!
//! ## Immutability
//!
//! Encapsulated metaobjects are frozen. Writing, adding or deleting a slot
//! fails with [`MetaobjectError::Frozen`].

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::EncapsulationConfig;
use crate::errors::{MetaobjectError, MetaobjectResult};
use crate::identifiers::EncapsulationId;
use crate::method::Method;
use crate::object::{ObjectRef, Slot};
use crate::value::{Outcome, Value};

/// Everything needed to build a context for one receiver
struct ContextBlueprint {
    private: IndexMap<String, Method>,
    proxied: Vec<String>,
}

impl ContextBlueprint {
    fn create_context(&self, key: EncapsulationId, receiver: &ObjectRef) -> ObjectRef {
        let mut slots = IndexMap::with_capacity(self.private.len() + self.proxied.len());
        for (name, method) in &self.private {
            slots.insert(name.clone(), Slot::from(method.clone()));
        }
        for name in &self.proxied {
            slots.insert(name.clone(), Slot::from(receiver_proxy(name)));
        }
        let context = ObjectRef::from_parts(None, slots, Some(receiver));
        trace!(encapsulation = %key, receiver = %receiver.id(), context = %context.id(), "context created");
        context
    }
}

/// Method that forwards a call made on a context to the context's receiver
fn receiver_proxy(name: &str) -> Method {
    let name = name.to_string();
    Method::new(move |context, args| {
        let receiver = context
            .owner()
            .ok_or_else(|| MetaobjectError::ReceiverDropped(context.id().to_string()))?;
        receiver.send(&name, args)
    })
}

fn public_wrapper(key: EncapsulationId, blueprint: Arc<ContextBlueprint>, method: Method) -> Method {
    Method::new(move |receiver, args| {
        let context = receiver.context_for(key, || blueprint.create_context(key, receiver));
        let outcome = method.call(&context, args)?;
        if outcome.refers_to(&context) {
            return Ok(Outcome::value(receiver));
        }
        Ok(outcome)
    })
}

/// Encapsulate a behaviour definition using the default configuration
pub fn encapsulate(behaviour: &ObjectRef) -> MetaobjectResult<ObjectRef> {
    encapsulate_with(behaviour, &EncapsulationConfig::default())
}

/// Encapsulate a behaviour definition
///
/// # Errors
///
/// - [`MetaobjectError::Configuration`] if `config` is invalid
/// - [`MetaobjectError::MalformedBehaviour`] if a slot holds data instead of
///   a method or declaration, or a declared dependency has a private name
pub fn encapsulate_with(
    behaviour: &ObjectRef,
    config: &EncapsulationConfig,
) -> MetaobjectResult<ObjectRef> {
    config.validate()?;

    let definition = behaviour.own_slots();
    let mut private = IndexMap::new();
    let mut proxied = Vec::new();

    for (name, slot) in &definition {
        match slot {
            Slot::Defined(Value::Method(method)) if config.is_private(name) => {
                private.insert(name.clone(), method.clone());
            }
            Slot::Declared if config.is_private(name) => {
                return Err(MetaobjectError::MalformedBehaviour(format!(
                    "'{name}' is a private declaration; nothing outside the context can provide it"
                )));
            }
            Slot::Defined(Value::Method(_)) | Slot::Declared => proxied.push(name.clone()),
            Slot::Defined(other) => {
                return Err(MetaobjectError::MalformedBehaviour(format!(
                    "'{name}' holds {} instead of a method",
                    other.kind()
                )));
            }
        }
    }

    let key = EncapsulationId::new();
    let private_count = private.len();
    let blueprint = Arc::new(ContextBlueprint { private, proxied });

    let mut slots = IndexMap::new();
    for (name, slot) in definition {
        match slot {
            Slot::Defined(Value::Method(method)) if !config.is_private(&name) => {
                let wrapper = public_wrapper(key, Arc::clone(&blueprint), method);
                slots.insert(name, Slot::from(wrapper));
            }
            Slot::Declared => {
                slots.insert(name, Slot::Declared);
            }
            _ => {}
        }
    }

    let encapsulated = ObjectRef::from_parts(None, slots, None);
    encapsulated.freeze();

    debug!(
        encapsulation = %key,
        metaobject = %encapsulated.id(),
        private = private_count,
        public = encapsulated.method_names().len(),
        dependencies = encapsulated.declared_names().len(),
        "behaviour encapsulated"
    );
    Ok(encapsulated)
}
