// Copyright 2025 Cowboy AI, LLC.

//! Objects, slots and prototype delegation
//!
//! Every participant in the algebra is an [`Object`] reached through an
//! [`ObjectRef`] handle: receivers, metaobjects, behaviour definitions and
//! the private contexts created by encapsulation. An object owns an ordered
//! table of named [`Slot`]s and may delegate lookups to a single prototype.
//!
//! Objects also carry a sidecar table of private contexts keyed by
//! [`EncapsulationId`]. The table is never exposed as slots, so nothing that
//! walks an object's keys can reach encapsulated state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::debug;

use crate::errors::{MetaobjectError, MetaobjectResult};
use crate::identifiers::{EncapsulationId, ObjectId};
use crate::method::Method;
use crate::value::{Outcome, Value};

/// Contents of a named slot
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// The slot holds a value (data, object or method)
    Defined(Value),
    /// The name is declared but nothing has been provided yet
    Declared,
}

impl Slot {
    /// Borrow the method, if this slot holds one
    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Slot::Defined(Value::Method(method)) => Some(method),
            _ => None,
        }
    }

    /// Borrow the value, if defined
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Defined(value) => Some(value),
            Slot::Declared => None,
        }
    }

    /// True for the no-value marker
    pub fn is_declared(&self) -> bool {
        matches!(self, Slot::Declared)
    }

    /// True if the slot holds a method
    pub fn is_method(&self) -> bool {
        self.as_method().is_some()
    }
}

impl From<Method> for Slot {
    fn from(method: Method) -> Self {
        Slot::Defined(Value::Method(method))
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Defined(value)
    }
}

/// Object storage behind an [`ObjectRef`]
pub struct Object {
    id: ObjectId,
    prototype: Option<ObjectRef>,
    slots: RwLock<IndexMap<String, Slot>>,
    frozen: AtomicBool,
    owner: Option<Weak<Object>>,
    contexts: DashMap<EncapsulationId, ObjectRef>,
}

/// Shared handle to an [`Object`]
///
/// Cloning the handle does not clone the object. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

/// Non-owning handle to an object, for wrappers that must not keep it alive
#[derive(Clone)]
pub(crate) struct WeakObjectRef {
    id: ObjectId,
    object: Weak<Object>,
}

impl WeakObjectRef {
    /// The object, or [`MetaobjectError::ReceiverDropped`] once it is gone
    pub(crate) fn upgrade(&self) -> MetaobjectResult<ObjectRef> {
        self.object
            .upgrade()
            .map(ObjectRef)
            .ok_or_else(|| MetaobjectError::ReceiverDropped(self.id.to_string()))
    }
}

impl ObjectRef {
    /// Create an empty object with no prototype
    pub fn new() -> Self {
        Self::from_parts(None, IndexMap::new(), None)
    }

    /// Create an empty object delegating lookups to `prototype`
    pub fn with_prototype(prototype: &ObjectRef) -> Self {
        Self::from_parts(Some(prototype.clone()), IndexMap::new(), None)
    }

    /// Start building a metaobject
    pub fn builder() -> MetaobjectBuilder {
        MetaobjectBuilder::default()
    }

    pub(crate) fn from_parts(
        prototype: Option<ObjectRef>,
        slots: IndexMap<String, Slot>,
        owner: Option<&ObjectRef>,
    ) -> Self {
        ObjectRef(Arc::new(Object {
            id: ObjectId::new(),
            prototype,
            slots: RwLock::new(slots),
            frozen: AtomicBool::new(false),
            owner: owner.map(|o| Arc::downgrade(&o.0)),
            contexts: DashMap::new(),
        }))
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Slot>> {
        self.0.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Slot>> {
        self.0.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identity of this object
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef {
            id: self.id(),
            object: Arc::downgrade(&self.0),
        }
    }

    /// Direct delegation ancestor
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.prototype.clone()
    }

    /// True if `ancestor` appears anywhere on this object's prototype chain
    pub fn has_ancestor(&self, ancestor: &ObjectRef) -> bool {
        let mut current = self.prototype();
        while let Some(object) = current {
            if object.ptr_eq(ancestor) {
                return true;
            }
            current = object.prototype();
        }
        false
    }

    /// The receiver a context belongs to, if this object is a live context
    pub fn owner(&self) -> Option<ObjectRef> {
        self.0.owner.as_ref().and_then(Weak::upgrade).map(ObjectRef)
    }

    /// Look up a slot on this object or its ancestors
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        if let Some(slot) = self.own_slot(name) {
            return Some(slot);
        }
        self.0.prototype.as_ref().and_then(|p| p.lookup(name))
    }

    /// Look up a slot on this object only
    pub fn own_slot(&self, name: &str) -> Option<Slot> {
        self.read().get(name).cloned()
    }

    /// True if this object itself has a slot named `name`
    pub fn has_own(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Own slot names in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Own slots in insertion order
    pub fn own_slots(&self) -> Vec<(String, Slot)> {
        self.read()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect()
    }

    /// Names of own slots holding methods
    pub fn method_names(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter(|(_, slot)| slot.is_method())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Names of own slots that are declared but unprovided
    pub fn declared_names(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter(|(_, slot)| slot.is_declared())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Defined value visible through this object, including inherited ones
    pub fn get_value(&self, name: &str) -> Option<Value> {
        match self.lookup(name) {
            Some(Slot::Defined(value)) => Some(value),
            _ => None,
        }
    }

    /// Own or inherited method
    pub fn get_method(&self, name: &str) -> Option<Method> {
        self.lookup(name).and_then(|slot| slot.as_method().cloned())
    }

    /// Assign a value to an own slot
    pub fn set(&self, name: &str, value: impl Into<Value>) -> MetaobjectResult<()> {
        self.define(name, Slot::Defined(value.into()))
    }

    /// Install a method under `name`
    pub fn set_method(&self, name: &str, method: Method) -> MetaobjectResult<()> {
        self.define(name, Slot::from(method))
    }

    /// Declare `name` as an unprovided dependency
    pub fn declare(&self, name: &str) -> MetaobjectResult<()> {
        self.define(name, Slot::Declared)
    }

    /// Write an own slot
    ///
    /// # Errors
    ///
    /// Returns [`MetaobjectError::Frozen`] if the object has been frozen.
    pub fn define(&self, name: &str, slot: Slot) -> MetaobjectResult<()> {
        if self.is_frozen() {
            return Err(MetaobjectError::Frozen {
                name: name.to_string(),
            });
        }
        self.write().insert(name.to_string(), slot);
        Ok(())
    }

    /// Delete an own slot, returning what it held
    pub fn remove(&self, name: &str) -> MetaobjectResult<Option<Slot>> {
        if self.is_frozen() {
            return Err(MetaobjectError::Frozen {
                name: name.to_string(),
            });
        }
        Ok(self.write().shift_remove(name))
    }

    /// Close the object for modification and extension
    pub fn freeze(&self) {
        self.0.frozen.store(true, Ordering::Release);
    }

    /// Check whether [`freeze`](Self::freeze) has been called
    pub fn is_frozen(&self) -> bool {
        self.0.frozen.load(Ordering::Acquire)
    }

    /// Invoke the method `name` with this object as the receiver
    ///
    /// Declared but unprovided names answer with `NoOpinion`.
    pub fn send(&self, name: &str, args: &[Value]) -> MetaobjectResult<Outcome> {
        match self.lookup(name) {
            Some(Slot::Defined(Value::Method(method))) => method.call(self, args),
            Some(Slot::Declared) => {
                debug!(object = %self.id(), method = name, "unprovided dependency invoked");
                Ok(Outcome::NoOpinion)
            }
            Some(Slot::Defined(_)) => Err(MetaobjectError::NotAMethod(name.to_string())),
            None => Err(MetaobjectError::MethodNotFound(name.to_string())),
        }
    }

    /// Fetch the context stored under `key`, creating it with `create` if absent
    ///
    /// Check-then-create happens under the sidecar shard lock, so concurrent
    /// callers always observe the same, fully built context.
    pub(crate) fn context_for(
        &self,
        key: EncapsulationId,
        create: impl FnOnce() -> ObjectRef,
    ) -> ObjectRef {
        self.0.contexts.entry(key).or_insert_with(create).clone()
    }

    /// Number of private contexts attached to this object
    pub fn context_count(&self) -> usize {
        self.0.contexts.len()
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id())
            .field("keys", &self.keys())
            .field("prototype", &self.0.prototype.as_ref().map(ObjectRef::id))
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

/// Builder for metaobjects and behaviour definitions
///
/// # Example
///
/// ```
/// use cim_metaobject::{ObjectRef, Outcome};
///
/// let greeter = ObjectRef::builder()
///     .method("greet", |_, _| Ok(Outcome::value("hello")))
///     .declare("notify")
///     .build();
///
/// assert_eq!(greeter.keys(), vec!["greet", "notify"]);
/// ```
#[derive(Default)]
pub struct MetaobjectBuilder {
    prototype: Option<ObjectRef>,
    slots: IndexMap<String, Slot>,
}

impl MetaobjectBuilder {
    /// Delegate lookups of the built object to `prototype`
    pub fn prototype(mut self, prototype: &ObjectRef) -> Self {
        self.prototype = Some(prototype.clone());
        self
    }

    /// Add a method from a closure
    pub fn method<F>(self, name: &str, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> MetaobjectResult<Outcome> + Send + Sync + 'static,
    {
        self.slot(name, Slot::from(Method::new(body)))
    }

    /// Add an existing method
    pub fn with_method(self, name: &str, method: Method) -> Self {
        self.slot(name, Slot::from(method))
    }

    /// Add a value
    pub fn value(self, name: &str, value: impl Into<Value>) -> Self {
        self.slot(name, Slot::Defined(value.into()))
    }

    /// Declare an unprovided dependency
    pub fn declare(self, name: &str) -> Self {
        self.slot(name, Slot::Declared)
    }

    /// Add a raw slot
    pub fn slot(mut self, name: &str, slot: Slot) -> Self {
        self.slots.insert(name.to_string(), slot);
        self
    }

    /// Build the object
    pub fn build(self) -> ObjectRef {
        ObjectRef::from_parts(self.prototype, self.slots, None)
    }
}
