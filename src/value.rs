// Copyright 2025 Cowboy AI, LLC.

//! Values carried by slots, arguments and method results
//!
//! A [`Value`] is either plain data (JSON), a handle to another object, or a
//! method. Object and method values compare by identity, data by content.
//!
//! [`Outcome`] is what a method returns: either a value it takes
//! responsibility for, or [`Outcome::NoOpinion`] when it declines to own the
//! return value. Composition and the fluent transformations negotiate over
//! this sum type instead of an absent-value sentinel.

use crate::method::Method;
use crate::object::ObjectRef;

/// A value stored in a slot, passed as an argument, or returned from a method
#[derive(Clone, Debug)]
pub enum Value {
    /// Plain data
    Data(serde_json::Value),
    /// Handle to an object (receiver, metaobject or context)
    Object(ObjectRef),
    /// A callable method
    Method(Method),
}

impl Value {
    /// JSON null
    pub fn null() -> Self {
        Value::Data(serde_json::Value::Null)
    }

    /// Borrow the data payload, if any
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Borrow the object handle, if any
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the method, if any
    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Data as a string slice
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(|data| data.as_str())
    }

    /// Data as an integer
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(|data| data.as_i64())
    }

    /// True if this value is a method
    pub fn is_method(&self) -> bool {
        matches!(self, Value::Method(_))
    }

    /// True if this value is a handle to exactly `object`
    pub fn is_object(&self, object: &ObjectRef) -> bool {
        matches!(self, Value::Object(own) if own.ptr_eq(object))
    }

    /// Short label used in logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Data(_) => "data",
            Value::Object(_) => "object",
            Value::Method(_) => "method",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Method(a), Value::Method(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::Data(data)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl From<&ObjectRef> for Value {
    fn from(object: &ObjectRef) -> Self {
        Value::Object(object.clone())
    }
}

impl From<Method> for Value {
    fn from(method: Method) -> Self {
        Value::Method(method)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(serde_json::Value::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(serde_json::Value::from(s))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(serde_json::Value::from(b))
    }
}

/// The result of invoking a method
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Outcome {
    /// The method takes responsibility for this return value
    Value(Value),
    /// The method declines to own the return value
    #[default]
    NoOpinion,
}

impl Outcome {
    /// Wrap anything convertible into a value
    pub fn value(value: impl Into<Value>) -> Self {
        Outcome::Value(value.into())
    }

    /// Check for the no-value marker
    pub fn is_no_opinion(&self) -> bool {
        matches!(self, Outcome::NoOpinion)
    }

    /// Borrow the returned value, if any
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::NoOpinion => None,
        }
    }

    /// Take the returned value, if any
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::NoOpinion => None,
        }
    }

    /// Keep this outcome unless it is `NoOpinion`, in which case use `fallback`
    pub fn or(self, fallback: Outcome) -> Outcome {
        match self {
            Outcome::NoOpinion => fallback,
            opinion => opinion,
        }
    }

    /// True if the returned value is a handle to exactly `object`
    pub fn refers_to(&self, object: &ObjectRef) -> bool {
        matches!(self, Outcome::Value(value) if value.is_object(object))
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}
