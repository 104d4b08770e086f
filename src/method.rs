// Copyright 2025 Cowboy AI, LLC.

//! Method implementations
//!
//! A [`Method`] is a shared, thread-safe callable taking an implicit receiver
//! (`this`) plus explicit arguments. Methods are cheap to clone; clones share
//! the same implementation and compare equal by identity.

use std::fmt;
use std::sync::Arc;

use crate::errors::MetaobjectResult;
use crate::object::ObjectRef;
use crate::value::{Outcome, Value};

type MethodFn = dyn Fn(&ObjectRef, &[Value]) -> MetaobjectResult<Outcome> + Send + Sync;

/// A method implementation
#[derive(Clone)]
pub struct Method {
    body: Arc<MethodFn>,
}

impl Method {
    /// Create a method from a closure over `(this, args)`
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> MetaobjectResult<Outcome> + Send + Sync + 'static,
    {
        Self {
            body: Arc::new(body),
        }
    }

    /// Invoke with `this` as the implicit receiver
    pub fn call(&self, this: &ObjectRef, args: &[Value]) -> MetaobjectResult<Outcome> {
        (self.body)(this, args)
    }

    /// Fix the receiver; the returned method ignores whatever `this` it is called with
    pub fn bind(&self, this: &ObjectRef) -> Method {
        let method = self.clone();
        let this = this.clone();
        Method::new(move |_, args| method.call(&this, args))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Arc::as_ptr(&self.body))
    }
}
