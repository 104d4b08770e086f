// Copyright 2025 Cowboy AI, LLC.

//! # CIM Metaobject
//!
//! A small runtime algebra for building objects out of composable,
//! encapsulated behaviour units, without class hierarchies.
//!
//! This crate provides:
//! - **Objects**: receivers and metaobjects with ordered slots and prototype delegation
//! - **Encapsulation**: behaviours whose state lives in a private, per-receiver context
//! - **Forwarding / Delegation**: call routing to another object, early or late bound
//! - **Policies**: two-way method merges for one-shot mixins
//! - **Composition**: N-way merges of metaobjects with a return-value negotiation law
//! - **Transformations**: derived metaobjects that leave their source untouched
//!
//! ## Design Principles
//!
//! 1. **Privacy**: encapsulated state is reachable only through the behaviour's own methods
//! 2. **Non-mutation**: composition and transformation never modify their inputs
//! 3. **All-or-nothing**: a failing composition or mixin installs nothing
//! 4. **Explicit opinions**: methods return [`Outcome`], and `NoOpinion` declines
//!    responsibility for the return value
//!
//! ## Example
//!
//! ```
//! use cim_metaobject::{compose_metaobjects, encapsulate, ObjectRef, Outcome, Value};
//!
//! let songwriter = encapsulate(
//!     &ObjectRef::builder()
//!         .method("addSong", |this, args| {
//!             let mut songs = this
//!                 .get_value("_songs")
//!                 .and_then(|v| v.as_data().cloned())
//!                 .unwrap_or_else(|| serde_json::json!([]));
//!             if let Some(list) = songs.as_array_mut() {
//!                 list.push(args[0].as_data().cloned().unwrap_or_default());
//!             }
//!             this.set("_songs", songs)?;
//!             Ok(Outcome::value(this))
//!         })
//!         .method("songs", |this, _| Ok(this.get_value("_songs").map(Outcome::Value).unwrap_or_default()))
//!         .build(),
//! )
//! .unwrap();
//!
//! let alice = ObjectRef::with_prototype(&songwriter);
//! let returned = alice.send("addSong", &[Value::from("a")]).unwrap();
//! assert!(returned.refers_to(&alice));
//! assert_eq!(alice.send("songs", &[]).unwrap(), Outcome::value(serde_json::json!(["a"])));
//! ```

#![warn(missing_docs)]

mod composition;
mod config;
mod delegation;
mod encapsulation;
mod errors;
mod identifiers;
mod method;
mod object;
mod policy;
mod protocol;
mod transform;
mod value;

pub use composition::{compose_metaobjects, compose_with, prototype_seed};
pub use config::{EncapsulationConfig, DEFAULT_PRIVATE_PREFIX};
pub use delegation::{delegate, delegate_to_own, forward, proxy, Delegating};
pub use encapsulation::{encapsulate, encapsulate_with};
pub use errors::{MetaobjectError, MetaobjectResult};
pub use identifiers::{EncapsulationId, ObjectId};
pub use method::Method;
pub use object::{MetaobjectBuilder, Object, ObjectRef, Slot};
pub use policy::{
    mixin_with_policy, MethodSelector, Mixin, Policy, PolicyAssignment, ResolvedPolicies,
    WILDCARD,
};
pub use protocol::{order_protocol, OrderProtocol, Protocol};
pub use transform::{fluent_by_default, transform_methods};
pub use value::{Outcome, Value};

/// Alias used where an object plays the role of a behaviour bundle
pub type Metaobject = ObjectRef;
