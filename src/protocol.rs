// Copyright 2025 Cowboy AI, LLC.

//! N-way merge protocols used by composition

use crate::method::Method;
use crate::value::Outcome;

/// Merge several implementations of one method name into one
///
/// Implementations arrive in composition order.
pub trait Protocol: Send + Sync {
    /// Build the merged implementation of `name`
    fn merge(&self, name: &str, methods: Vec<Method>) -> Method;
}

/// Run every implementation in order; the last opinion wins
///
/// Each call invokes all implementations first to last with the same
/// receiver and arguments. Results that are `NoOpinion` are discarded and the
/// last remaining one is returned, or `NoOpinion` if none remain. An error
/// from any implementation stops the chain and is returned as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderProtocol;

impl Protocol for OrderProtocol {
    fn merge(&self, _name: &str, methods: Vec<Method>) -> Method {
        order_protocol(methods)
    }
}

/// Merge `methods` under [`OrderProtocol`]
pub fn order_protocol(mut methods: Vec<Method>) -> Method {
    match methods.len() {
        0 => Method::new(|_, _| Ok(Outcome::NoOpinion)),
        1 => methods.remove(0),
        _ => Method::new(move |this, args| {
            let mut outcome = Outcome::NoOpinion;
            for method in &methods {
                let result = method.call(this, args)?;
                if !result.is_no_opinion() {
                    outcome = result;
                }
            }
            Ok(outcome)
        }),
    }
}
