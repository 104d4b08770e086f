// Copyright 2025 Cowboy AI, LLC.

use anyhow::Result;
use cim_metaobject::{
    compose_metaobjects, encapsulate, fluent_by_default, Delegating, ObjectRef, Outcome, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// A state object for a door: `open`/`close` switch the owner's `state`
fn door_state(name: &'static str, next_on_open: &'static str, next_on_close: &'static str) -> ObjectRef {
    ObjectRef::builder()
        .value("name", name)
        .method("open", move |this, _| {
            let next = this.get_value(next_on_open);
            if let Some(next) = next {
                this.set("state", next)?;
            }
            Ok(Outcome::NoOpinion)
        })
        .method("close", move |this, _| {
            let next = this.get_value(next_on_close);
            if let Some(next) = next {
                this.set("state", next)?;
            }
            Ok(Outcome::NoOpinion)
        })
        .build()
}

fn state_name(door: &ObjectRef) -> Option<String> {
    door.get_value("state")
        .and_then(|v| v.as_object().cloned())
        .and_then(|state| state.get_value("name"))
        .and_then(|v| v.as_str().map(String::from))
}

#[test]
fn swapping_the_state_object_changes_behaviour() -> Result<()> {
    let opened = door_state("opened", "opened", "closed");
    let closed = door_state("closed", "opened", "closed");

    let door = ObjectRef::new();
    door.set("opened", &opened)?;
    door.set("closed", &closed)?;
    door.set("state", &closed)?;
    door.delegate_to_own("state", Some(&["open", "close"]))?;

    assert_eq!(state_name(&door).as_deref(), Some("closed"));
    door.send("open", &[])?;
    assert_eq!(state_name(&door).as_deref(), Some("opened"));
    door.send("close", &[])?;
    assert_eq!(state_name(&door).as_deref(), Some("closed"));

    // the state objects themselves carry no per-door state
    assert!(!opened.has_own("state"));
    assert!(!closed.has_own("state"));
    Ok(())
}

#[test]
fn forwarding_to_an_encapsulated_instance() -> Result<()> {
    let counter = encapsulate(
        &ObjectRef::builder()
            .method("increment", |this, _| {
                let n = this.get_value("_n").and_then(|v| v.as_i64()).unwrap_or(0);
                this.set("_n", n + 1)?;
                Ok(Outcome::value(this))
            })
            .method("value", |this, _| {
                Ok(Outcome::value(this.get_value("_n").and_then(|v| v.as_i64()).unwrap_or(0)))
            })
            .build(),
    )?;
    let instance = ObjectRef::with_prototype(&counter);

    let first = ObjectRef::new().forward(&instance, None)?;
    let second = ObjectRef::new().forward(&instance, None)?;

    // the instance normalizes to itself, forwarding normalizes to the caller
    assert!(first.send("increment", &[])?.refers_to(&first));
    second.send("increment", &[])?;

    assert_eq!(first.send("value", &[])?, Outcome::value(2));
    assert_eq!(instance.send("value", &[])?, Outcome::value(2));
    Ok(())
}

#[test]
fn delegating_to_an_encapsulated_metaobject_keeps_receivers_apart() -> Result<()> {
    let counter = encapsulate(
        &ObjectRef::builder()
            .method("increment", |this, _| {
                let n = this.get_value("_n").and_then(|v| v.as_i64()).unwrap_or(0);
                this.set("_n", n + 1)?;
                Ok(Outcome::NoOpinion)
            })
            .method("value", |this, _| {
                Ok(Outcome::value(this.get_value("_n").and_then(|v| v.as_i64()).unwrap_or(0)))
            })
            .build(),
    )?;

    let first = ObjectRef::new().delegate(&counter, None)?;
    let second = ObjectRef::new().delegate(&counter, None)?;
    first.send("increment", &[])?;
    first.send("increment", &[])?;
    second.send("increment", &[])?;

    assert_eq!(first.send("value", &[])?, Outcome::value(2));
    assert_eq!(second.send("value", &[])?, Outcome::value(1));
    Ok(())
}

#[test]
fn fluent_composition_chains() -> Result<()> {
    let recorder = ObjectRef::builder()
        .method("record", |this, args| {
            let mut items = this
                .get_value("items")
                .and_then(|v| v.as_data().cloned())
                .unwrap_or_else(|| json!([]));
            if let Some(list) = items.as_array_mut() {
                list.extend(args.iter().filter_map(|arg| arg.as_data().cloned()));
            }
            this.set("items", items)?;
            Ok(Outcome::NoOpinion)
        })
        .build();
    let counter = ObjectRef::builder()
        .method("record", |this, _| {
            let n = this.get_value("count").and_then(|v| v.as_i64()).unwrap_or(0);
            this.set("count", n + 1)?;
            Ok(Outcome::NoOpinion)
        })
        .build();

    let composed = compose_metaobjects(&[recorder.clone(), counter])?;
    let fluent = fluent_by_default(&composed);
    let receiver = ObjectRef::with_prototype(&fluent);

    let chained = receiver.send("record", &["a".into()])?;
    let chained = chained
        .as_value()
        .and_then(Value::as_object)
        .expect("fluent call returns the receiver")
        .send("record", &["b".into()])?;

    assert!(chained.refers_to(&receiver));
    assert_eq!(receiver.get_value("count"), Some(Value::from(2)));
    assert_eq!(
        receiver.get_value("items"),
        Some(Value::from(json!(["a", "b"])))
    );

    // neither the composition nor its inputs became fluent
    let plain = ObjectRef::with_prototype(&composed);
    assert!(plain.send("record", &[])?.is_no_opinion());
    assert!(ObjectRef::with_prototype(&recorder).send("record", &[])?.is_no_opinion());
    Ok(())
}

fn labelled() -> ObjectRef {
    ObjectRef::builder()
        .method("name", |this, _| {
            Ok(this.get_value("label").map(Outcome::Value).unwrap_or_default())
        })
        .method("rename", |this, args| {
            let label = args.first().cloned().unwrap_or_else(Value::null);
            this.set("label", label)?;
            Ok(Outcome::NoOpinion)
        })
        .method("whoami", |this, _| Ok(Outcome::value(this)))
        .build()
}

#[test]
fn delegated_calls_reached_through_a_child_run_against_the_receiver() -> Result<()> {
    let receiver = ObjectRef::new();
    receiver.set("label", "receiver")?;
    receiver.delegate(&labelled(), None)?;

    let child = ObjectRef::with_prototype(&receiver);
    child.set("label", "child")?;

    assert_eq!(child.send("name", &[])?, Outcome::value("receiver"));
    child.send("rename", &["renamed".into()])?;
    assert_eq!(receiver.get_value("label"), Some(Value::from("renamed")));
    assert_eq!(child.get_value("label"), Some(Value::from("child")));
    assert!(child.send("whoami", &[])?.refers_to(&receiver));
    Ok(())
}

#[test]
fn forwarded_self_return_reached_through_a_child_yields_the_receiver() -> Result<()> {
    let target = labelled();
    let receiver = ObjectRef::new().forward(&target, Some(&["whoami"]))?;
    let child = ObjectRef::with_prototype(&receiver);

    let outcome = child.send("whoami", &[])?;
    assert!(outcome.refers_to(&receiver));
    assert!(!outcome.refers_to(&child));
    Ok(())
}

#[test]
fn own_delegation_reached_through_a_child_reads_the_receivers_property() -> Result<()> {
    let answering = |answer: &'static str| {
        ObjectRef::builder()
            .method("answer", move |_, _| Ok(Outcome::value(answer)))
            .build()
    };

    let receiver = ObjectRef::new();
    receiver.set("state", answering("A"))?;
    receiver.delegate_to_own("state", None)?;

    let child = ObjectRef::with_prototype(&receiver);
    child.set("state", answering("B"))?;
    assert_eq!(child.send("answer", &[])?, Outcome::value("A"));

    receiver.set("state", answering("C"))?;
    assert_eq!(child.send("answer", &[])?, Outcome::value("C"));
    Ok(())
}

#[test]
fn delegation_survives_fluent_derivation_of_the_receiver() -> Result<()> {
    let receiver = ObjectRef::new();
    receiver.set("label", "receiver")?;
    receiver.delegate(&labelled(), Some(&["rename"]))?;

    let fluent = fluent_by_default(&receiver);
    let instance = ObjectRef::with_prototype(&fluent);
    let outcome = instance.send("rename", &["renamed".into()])?;

    // fluent normalization targets the caller, the write targets the receiver
    assert!(outcome.refers_to(&instance));
    assert_eq!(receiver.get_value("label"), Some(Value::from("renamed")));
    assert!(!instance.has_own("label"));
    Ok(())
}
