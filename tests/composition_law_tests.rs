// Copyright 2025 Cowboy AI, LLC.

use cim_metaobject::{
    compose_metaobjects, encapsulate, MetaobjectError, Method, ObjectRef, Outcome, Value,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

/// Metaobject whose `m` appends `tag` to the receiver's `log` and returns `outcome`
fn logging(tag: &'static str, outcome: Outcome) -> ObjectRef {
    ObjectRef::builder()
        .method("m", move |this, _| {
            let mut log = this
                .get_value("log")
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            log.push_str(tag);
            this.set("log", log)?;
            Ok(outcome.clone())
        })
        .build()
}

fn run(metaobjects: &[ObjectRef]) -> (Outcome, Option<Value>) {
    let composed = compose_metaobjects(metaobjects).unwrap();
    let receiver = ObjectRef::with_prototype(&composed);
    let outcome = receiver.send("m", &[]).unwrap();
    (outcome, receiver.get_value("log"))
}

#[test]
fn later_opinion_overrides_no_opinion() {
    let (outcome, _) = run(&[logging("a", Outcome::NoOpinion), logging("b", Outcome::value("V"))]);
    assert_eq!(outcome, Outcome::value("V"));
}

#[test]
fn earlier_opinion_survives_later_no_opinion() {
    let (outcome, _) = run(&[logging("a", Outcome::value("V")), logging("b", Outcome::NoOpinion)]);
    assert_eq!(outcome, Outcome::value("V"));
}

#[test]
fn last_of_two_opinions_wins() {
    let (outcome, _) = run(&[logging("a", Outcome::value("V1")), logging("b", Outcome::value("V2"))]);
    assert_eq!(outcome, Outcome::value("V2"));
}

#[test]
fn no_opinions_compose_to_no_opinion() {
    let (outcome, _) = run(&[logging("a", Outcome::NoOpinion), logging("b", Outcome::NoOpinion)]);
    assert!(outcome.is_no_opinion());
}

#[test]
fn side_effects_run_first_to_last() {
    let (_, log) = run(&[
        logging("a", Outcome::value("V1")),
        logging("b", Outcome::NoOpinion),
        logging("c", Outcome::value("V3")),
    ]);
    assert_eq!(log, Some(Value::from("abc")));
}

#[test]
fn earlier_side_effects_are_visible_to_later_implementations() {
    let first = logging("a", Outcome::NoOpinion);
    let second = ObjectRef::builder()
        .method("m", |this, _| Ok(this.get_value("log").map(Outcome::Value).unwrap_or_default()))
        .build();
    let (outcome, _) = run(&[first, second]);
    assert_eq!(outcome, Outcome::value("a"));
}

#[test]
fn composition_leaves_inputs_unchanged() {
    let a = logging("a", Outcome::value("A"));
    let b = logging("b", Outcome::value("B"));
    let a_method = a.get_method("m").unwrap();
    let b_method = b.get_method("m").unwrap();
    let a_keys = a.keys();

    let composed = compose_metaobjects(&[a.clone(), b.clone()]).unwrap();
    assert!(!composed.ptr_eq(&a));

    assert!(a.get_method("m").unwrap().ptr_eq(&a_method));
    assert!(b.get_method("m").unwrap().ptr_eq(&b_method));
    assert_eq!(a.keys(), a_keys);

    let on_a = ObjectRef::with_prototype(&a);
    assert_eq!(on_a.send("m", &[]).unwrap(), Outcome::value("A"));
    assert_eq!(on_a.get_value("log"), Some(Value::from("a")));
}

#[test]
fn incompatible_prototypes_fail_before_building() {
    let left = ObjectRef::builder()
        .prototype(&ObjectRef::new())
        .method("m", |_, _| Ok(Outcome::NoOpinion))
        .build();
    let right = ObjectRef::builder()
        .prototype(&ObjectRef::new())
        .method("m", |_, _| Ok(Outcome::NoOpinion))
        .build();

    let err = compose_metaobjects(&[left, right]).unwrap_err();
    assert!(matches!(err, MetaobjectError::IncompatiblePrototypes { .. }));
}

#[test]
fn descendant_prototypes_are_compatible() {
    let base = ObjectRef::builder()
        .method("base", |_, _| Ok(Outcome::value("base")))
        .build();
    let derived = ObjectRef::with_prototype(&base);
    let left = ObjectRef::builder().prototype(&base).declare("hook").build();
    let right = ObjectRef::builder()
        .prototype(&derived)
        .method("hook", |_, _| Ok(Outcome::NoOpinion))
        .build();

    let composed = compose_metaobjects(&[left, right]).unwrap();
    assert_eq!(composed.prototype(), Some(base));
    assert_eq!(composed.send("base", &[]).unwrap(), Outcome::value("base"));
}

fn songwriter() -> ObjectRef {
    encapsulate(
        &ObjectRef::builder()
            .method("addSong", |this, args| {
                let mut songs = this
                    .get_value("_songs")
                    .and_then(|v| v.as_data().cloned())
                    .unwrap_or_else(|| json!([]));
                if let (Some(list), Some(song)) = (songs.as_array_mut(), args.first()) {
                    list.push(song.as_data().cloned().unwrap_or_default());
                }
                this.set("_songs", songs)?;
                Ok(Outcome::value(this))
            })
            .method("songs", |this, _| {
                Ok(this.get_value("_songs").map(Outcome::Value).unwrap_or_default())
            })
            .build(),
    )
    .unwrap()
}

fn notifying_add_song() -> ObjectRef {
    encapsulate(
        &ObjectRef::builder()
            .declare("notify")
            .method("addSong", |this, _| {
                this.send("notify", &[])?;
                Ok(Outcome::NoOpinion)
            })
            .build(),
    )
    .unwrap()
}

fn subscribable() -> ObjectRef {
    encapsulate(
        &ObjectRef::builder()
            .method("notify", |this, _| {
                let count = this.get_value("_notified").and_then(|v| v.as_i64()).unwrap_or(0);
                this.set("_notified", count + 1)?;
                Ok(Outcome::NoOpinion)
            })
            .method("notifications", |this, _| {
                let count = this.get_value("_notified").and_then(|v| v.as_i64()).unwrap_or(0);
                Ok(Outcome::value(count))
            })
            .build(),
    )
    .unwrap()
}

#[test]
fn composed_add_song_returns_receiver() {
    let journal = compose_metaobjects(&[songwriter(), notifying_add_song()]).unwrap();
    assert_eq!(journal.declared_names(), vec!["notify"]);

    let receiver = ObjectRef::with_prototype(&journal);
    let outcome = receiver.send("addSong", &["x".into()]).unwrap();
    assert!(outcome.refers_to(&receiver));
    assert_eq!(receiver.send("songs", &[]).unwrap(), Outcome::value(json!(["x"])));
}

#[test]
fn declared_dependency_is_fulfilled_by_another_input() {
    let journal =
        compose_metaobjects(&[songwriter(), subscribable(), notifying_add_song()]).unwrap();
    assert!(journal.declared_names().is_empty());

    let receiver = ObjectRef::with_prototype(&journal);
    receiver.send("addSong", &["x".into()]).unwrap();
    receiver.send("addSong", &["y".into()]).unwrap();

    assert_eq!(receiver.send("notifications", &[]).unwrap(), Outcome::value(2));
    assert_eq!(receiver.send("songs", &[]).unwrap(), Outcome::value(json!(["x", "y"])));
}

#[test]
fn compositions_compose() {
    let inner = compose_metaobjects(&[logging("a", Outcome::value(1)), logging("b", Outcome::NoOpinion)])
        .unwrap();
    let outer = compose_metaobjects(&[inner, logging("c", Outcome::NoOpinion)]).unwrap();
    let receiver = ObjectRef::with_prototype(&outer);

    assert_eq!(receiver.send("m", &[]).unwrap(), Outcome::value(1));
    assert_eq!(receiver.get_value("log"), Some(Value::from("abc")));
}

#[test]
fn errors_propagate_out_of_composed_methods() {
    let failing = ObjectRef::builder()
        .with_method("m", Method::new(|_, _| Err(MetaobjectError::method("refused"))))
        .build();
    let composed = compose_metaobjects(&[logging("a", Outcome::NoOpinion), failing]).unwrap();
    let receiver = ObjectRef::with_prototype(&composed);

    assert_eq!(receiver.send("m", &[]).unwrap_err(), MetaobjectError::method("refused"));
    assert_eq!(receiver.get_value("log"), Some(Value::from("a")));
}

fn outcome_strategy() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![Just(None), any::<i64>().prop_map(Some)]
}

proptest! {
    #[test]
    fn return_value_is_last_opinion(opinions in proptest::collection::vec(outcome_strategy(), 1..8)) {
        let metaobjects: Vec<ObjectRef> = opinions
            .iter()
            .map(|opinion| {
                let outcome = opinion.map(Outcome::value).unwrap_or_default();
                logging("x", outcome)
            })
            .collect();

        let (outcome, log) = run(&metaobjects);
        let expected = opinions
            .iter()
            .rev()
            .find_map(|o| *o)
            .map(Outcome::value)
            .unwrap_or_default();

        prop_assert_eq!(outcome, expected);
        prop_assert_eq!(log, Some(Value::from("x".repeat(opinions.len()))));
    }
}
