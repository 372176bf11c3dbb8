//! Internal-event priority
//!
//! Events an entity raises on itself must drain before anything that
//! was already waiting on the normal channel.

use crate::prelude::*;
use machina_core::Model;
use machina_engine::ThreadScheme;
use std::sync::Arc;

/// idle --go--> stage1 --next--> stage2 --fin--> done --poke--> poked
///
/// stage1 and stage2 raise the next link internally, so the whole
/// chain runs before the externally queued "poke".
fn chain_model(log: &Log) -> Model<()> {
    let mut model = Model::new("chain");
    for event in ["go", "next", "fin", "poke"] {
        model.add_event_spec(event, vec![]).unwrap();
    }

    let entries = Arc::clone(log);
    model
        .add_state("idle", vec![], move |_, _, _| {
            push(&entries, "idle");
            Ok(())
        })
        .unwrap();
    let entries = Arc::clone(log);
    model
        .add_state("stage1", vec![], move |_, ctx, _| {
            push(&entries, "stage1");
            ctx.raise("next", vec![])?;
            Ok(())
        })
        .unwrap();
    let entries = Arc::clone(log);
    model
        .add_state("stage2", vec![], move |_, ctx, _| {
            push(&entries, "stage2");
            ctx.raise("fin", vec![])?;
            Ok(())
        })
        .unwrap();
    let entries = Arc::clone(log);
    model
        .add_state("done", vec![], move |_, _, _| {
            push(&entries, "done");
            Ok(())
        })
        .unwrap();
    let entries = Arc::clone(log);
    model
        .add_state("poked", vec![], move |_, _, _| {
            push(&entries, "poked");
            Ok(())
        })
        .unwrap();

    model.add_normal_transition("idle", "go", "stage1").unwrap();
    model
        .add_normal_transition("stage1", "next", "stage2")
        .unwrap();
    model.add_normal_transition("stage2", "fin", "done").unwrap();
    model.add_normal_transition("done", "poke", "poked").unwrap();
    model.set_initial_state("idle").unwrap();
    model
}

#[tokio::test]
async fn raised_events_preempt_queued_normal_events() {
    let log = Log::default();
    let engine = engine_with(ThreadScheme::PerEngine);
    engine.add_model(chain_model(&log)).unwrap();
    engine.start().await.unwrap();

    engine.create_entity("chain", "c-1", vec![]).unwrap();
    // Both land on the normal channel back to back. If the internal
    // cascade did not outrank "poke", it would arrive in stage1 where
    // no transition matches.
    engine.generate_event("c-1", "go", vec![]).unwrap();
    engine.generate_event("c-1", "poke", vec![]).unwrap();

    eventually("chain complete", || entries(&log).len() == 5).await;
    assert_eq!(entries(&log), ["idle", "stage1", "stage2", "done", "poked"]);
    assert_eq!(engine.current_state("c-1").as_deref(), Some("poked"));

    engine.shutdown().unwrap();
    engine.join().await;
}

#[tokio::test]
async fn cross_entity_sends_use_the_normal_channel() {
    let log = Log::default();
    let engine = engine_with(ThreadScheme::PerEngine);

    let mut model = lamp_model(&log);
    model.add_event_spec("relay", vec![]).unwrap();
    let entries = Arc::clone(&log);
    model
        .add_state("relaying", vec![], move |_, ctx, _| {
            push(&entries, "relaying");
            // Stimulate the sibling lamp through the engine.
            ctx.send("other", "turnOn", vec![])?;
            Ok(())
        })
        .unwrap();
    model.add_excursion("off", "relay", "relaying").unwrap();
    engine.add_model(model).unwrap();
    engine.start().await.unwrap();

    engine.create_entity("lamp", "desk", vec![]).unwrap();
    engine.create_entity("lamp", "other", vec![]).unwrap();
    engine.generate_event("desk", "relay", vec![]).unwrap();

    eventually("relayed turn-on", || {
        engine.current_state("other").as_deref() == Some("on")
    })
    .await;
    assert_eq!(engine.current_state("desk").as_deref(), Some("off"));

    engine.shutdown().unwrap();
    engine.join().await;
}
