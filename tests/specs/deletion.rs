//! Entity deletion
//!
//! Deletion takes effect when the requesting action returns; events
//! already buffered for the entity are reported, not delivered.

use crate::prelude::*;
use machina_core::Model;
use machina_engine::ThreadScheme;
use std::sync::Arc;

fn mortal_model(log: &Log) -> Model<()> {
    let mut model = lamp_model(log);
    model.add_event_spec("retire", vec![]).unwrap();
    let entries = Arc::clone(log);
    model
        .add_state("gone", vec![], move |_, ctx, _| {
            push(&entries, "gone");
            ctx.delete();
            Ok(())
        })
        .unwrap();
    model.add_normal_transition("off", "retire", "gone").unwrap();
    model
}

#[tokio::test]
async fn events_buffered_behind_a_deletion_are_reported_once() {
    let log = Log::default();
    let exceptions = Arc::new(RecordingExceptions::default());
    let engine = engine_with(ThreadScheme::PerEngine);
    engine.add_model(mortal_model(&log)).unwrap();
    engine
        .set_exception_handler(Some(Arc::clone(&exceptions) as _))
        .unwrap();
    engine.start().await.unwrap();

    engine.create_entity("lamp", "desk", vec![]).unwrap();
    // Queue the deletion trigger and one more event behind it.
    engine.generate_event("desk", "retire", vec![]).unwrap();
    engine.generate_event("desk", "turnOn", vec![]).unwrap();

    eventually("deletion report", || !exceptions.messages().is_empty()).await;
    let messages = exceptions.messages();
    assert_eq!(messages.len(), 1, "{messages:?}");
    assert!(messages[0].contains("deleted entity"), "{messages:?}");

    assert!(!engine.has_entity("desk"));
    assert_eq!(engine.entity_count(), 0);
    assert_eq!(entries(&log), ["off", "gone"]);

    engine.shutdown().unwrap();
    engine.join().await;
}

#[tokio::test]
async fn generating_toward_a_deleted_entity_fails_synchronously() {
    let log = Log::default();
    let engine = engine_with(ThreadScheme::PerEntity);
    engine.add_model(mortal_model(&log)).unwrap();
    engine.start().await.unwrap();

    engine.create_entity("lamp", "desk", vec![]).unwrap();
    engine.generate_event("desk", "retire", vec![]).unwrap();

    eventually("entity removed", || !engine.has_entity("desk")).await;
    assert!(engine.generate_event("desk", "turnOn", vec![]).is_err());

    // The id is free again once the entity is gone.
    engine.create_entity("lamp", "desk", vec![]).unwrap();
    eventually("recreated entity", || {
        engine.current_state("desk").as_deref() == Some("off")
    })
    .await;

    engine.shutdown().unwrap();
    engine.join().await;
}
