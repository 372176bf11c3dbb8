//! Per-entity threading
//!
//! Every entity gets a private queue and dispatcher; a slow or busy
//! entity never holds up its neighbours, and per-entity ordering still
//! holds.

use crate::prelude::*;
use machina_core::Model;
use machina_engine::ThreadScheme;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts action executions in the behavior and mirrors the total in
/// a shared counter.
fn counter_model(total: Arc<AtomicUsize>) -> Model<u64> {
    let mut model = Model::new("counter");
    model.add_event_spec("bump", vec![]).unwrap();
    model.add_state("zero", vec![], |_, _, _| Ok(())).unwrap();
    model
        .add_state("counting", vec![], move |count: &mut u64, _, _| {
            *count += 1;
            total.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    model.add_normal_transition("zero", "bump", "counting").unwrap();
    model
        .add_normal_transition("counting", "bump", "counting")
        .unwrap();
    model.set_initial_state("zero").unwrap();
    model
}

#[tokio::test]
async fn independent_entities_make_progress_concurrently() {
    const ENTITIES: usize = 20;
    const BUMPS: usize = 10;

    let total = Arc::new(AtomicUsize::new(0));
    let engine = engine_with(ThreadScheme::PerEntity);
    engine.add_model(counter_model(Arc::clone(&total))).unwrap();
    engine.start().await.unwrap();

    for i in 0..ENTITIES {
        engine
            .create_entity("counter", format!("c-{i}"), vec![])
            .unwrap();
    }
    for _ in 0..BUMPS {
        for i in 0..ENTITIES {
            engine
                .generate_event(&format!("c-{i}"), "bump", vec![])
                .unwrap();
        }
    }

    eventually("all bumps processed", || {
        total.load(Ordering::SeqCst) == ENTITIES * BUMPS
    })
    .await;
    for i in 0..ENTITIES {
        assert_eq!(
            engine.current_state(&format!("c-{i}")).as_deref(),
            Some("counting")
        );
    }
    assert_eq!(engine.entity_count(), ENTITIES);

    engine.shutdown().unwrap();
    engine.join().await;
}

#[tokio::test]
async fn initialization_outranks_events_on_a_shared_queue() {
    let log = Log::default();
    let engine = engine_with(ThreadScheme::PerEngine);
    engine.add_model(lamp_model(&log)).unwrap();
    engine.start().await.unwrap();

    // Creating many entities interleaved with events toward earlier
    // ones: each initialization still lands before anything queued
    // after it for the same entity.
    for i in 0..10 {
        let id = format!("lamp-{i}");
        engine.create_entity("lamp", id.clone(), vec![]).unwrap();
        engine.generate_event(&id, "turnOn", vec![]).unwrap();
    }

    eventually("all lamps on", || {
        (0..10).all(|i| engine.current_state(&format!("lamp-{i}")).as_deref() == Some("on"))
    })
    .await;

    engine.shutdown().unwrap();
    engine.join().await;
}
