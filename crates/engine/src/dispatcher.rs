// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher tasks: one per queue, delivering events to entities
//!
//! A dispatcher loops on its queue until the queue is closed. Delivery
//! itself is synchronous; the only suspension point is the dequeue, so
//! an action never runs concurrently with another event of the same
//! entity.

use crate::handlers::StateChange;
use crate::runtime::Shared;
use chrono::Utc;
use machina_core::{ActionContext, Event, EventQueue, ProcessingError, TransitionKind};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Spawn a dispatcher task for `queue`. The returned receiver fires
/// once the task is running, before its first dequeue.
pub(crate) fn spawn(
    label: String,
    queue: Arc<EventQueue>,
    shared: Arc<Shared>,
) -> (JoinHandle<()>, oneshot::Receiver<()>) {
    let (ready_tx, ready_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let _ = ready_tx.send(());
        tracing::debug!(dispatcher = %label, "dispatcher ready");
        while let Some(event) = queue.dequeue().await {
            deliver(&shared, event);
        }
        tracing::debug!(dispatcher = %label, "dispatcher stopped");
    });
    (handle, ready_rx)
}

/// Deliver one dequeued event to its target entity.
///
/// Every failure is routed to the exception handler; delivery never
/// takes the dispatcher loop down.
pub(crate) fn deliver(shared: &Arc<Shared>, event: Event) {
    let Some(entity) = shared.entity(&event.entity) else {
        // The target existed when the event was queued, so it has
        // since been deleted.
        shared.report(&ProcessingError::DeletedEntity(event.entity));
        return;
    };
    let model = Arc::clone(entity.model());

    let mut cell = entity.state();
    if !cell.active {
        drop(cell);
        shared.report(&ProcessingError::DeletedEntity(event.entity));
        return;
    }

    // Resolve the transition. Initialization is an implicit normal
    // transition into the model's initial state.
    let (kind, from, to) = if event.is_init() {
        let Some(initial) = model.initial_state() else {
            shared.report(&ProcessingError::NotInitialized(event.entity));
            return;
        };
        (TransitionKind::Normal, None, Some(initial.to_string()))
    } else {
        let Some(name) = event.spec.as_deref() else {
            return;
        };
        let Some(current) = cell.current.clone() else {
            drop(cell);
            shared.report(&ProcessingError::NotInitialized(event.entity));
            return;
        };
        let Some(row) = model.transition(&current, name) else {
            drop(cell);
            shared.report(&ProcessingError::NoTransition {
                entity: event.entity,
                state: current,
                event: name.to_string(),
            });
            return;
        };
        (row.kind, Some(current), row.end_state.clone())
    };

    shared.notify_state_change(StateChange {
        at: Utc::now(),
        entity: event.entity.clone(),
        from: from.clone(),
        event: event.spec.clone(),
        args: event.args.clone(),
        kind,
        to: to.clone(),
    });

    if kind == TransitionKind::Ignore {
        return;
    }
    // Configuration guarantees an end state for every other kind.
    let Some(end) = to else {
        return;
    };

    cell.current = Some(end.clone());

    let mut delete_requested = false;
    if kind != TransitionKind::DoNotExecute {
        let mut ctx = ActionContext::new(
            entity.id(),
            model.as_ref(),
            entity.queue(),
            shared.as_ref(),
        );
        let result = model.invoke(&end, cell.behavior.as_mut(), &mut ctx, &event.args);
        delete_requested = ctx.delete_requested();
        if let Err(err) = result {
            shared.report(&ProcessingError::ActionFailed {
                entity: event.entity.clone(),
                state: end,
                message: err.to_string(),
            });
        }
    }

    // An excursion runs the action, then the entity resumes the state
    // it was in when the event arrived.
    if kind == TransitionKind::Excursion {
        cell.current = from;
    }

    if delete_requested {
        cell.active = false;
        drop(cell);
        shared.remove_entity(&entity);
    }
}
