// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entities and the context handed to state actions

use crate::error::ProcessingError;
use crate::event::Event;
use crate::model::StateModel;
use crate::queue::EventQueue;
use crate::value::args_assignable;
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// Routes events toward entities by id.
///
/// Implemented by the engine; state actions reach it through
/// [`ActionContext::send`], so actions can address any entity without
/// holding a reference to it.
pub trait EventSink: Send + Sync {
    fn submit(&self, entity_id: &str, event: &str, args: Vec<Value>)
        -> Result<(), ProcessingError>;
}

/// The mutable half of an entity, guarded by one lock.
pub struct EntityState {
    /// Current state name. `None` until the initialization event has
    /// been processed.
    pub current: Option<String>,
    /// Cleared when the entity is deleted. Events already buffered for
    /// a deleted entity are rejected at delivery.
    pub active: bool,
    /// The per-entity behavior value state actions mutate.
    pub behavior: Box<dyn Any + Send>,
}

/// One live instance of a model.
///
/// Entities hold no back-pointer to the engine; delivery code reaches
/// them through the registry by id.
pub struct Entity {
    id: String,
    model: Arc<dyn StateModel>,
    queue: Arc<EventQueue>,
    state: Mutex<EntityState>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Entity {
    pub fn new(id: impl Into<String>, model: Arc<dyn StateModel>, queue: Arc<EventQueue>) -> Self {
        let behavior = model.spawn_behavior();
        Self {
            id: id.into(),
            model,
            queue,
            state: Mutex::new(EntityState {
                current: None,
                active: true,
                behavior,
            }),
            dispatcher: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &Arc<dyn StateModel> {
        &self.model
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Lock the mutable state. Recovers from poisoning; an action that
    /// panicked leaves the entity in its last consistent state.
    pub fn state(&self) -> MutexGuard<'_, EntityState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state name, if initialized.
    pub fn current_state(&self) -> Option<String> {
        self.state().current.clone()
    }

    /// Record the task driving this entity's private queue. Only set
    /// under the per-entity threading scheme.
    pub fn set_dispatcher(&self, handle: JoinHandle<()>) {
        let mut slot = self.dispatcher.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(handle);
    }

    /// Detach the private dispatcher task, if one was recorded.
    pub fn take_dispatcher(&self) -> Option<JoinHandle<()>> {
        let mut slot = self.dispatcher.lock().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }
}

/// What a state action may do while it runs.
///
/// Borrowed for the duration of one action invocation. Events raised
/// on the entity itself go to the internal channel of its own queue
/// and therefore outrank anything queued from outside.
pub struct ActionContext<'a> {
    entity_id: &'a str,
    model: &'a dyn StateModel,
    queue: &'a EventQueue,
    sink: &'a dyn EventSink,
    delete_requested: bool,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        entity_id: &'a str,
        model: &'a dyn StateModel,
        queue: &'a EventQueue,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            entity_id,
            model,
            queue,
            sink,
            delete_requested: false,
        }
    }

    /// Id of the entity whose action is running.
    pub fn entity_id(&self) -> &str {
        self.entity_id
    }

    /// Raise an event on this entity itself.
    ///
    /// Internal events are delivered before any event queued from
    /// outside, so a chain of `raise` calls runs to completion first.
    pub fn raise(&self, event: &str, args: Vec<Value>) -> Result<(), ProcessingError> {
        let spec = self
            .model
            .event_spec(event)
            .ok_or_else(|| ProcessingError::NoSuchEvent {
                model: self.model.name().to_string(),
                event: event.to_string(),
            })?;
        if !args_assignable(&spec.arg_kinds, &args) {
            return Err(ProcessingError::BadEventArgs {
                model: self.model.name().to_string(),
                event: event.to_string(),
            });
        }
        self.queue
            .push_internal(Event::new(self.entity_id, event, args));
        Ok(())
    }

    /// Send an event to another entity through the engine. Ordinary
    /// (normal-channel) delivery, even when the target is this entity.
    pub fn send(
        &self,
        entity_id: &str,
        event: &str,
        args: Vec<Value>,
    ) -> Result<(), ProcessingError> {
        self.sink.submit(entity_id, event, args)
    }

    /// Ask for this entity to be deleted once the current action
    /// returns.
    pub fn delete(&mut self) {
        self.delete_requested = true;
    }

    /// Whether the running action asked for deletion.
    pub fn delete_requested(&self) -> bool {
        self.delete_requested
    }
}
