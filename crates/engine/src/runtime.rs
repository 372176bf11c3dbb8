// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine: registries, lifecycle, and event generation

use crate::dispatcher;
use crate::error::EngineError;
use crate::handlers::{ExceptionHandler, StateChange, StateChangeHandler};
use crate::scheme::ThreadScheme;
use crate::Defaults;
use machina_core::{
    args_assignable, Entity, Event, EventQueue, EventSink, ProcessingError, StateModel,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// State shared between the engine handle, its dispatchers, and action
/// contexts.
pub(crate) struct Shared {
    id: String,
    running: AtomicBool,
    scheme: Mutex<ThreadScheme>,
    models: Mutex<HashMap<String, Arc<dyn StateModel>>>,
    entities: Mutex<HashMap<String, Arc<Entity>>>,
    exception_handler: Mutex<Option<Arc<dyn ExceptionHandler>>>,
    state_change_handler: Mutex<Option<Arc<dyn StateChangeHandler>>>,
    /// The shared queue under the per-engine scheme.
    engine_queue: Mutex<Option<Arc<EventQueue>>>,
    /// One queue per model under the per-model scheme.
    model_queues: Mutex<HashMap<String, Arc<EventQueue>>>,
    /// Handles of the engine- and model-level dispatchers.
    dispatchers: Mutex<Vec<JoinHandle<()>>>,
    /// Finished dispatcher handles go here to be joined by the reaper.
    reaper_tx: Mutex<Option<mpsc::UnboundedSender<JoinHandle<()>>>>,
}

impl Shared {
    pub(crate) fn entity(&self, id: &str) -> Option<Arc<Entity>> {
        lock(&self.entities).get(id).cloned()
    }

    /// Forward a processing error to the installed exception handler.
    /// Without one, the error is dropped.
    pub(crate) fn report(&self, error: &ProcessingError) {
        let handler = lock(&self.exception_handler).clone();
        if let Some(handler) = handler {
            handler.handle_exception(error);
        }
    }

    pub(crate) fn notify_state_change(&self, change: StateChange) {
        let handler = lock(&self.state_change_handler).clone();
        if let Some(handler) = handler {
            handler.handle_state_change(change);
        }
    }

    /// Deregister a deleted entity and, under the per-entity scheme,
    /// tear down its private queue and dispatcher.
    pub(crate) fn remove_entity(&self, entity: &Arc<Entity>) {
        lock(&self.entities).remove(entity.id());
        if *lock(&self.scheme) == ThreadScheme::PerEntity {
            entity.queue().close();
            if let Some(handle) = entity.take_dispatcher() {
                self.retire(handle);
            }
        }
        tracing::debug!(engine = %self.id, entity = %entity.id(), "entity deleted");
    }

    fn retire(&self, handle: JoinHandle<()>) {
        if let Some(tx) = lock(&self.reaper_tx).as_ref() {
            let _ = tx.send(handle);
        }
    }
}

impl EventSink for Shared {
    fn submit(
        &self,
        entity_id: &str,
        event: &str,
        args: Vec<Value>,
    ) -> Result<(), ProcessingError> {
        let entity = self
            .entity(entity_id)
            .ok_or_else(|| ProcessingError::NoSuchEntity(entity_id.to_string()))?;
        let model = entity.model();
        let spec = model
            .event_spec(event)
            .ok_or_else(|| ProcessingError::NoSuchEvent {
                model: model.name().to_string(),
                event: event.to_string(),
            })?;
        if !args_assignable(&spec.arg_kinds, &args) {
            return Err(ProcessingError::BadEventArgs {
                model: model.name().to_string(),
                event: event.to_string(),
            });
        }
        entity.queue().push_normal(Event::new(entity_id, event, args));
        Ok(())
    }
}

/// The event-driven entity runtime.
///
/// Models and handlers are registered before `start`; entities are
/// created and stimulated while the engine runs. Action code never
/// holds an engine reference; it reaches the engine through its
/// [`ActionContext`](machina_core::ActionContext).
pub struct Engine {
    shared: Arc<Shared>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// A stopped engine carrying the bootstrap defaults.
    pub fn new(id: impl Into<String>, defaults: &Defaults) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                running: AtomicBool::new(false),
                scheme: Mutex::new(defaults.thread_scheme),
                models: Mutex::new(HashMap::new()),
                entities: Mutex::new(HashMap::new()),
                exception_handler: Mutex::new(defaults.exception_handler.clone()),
                state_change_handler: Mutex::new(defaults.state_change_handler.clone()),
                engine_queue: Mutex::new(None),
                model_queues: Mutex::new(HashMap::new()),
                dispatchers: Mutex::new(Vec::new()),
                reaper_tx: Mutex::new(None),
            }),
            reaper: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn ensure_stopped(&self) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        if !self.is_running() {
            return Err(EngineError::NotRunning);
        }
        Ok(())
    }

    /// Register a configured model. Pre-start only.
    pub fn add_model(&self, model: impl StateModel + 'static) -> Result<(), EngineError> {
        self.ensure_stopped()?;
        let mut models = lock(&self.shared.models);
        let name = model.name().to_string();
        if models.contains_key(&name) {
            return Err(EngineError::DuplicateModel(name));
        }
        models.insert(name, Arc::new(model));
        Ok(())
    }

    /// Install or remove the exception handler. Pre-start only.
    pub fn set_exception_handler(
        &self,
        handler: Option<Arc<dyn ExceptionHandler>>,
    ) -> Result<(), EngineError> {
        self.ensure_stopped()?;
        *lock(&self.shared.exception_handler) = handler;
        Ok(())
    }

    /// Install or remove the state-change handler. Pre-start only.
    pub fn set_state_change_handler(
        &self,
        handler: Option<Arc<dyn StateChangeHandler>>,
    ) -> Result<(), EngineError> {
        self.ensure_stopped()?;
        *lock(&self.shared.state_change_handler) = handler;
        Ok(())
    }

    /// Choose the threading scheme. Pre-start only.
    pub fn set_thread_scheme(&self, scheme: ThreadScheme) -> Result<(), EngineError> {
        self.ensure_stopped()?;
        *lock(&self.shared.scheme) = scheme;
        Ok(())
    }

    /// Bring the engine up: spawn the reaper and the scheme's
    /// dispatchers, and wait until every dispatcher is running.
    pub async fn start(&self) -> Result<(), EngineError> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyRunning);
        }

        let (reaper_tx, mut reaper_rx) = mpsc::unbounded_channel::<JoinHandle<()>>();
        *lock(&self.shared.reaper_tx) = Some(reaper_tx);
        let reaper = tokio::spawn(async move {
            while let Some(handle) = reaper_rx.recv().await {
                if let Err(err) = handle.await {
                    tracing::debug!(%err, "dispatcher task ended abnormally");
                }
            }
        });
        *lock(&self.reaper) = Some(reaper);

        let scheme = *lock(&self.shared.scheme);
        let mut ready = Vec::new();
        match scheme {
            ThreadScheme::PerEngine => {
                let queue = Arc::new(EventQueue::new());
                let (handle, rx) = dispatcher::spawn(
                    format!("{}/engine", self.shared.id),
                    Arc::clone(&queue),
                    Arc::clone(&self.shared),
                );
                *lock(&self.shared.engine_queue) = Some(queue);
                lock(&self.shared.dispatchers).push(handle);
                ready.push(rx);
            }
            ThreadScheme::PerModel => {
                let names: Vec<String> = lock(&self.shared.models).keys().cloned().collect();
                for name in names {
                    let queue = Arc::new(EventQueue::new());
                    let (handle, rx) = dispatcher::spawn(
                        format!("{}/{}", self.shared.id, name),
                        Arc::clone(&queue),
                        Arc::clone(&self.shared),
                    );
                    lock(&self.shared.model_queues).insert(name, queue);
                    lock(&self.shared.dispatchers).push(handle);
                    ready.push(rx);
                }
            }
            // Dispatchers are spawned as entities are created.
            ThreadScheme::PerEntity => {}
        }
        for rx in ready {
            let _ = rx.await;
        }
        tracing::info!(engine = %self.shared.id, %scheme, "engine started");
        Ok(())
    }

    /// Create an entity of a registered model and queue its
    /// initialization event. Requires a running engine.
    pub fn create_entity(
        &self,
        model_name: &str,
        entity_id: impl Into<String>,
        init_args: Vec<Value>,
    ) -> Result<(), EngineError> {
        self.ensure_running()?;
        let entity_id = entity_id.into();

        let model = lock(&self.shared.models)
            .get(model_name)
            .cloned()
            .ok_or_else(|| EngineError::NoSuchModel(model_name.to_string()))?;
        let initial = model
            .initial_state()
            .ok_or_else(|| EngineError::NoInitialState(model_name.to_string()))?;
        let expected = model
            .state_arg_kinds(initial)
            .ok_or_else(|| EngineError::NoInitialState(model_name.to_string()))?;
        if !args_assignable(expected, &init_args) {
            return Err(EngineError::BadInitArgs(model_name.to_string()));
        }

        let scheme = *lock(&self.shared.scheme);
        let queue = match scheme {
            ThreadScheme::PerEngine => lock(&self.shared.engine_queue)
                .clone()
                .ok_or(EngineError::NotRunning)?,
            ThreadScheme::PerModel => lock(&self.shared.model_queues)
                .get(model_name)
                .cloned()
                .ok_or(EngineError::NotRunning)?,
            ThreadScheme::PerEntity => Arc::new(EventQueue::new()),
        };

        let entity = Arc::new(Entity::new(entity_id.clone(), model, Arc::clone(&queue)));
        {
            let mut entities = lock(&self.shared.entities);
            if entities.contains_key(&entity_id) {
                return Err(EngineError::DuplicateEntity(entity_id));
            }
            if scheme == ThreadScheme::PerEntity {
                let (handle, _ready) = dispatcher::spawn(
                    format!("{}/{}", self.shared.id, entity_id),
                    Arc::clone(&queue),
                    Arc::clone(&self.shared),
                );
                entity.set_dispatcher(handle);
            }
            entities.insert(entity_id.clone(), Arc::clone(&entity));
        }

        // Initialization outranks any event already waiting on a
        // shared queue.
        queue.push_internal(Event::init(entity_id, init_args));
        Ok(())
    }

    /// Queue an event toward an entity's normal channel. Lookup and
    /// argument problems are reported synchronously.
    pub fn generate_event(
        &self,
        entity_id: &str,
        event: &str,
        args: Vec<Value>,
    ) -> Result<(), EngineError> {
        self.ensure_running()?;
        self.shared.submit(entity_id, event, args)?;
        Ok(())
    }

    /// Stop accepting work and close every queue. Non-blocking; use
    /// [`join`](Engine::join) to wait for the dispatchers to finish.
    pub fn shutdown(&self) -> Result<(), EngineError> {
        if self
            .shared
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::NotRunning);
        }

        if let Some(queue) = lock(&self.shared.engine_queue).take() {
            queue.close();
        }
        for (_, queue) in lock(&self.shared.model_queues).drain() {
            queue.close();
        }
        let entities: Vec<Arc<Entity>> = lock(&self.shared.entities).values().cloned().collect();
        for entity in entities {
            entity.queue().close();
            if let Some(handle) = entity.take_dispatcher() {
                self.shared.retire(handle);
            }
        }
        for handle in lock(&self.shared.dispatchers).drain(..) {
            self.shared.retire(handle);
        }
        // Dropping the sender lets the reaper drain and exit.
        lock(&self.shared.reaper_tx).take();
        tracing::info!(engine = %self.shared.id, "engine shut down");
        Ok(())
    }

    /// Wait for the reaper, and with it every dispatcher, to finish.
    pub async fn join(&self) {
        let reaper = lock(&self.reaper).take();
        if let Some(reaper) = reaper {
            let _ = reaper.await;
        }
    }

    pub fn has_entity(&self, entity_id: &str) -> bool {
        self.shared.entity(entity_id).is_some()
    }

    /// The entity's current state name, if it exists and has been
    /// initialized.
    pub fn current_state(&self, entity_id: &str) -> Option<String> {
        self.shared.entity(entity_id)?.current_state()
    }

    pub fn entity_count(&self) -> usize {
        lock(&self.shared.entities).len()
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
