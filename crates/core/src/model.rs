// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Models: states, event specs, and the transition table
//!
//! A model is configured once, then frozen behind `Arc<dyn StateModel>`
//! and shared by every entity built from it. State actions are plain
//! closures over the model's behavior type; the `StateModel` trait
//! erases that type so the dispatcher can drive entities of different
//! models through one interface.

use crate::entity::ActionContext;
use crate::error::{ActionError, ConfigError};
use crate::event::EventSpec;
use crate::value::{kinds_assignable, ArgKind};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;

/// How a transition treats the end state's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Move to the end state and execute its action.
    Normal,
    /// Move to the end state without executing its action.
    DoNotExecute,
    /// Execute the end state's action, then return to the state the
    /// entity was in when the event arrived.
    Excursion,
    /// Consume the event silently. No state change, no action.
    Ignore,
}

impl TransitionKind {
    fn label(self) -> &'static str {
        match self {
            TransitionKind::Normal => "normal",
            TransitionKind::DoNotExecute => "do-not-execute",
            TransitionKind::Excursion => "excursion",
            TransitionKind::Ignore => "ignore",
        }
    }

    /// Whether the end state's action runs with the event's arguments.
    fn executes_action(self) -> bool {
        matches!(self, TransitionKind::Normal | TransitionKind::Excursion)
    }
}

/// One row of a state's transition table.
#[derive(Debug, Clone)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Absent only for `Ignore`.
    pub end_state: Option<String>,
}

/// The per-entity data a model's state actions operate on.
///
/// Blanket-implemented; any `Default + Send + 'static` type qualifies.
/// Each entity gets a fresh value via `Default` at creation.
pub trait Behavior: Default + Send + 'static {}

impl<T: Default + Send + 'static> Behavior for T {}

/// A state action: runs on entry (per the transition kind) with the
/// triggering event's arguments.
pub type Action<B> = Box<
    dyn Fn(&mut B, &mut ActionContext<'_>, &[Value]) -> Result<(), ActionError> + Send + Sync,
>;

struct State<B> {
    arg_kinds: Vec<ArgKind>,
    action: Action<B>,
    transitions: HashMap<String, Transition>,
}

/// A configurable state machine definition.
pub struct Model<B> {
    name: String,
    event_specs: HashMap<String, EventSpec>,
    states: HashMap<String, State<B>>,
    initial_state: Option<String>,
}

impl<B: Behavior> Model<B> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event_specs: HashMap::new(),
            states: HashMap::new(),
            initial_state: None,
        }
    }

    /// Declare an event kind and its argument signature.
    pub fn add_event_spec(
        &mut self,
        name: impl Into<String>,
        arg_kinds: Vec<ArgKind>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.event_specs.contains_key(&name) {
            return Err(ConfigError::DuplicateEvent(name));
        }
        self.event_specs
            .insert(name.clone(), EventSpec::new(name, arg_kinds));
        Ok(())
    }

    /// Declare a state, its action, and the argument signature the
    /// action expects.
    pub fn add_state<F>(
        &mut self,
        name: impl Into<String>,
        arg_kinds: Vec<ArgKind>,
        action: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&mut B, &mut ActionContext<'_>, &[Value]) -> Result<(), ActionError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.states.contains_key(&name) {
            return Err(ConfigError::DuplicateState(name));
        }
        self.states.insert(
            name,
            State {
                arg_kinds,
                action: Box::new(action),
                transitions: HashMap::new(),
            },
        );
        Ok(())
    }

    /// Mark the state entities start in. Settable exactly once.
    pub fn set_initial_state(&mut self, name: impl Into<String>) -> Result<(), ConfigError> {
        let name = name.into();
        if self.initial_state.is_some() {
            return Err(ConfigError::InitialStateAlreadySet);
        }
        if !self.states.contains_key(&name) {
            return Err(ConfigError::UnknownState(name));
        }
        self.initial_state = Some(name);
        Ok(())
    }

    /// Add one row to a state's transition table.
    ///
    /// `end_state` is required for every kind except `Ignore`, which
    /// forbids it. Where the transition executes the end state's
    /// action, the event's argument signature must be assignable to
    /// the state's.
    pub fn add_transition(
        &mut self,
        state: impl Into<String>,
        event: impl Into<String>,
        kind: TransitionKind,
        end_state: Option<String>,
    ) -> Result<(), ConfigError> {
        let state = state.into();
        let event = event.into();
        if !self.states.contains_key(&state) {
            return Err(ConfigError::UnknownState(state));
        }
        let spec = self
            .event_specs
            .get(&event)
            .ok_or_else(|| ConfigError::UnknownEvent(event.clone()))?;

        let end_state = match (kind, end_state) {
            (TransitionKind::Ignore, Some(_)) => return Err(ConfigError::EndStateOnIgnore),
            (TransitionKind::Ignore, None) => None,
            (_, None) => return Err(ConfigError::MissingEndState(kind.label())),
            (_, Some(end)) => {
                let target = self
                    .states
                    .get(&end)
                    .ok_or_else(|| ConfigError::UnknownState(end.clone()))?;
                if kind.executes_action() && !kinds_assignable(&target.arg_kinds, &spec.arg_kinds)
                {
                    return Err(ConfigError::ArgumentMismatch {
                        event,
                        state: end,
                    });
                }
                Some(end)
            }
        };

        let row = self
            .states
            .get_mut(&state)
            .ok_or_else(|| ConfigError::UnknownState(state.clone()))?;
        if row.transitions.contains_key(&event) {
            return Err(ConfigError::DuplicateTransition { state, event });
        }
        row.transitions.insert(event, Transition { kind, end_state });
        Ok(())
    }

    pub fn add_normal_transition(
        &mut self,
        state: impl Into<String>,
        event: impl Into<String>,
        end_state: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.add_transition(state, event, TransitionKind::Normal, Some(end_state.into()))
    }

    pub fn add_silent_transition(
        &mut self,
        state: impl Into<String>,
        event: impl Into<String>,
        end_state: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.add_transition(
            state,
            event,
            TransitionKind::DoNotExecute,
            Some(end_state.into()),
        )
    }

    pub fn add_excursion(
        &mut self,
        state: impl Into<String>,
        event: impl Into<String>,
        excursion_state: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.add_transition(
            state,
            event,
            TransitionKind::Excursion,
            Some(excursion_state.into()),
        )
    }

    pub fn add_ignore(
        &mut self,
        state: impl Into<String>,
        event: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.add_transition(state, event, TransitionKind::Ignore, None)
    }
}

/// Type-erased view of a configured model.
///
/// Dispatchers and the engine work entirely through this trait, so
/// entities with different behavior types share one runtime.
pub trait StateModel: Send + Sync {
    fn name(&self) -> &str;

    fn initial_state(&self) -> Option<&str>;

    fn event_spec(&self, name: &str) -> Option<&EventSpec>;

    fn has_state(&self, state: &str) -> bool;

    /// The argument signature of a state's action.
    fn state_arg_kinds(&self, state: &str) -> Option<&[ArgKind]>;

    /// The transition table row for `(state, event)`, if any.
    fn transition(&self, state: &str, event: &str) -> Option<&Transition>;

    /// A fresh behavior value for a new entity.
    fn spawn_behavior(&self) -> Box<dyn Any + Send>;

    /// Run a state's action against an entity's behavior.
    fn invoke(
        &self,
        state: &str,
        behavior: &mut dyn Any,
        ctx: &mut ActionContext<'_>,
        args: &[Value],
    ) -> Result<(), ActionError>;
}

impl<B: Behavior> StateModel for Model<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_state(&self) -> Option<&str> {
        self.initial_state.as_deref()
    }

    fn event_spec(&self, name: &str) -> Option<&EventSpec> {
        self.event_specs.get(name)
    }

    fn has_state(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }

    fn state_arg_kinds(&self, state: &str) -> Option<&[ArgKind]> {
        self.states.get(state).map(|s| s.arg_kinds.as_slice())
    }

    fn transition(&self, state: &str, event: &str) -> Option<&Transition> {
        self.states.get(state)?.transitions.get(event)
    }

    fn spawn_behavior(&self) -> Box<dyn Any + Send> {
        Box::new(B::default())
    }

    fn invoke(
        &self,
        state: &str,
        behavior: &mut dyn Any,
        ctx: &mut ActionContext<'_>,
        args: &[Value],
    ) -> Result<(), ActionError> {
        let row = self
            .states
            .get(state)
            .ok_or_else(|| ActionError::new(format!("no such state `{state}`")))?;
        let behavior = behavior
            .downcast_mut::<B>()
            .ok_or_else(|| ActionError::new("behavior type does not match model"))?;
        (row.action)(behavior, ctx, args)
    }
}
