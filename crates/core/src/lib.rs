// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Machina core: models, entities, events, and queues
//!
//! The building blocks of the event-driven entity runtime. A [`Model`]
//! describes states, typed event specs, and a transition table; an
//! [`Entity`] is one live instance of a model; an [`EventQueue`]
//! buffers events toward the dispatcher that drives them. The engine
//! crate wires these together into a running system.

mod entity;
mod error;
mod event;
mod model;
mod queue;
mod value;

pub use entity::{ActionContext, Entity, EntityState, EventSink};
pub use error::{ActionError, ConfigError, ProcessingError};
pub use event::{Event, EventSpec};
pub use model::{Action, Behavior, Model, StateModel, Transition, TransitionKind};
pub use queue::EventQueue;
pub use value::{args_assignable, kinds_assignable, ArgKind};
