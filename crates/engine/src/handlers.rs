// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pluggable exception and state-change handlers
//!
//! Handlers are invoked inline from dispatcher tasks, so they must be
//! quick and must not block. With no exception handler installed,
//! processing errors are dropped silently.

use chrono::{DateTime, Utc};
use machina_core::{ProcessingError, TransitionKind};
use serde_json::Value;

/// Receives runtime delivery failures from dispatchers.
pub trait ExceptionHandler: Send + Sync {
    fn handle_exception(&self, error: &ProcessingError);
}

/// An audit record for one matched transition.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub at: DateTime<Utc>,
    pub entity: String,
    /// `None` for the initialization transition.
    pub from: Option<String>,
    /// Triggering event name; `None` for initialization.
    pub event: Option<String>,
    pub args: Vec<Value>,
    pub kind: TransitionKind,
    /// `None` when the event was ignored.
    pub to: Option<String>,
}

/// Receives an audit record for every matched transition, including
/// ignored events and excursions.
pub trait StateChangeHandler: Send + Sync {
    fn handle_state_change(&self, change: StateChange);
}

/// Default exception handler: logs at error level.
pub struct LogExceptionHandler;

impl ExceptionHandler for LogExceptionHandler {
    fn handle_exception(&self, error: &ProcessingError) {
        tracing::error!(%error, "event processing failed");
    }
}

/// Built-in state-change handler: logs at info level.
pub struct LogStateChangeHandler;

impl StateChangeHandler for LogStateChangeHandler {
    fn handle_state_change(&self, change: StateChange) {
        tracing::info!(
            entity = %change.entity,
            from = change.from.as_deref().unwrap_or("<init>"),
            to = change.to.as_deref().unwrap_or("<none>"),
            event = change.event.as_deref().unwrap_or("<init>"),
            kind = ?change.kind,
            "state change"
        );
    }
}
