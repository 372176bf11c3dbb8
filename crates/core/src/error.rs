// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for model configuration and event processing

use thiserror::Error;

/// Model misconfiguration. Raised synchronously to the caller of the
/// configuration operation and never swallowed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("event spec `{0}` already defined")]
    DuplicateEvent(String),

    #[error("state `{0}` already defined")]
    DuplicateState(String),

    #[error("no such state `{0}`")]
    UnknownState(String),

    #[error("no such event `{0}`")]
    UnknownEvent(String),

    #[error("initial state has already been set")]
    InitialStateAlreadySet,

    #[error("end state required for `{0}` transitions")]
    MissingEndState(&'static str),

    #[error("end state not allowed for ignore transitions")]
    EndStateOnIgnore,

    #[error("transition already defined for state `{state}` on event `{event}`")]
    DuplicateTransition { state: String, event: String },

    #[error("argument mismatch between event `{event}` and state `{state}`")]
    ArgumentMismatch { event: String, state: String },
}

/// A failure raised by state action code.
///
/// Actions report problems by returning this; the dispatcher forwards
/// them to the exception handler and carries on with the next event.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ActionError(String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<ProcessingError> for ActionError {
    fn from(err: ProcessingError) -> Self {
        Self(err.to_string())
    }
}

/// A runtime delivery failure. Reported to the installed exception
/// handler (or silently dropped when none is installed); never fatal
/// to the dispatcher loop.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("no such entity `{0}`")]
    NoSuchEntity(String),

    #[error("event delivered to deleted entity `{0}`")]
    DeletedEntity(String),

    #[error("no such event `{event}` in model `{model}`")]
    NoSuchEvent { model: String, event: String },

    #[error("no transition for event `{event}` in state `{state}` of entity `{entity}`")]
    NoTransition {
        entity: String,
        state: String,
        event: String,
    },

    #[error("entity `{0}` has not completed initialization")]
    NotInitialized(String),

    #[error("arguments do not match event `{event}` in model `{model}`")]
    BadEventArgs { model: String, event: String },

    #[error("action failed in state `{state}` of entity `{entity}`: {message}")]
    ActionFailed {
        entity: String,
        state: String,
        message: String,
    },
}
