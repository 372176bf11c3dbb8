// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use machina_core::ProcessingError;
use thiserror::Error;

/// Engine misuse, reported synchronously to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("model `{0}` is already registered")]
    DuplicateModel(String),

    #[error("no such model `{0}`")]
    NoSuchModel(String),

    #[error("entity `{0}` already exists")]
    DuplicateEntity(String),

    #[error("model `{0}` has no initial state")]
    NoInitialState(String),

    #[error("init arguments do not match the initial state of model `{0}`")]
    BadInitArgs(String),

    #[error("unknown thread scheme `{0}`")]
    UnknownScheme(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}
