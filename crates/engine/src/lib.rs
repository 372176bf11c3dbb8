// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Machina engine: dispatchers, threading schemes, and bootstrap
//!
//! Hosts entities built from `machina-core` models. An [`Engine`]
//! owns the entity registry and a set of queue/dispatcher pairs whose
//! shape is chosen by the [`ThreadScheme`]; [`bootstrap`] supplies the
//! initial handler and scheme settings.

mod bootstrap;
mod dispatcher;
mod error;
mod handlers;
mod runtime;
mod scheme;

pub use bootstrap::{bootstrap, bootstrap_from, Defaults, CONFIG_ENV};
pub use error::EngineError;
pub use handlers::{
    ExceptionHandler, LogExceptionHandler, LogStateChangeHandler, StateChange, StateChangeHandler,
};
pub use runtime::Engine;
pub use scheme::ThreadScheme;
