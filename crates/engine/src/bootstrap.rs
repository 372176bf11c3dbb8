// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap defaults for new engines
//!
//! `bootstrap()` reads an optional TOML resource named by the
//! `MACHINA_CONFIG` environment variable and produces an explicit
//! [`Defaults`] value. A missing or broken resource never fails the
//! process: each key falls back to its built-in default with a
//! warning. Custom handlers are installed programmatically through the
//! engine's setters; the resource only selects among named built-ins.

use crate::handlers::{
    ExceptionHandler, LogExceptionHandler, LogStateChangeHandler, StateChangeHandler,
};
use crate::scheme::ThreadScheme;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Environment variable naming the bootstrap resource.
pub const CONFIG_ENV: &str = "MACHINA_CONFIG";

/// Initial handler and scheme settings for a new engine.
#[derive(Clone)]
pub struct Defaults {
    pub exception_handler: Option<Arc<dyn ExceptionHandler>>,
    pub state_change_handler: Option<Arc<dyn StateChangeHandler>>,
    pub thread_scheme: ThreadScheme,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            exception_handler: Some(Arc::new(LogExceptionHandler)),
            state_change_handler: None,
            thread_scheme: ThreadScheme::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct BootstrapFile {
    exception_handler: Option<String>,
    state_change_handler: Option<String>,
    thread_scheme: Option<String>,
}

/// Defaults from the resource named by `MACHINA_CONFIG`, or the
/// built-in defaults when the variable is unset.
pub fn bootstrap() -> Defaults {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => bootstrap_from(Path::new(&path)),
        Err(_) => Defaults::default(),
    }
}

/// Defaults from a specific resource path.
pub fn bootstrap_from(path: &Path) -> Defaults {
    let mut defaults = Defaults::default();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "bootstrap resource unreadable, using defaults");
            return defaults;
        }
    };
    let file: BootstrapFile = match toml::from_str(&raw) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "bootstrap resource unparseable, using defaults");
            return defaults;
        }
    };

    if let Some(name) = file.exception_handler {
        match name.trim() {
            "" => defaults.exception_handler = None,
            "log" => defaults.exception_handler = Some(Arc::new(LogExceptionHandler)),
            other => {
                tracing::warn!(handler = %other, "unknown exception handler, keeping default");
            }
        }
    }
    if let Some(name) = file.state_change_handler {
        match name.trim() {
            "" => defaults.state_change_handler = None,
            "log" => defaults.state_change_handler = Some(Arc::new(LogStateChangeHandler)),
            other => {
                tracing::warn!(handler = %other, "unknown state-change handler, keeping default");
            }
        }
    }
    if let Some(raw) = file.thread_scheme {
        match raw.parse::<ThreadScheme>() {
            Ok(scheme) => defaults.thread_scheme = scheme,
            Err(err) => {
                tracing::warn!(%err, "bad thread scheme in bootstrap resource, keeping default");
            }
        }
    }
    defaults
}
