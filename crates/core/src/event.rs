// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event specs and in-flight events

use crate::value::ArgKind;
use serde_json::Value;

/// The named, typed description of an event kind within one model.
#[derive(Debug, Clone)]
pub struct EventSpec {
    pub name: String,
    pub arg_kinds: Vec<ArgKind>,
}

impl EventSpec {
    pub fn new(name: impl Into<String>, arg_kinds: Vec<ArgKind>) -> Self {
        Self {
            name: name.into(),
            arg_kinds,
        }
    }
}

/// A single event in flight toward an entity.
///
/// The target is referenced by id and resolved through the engine's
/// registry at delivery time. A missing spec marks the initialization
/// event that puts a freshly created entity into its model's initial
/// state.
#[derive(Debug, Clone)]
pub struct Event {
    /// Target entity id.
    pub entity: String,
    /// Event spec name; `None` for the initialization event.
    pub spec: Option<String>,
    /// Positional argument values.
    pub args: Vec<Value>,
}

impl Event {
    /// An ordinary event carrying a named spec.
    pub fn new(entity: impl Into<String>, spec: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            entity: entity.into(),
            spec: Some(spec.into()),
            args,
        }
    }

    /// The initialization event for a freshly created entity.
    pub fn init(entity: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            entity: entity.into(),
            spec: None,
            args,
        }
    }

    /// Whether this is an initialization event.
    pub fn is_init(&self) -> bool {
        self.spec.is_none()
    }
}
