// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument kinds for event and state signatures
//!
//! Event specs and state actions declare an ordered list of argument
//! kinds. Kinds are checked once, at model configuration time and at
//! event generation time; dispatch itself never inspects payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a single positional argument.
///
/// `Any` accepts every value. `Value::Null` is accepted by every kind,
/// so optional arguments can be passed as null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    Bool,
    Number,
    String,
    Array,
    Object,
    Any,
}

impl ArgKind {
    /// The kind of a concrete value. Null maps to `Any`.
    pub fn of(value: &Value) -> ArgKind {
        match value {
            Value::Null => ArgKind::Any,
            Value::Bool(_) => ArgKind::Bool,
            Value::Number(_) => ArgKind::Number,
            Value::String(_) => ArgKind::String,
            Value::Array(_) => ArgKind::Array,
            Value::Object(_) => ArgKind::Object,
        }
    }

    /// Whether a value of kind `actual` can be passed where `self` is
    /// expected.
    pub fn accepts(&self, actual: ArgKind) -> bool {
        matches!(self, ArgKind::Any) || actual == ArgKind::Any || *self == actual
    }
}

/// Whether an argument list of kinds `actual` is assignable to the
/// expected signature. Lengths must match exactly.
pub fn kinds_assignable(expected: &[ArgKind], actual: &[ArgKind]) -> bool {
    expected.len() == actual.len()
        && expected.iter().zip(actual).all(|(e, a)| e.accepts(*a))
}

/// Whether concrete argument values fit the expected signature.
pub fn args_assignable(expected: &[ArgKind], args: &[Value]) -> bool {
    expected.len() == args.len()
        && expected
            .iter()
            .zip(args)
            .all(|(e, v)| e.accepts(ArgKind::of(v)))
}
