// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::EngineError;
use std::fmt;
use std::str::FromStr;

/// How queue/dispatcher pairs map onto entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadScheme {
    /// One shared queue and dispatcher for the whole engine.
    #[default]
    PerEngine,
    /// One queue and dispatcher per registered model.
    PerModel,
    /// A private queue and dispatcher for every entity.
    PerEntity,
}

impl FromStr for ThreadScheme {
    type Err = EngineError;

    /// Parses the configuration spelling. Case-insensitive, trimmed;
    /// an empty string means the default scheme.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(ThreadScheme::default());
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "engine" => Ok(ThreadScheme::PerEngine),
            "model" => Ok(ThreadScheme::PerModel),
            "entity" => Ok(ThreadScheme::PerEntity),
            _ => Err(EngineError::UnknownScheme(trimmed.to_string())),
        }
    }
}

impl fmt::Display for ThreadScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreadScheme::PerEngine => "engine",
            ThreadScheme::PerModel => "model",
            ThreadScheme::PerEntity => "entity",
        };
        f.write_str(name)
    }
}
