//! Input files for the `scorecard` binary.
//!
//! An input file is TOML with an optional `lowercase` flag and any number of
//! `[[input]]` tables. Every string key in an input table becomes a variable
//! binding for one run:
//!
//! ```toml
//! lowercase = true
//!
//! [[input]]
//! title = "Running From Zombies: the best film of 2019?"
//! topic = "movies"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::vm::Scores;

pub type Variables = IndexMap<String, String>;

#[derive(Debug, Clone)]
pub enum ConfigError {
    IOError(String),
    ParseError(String),
    InvalidBinding(String),
    SerializeError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::IOError(msg) => write!(f, "IO error: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Invalid input file: {}", msg),
            ConfigError::InvalidBinding(arg) => {
                write!(f, "Invalid binding '{}', expected name=value", arg)
            }
            ConfigError::SerializeError(msg) => write!(f, "Could not format scores: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputFile {
    /// Lowercase every bound value before running
    #[serde(default)]
    pub lowercase: bool,
    #[serde(default, rename = "input")]
    pub inputs: Vec<Variables>,
}

impl InputFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IOError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let file: InputFile =
            toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        log::debug!(
            "loaded {} inputs (lowercase: {})",
            file.inputs.len(),
            file.lowercase
        );
        Ok(file)
    }

    /// Binding sets ready to run, with `lowercase` applied
    pub fn bindings(&self) -> Vec<Variables> {
        self.inputs
            .iter()
            .map(|vars| apply_case(vars.clone(), self.lowercase))
            .collect()
    }
}

pub fn apply_case(vars: Variables, lowercase: bool) -> Variables {
    if !lowercase {
        return vars;
    }
    vars.into_iter()
        .map(|(name, value)| (name, value.to_lowercase()))
        .collect()
}

/// Split a `name=value` command line binding
pub fn parse_binding(arg: &str) -> Result<(String, String), ConfigError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(ConfigError::InvalidBinding(arg.to_string())),
    }
}

/// One run as printed by the binary
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub input: &'a Variables,
    pub scores: &'a Scores,
}

impl RunReport<'_> {
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
