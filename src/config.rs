//! Engine configuration, with defaults overridable from `PLAYFIELD_*`
//! environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;

use crate::consts::{
    DEFAULT_ATLAS_URL, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_SCRIPT_MAX_OPERATIONS, DEFAULT_SPRITE_SIZE,
    DEFAULT_STORAGE_KEY,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {message}")]
    Parse { key: String, value: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Atlas image loaded at startup.
    pub atlas_url: String,
    pub sprite_size: u32,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Storage key documents are saved under.
    pub storage_key: String,
    pub debug_boxes: bool,
    /// Interpreter operation cap per script call.
    pub script_max_operations: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            atlas_url: DEFAULT_ATLAS_URL.to_owned(),
            sprite_size: DEFAULT_SPRITE_SIZE,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            debug_boxes: false,
            script_max_operations: DEFAULT_SCRIPT_MAX_OPERATIONS,
        }
    }
}

impl EngineConfig {
    /// Read overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for a set variable that doesn't parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Read overrides through `lookup`; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for a value that doesn't parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, ConfigError>,
    {
        let defaults = Self::default();
        Ok(Self {
            atlas_url: lookup("PLAYFIELD_ATLAS_URL")?.unwrap_or(defaults.atlas_url),
            sprite_size: parsed(&lookup, "PLAYFIELD_SPRITE_SIZE", defaults.sprite_size)?,
            canvas_width: parsed(&lookup, "PLAYFIELD_CANVAS_WIDTH", defaults.canvas_width)?,
            canvas_height: parsed(&lookup, "PLAYFIELD_CANVAS_HEIGHT", defaults.canvas_height)?,
            storage_key: lookup("PLAYFIELD_STORAGE_KEY")?.unwrap_or(defaults.storage_key),
            debug_boxes: flag(&lookup, "PLAYFIELD_DEBUG_BOXES", defaults.debug_boxes)?,
            script_max_operations: parsed(&lookup, "PLAYFIELD_SCRIPT_MAX_OPERATIONS", defaults.script_max_operations)?,
        })
    }
}

fn env_lookup(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::Parse {
            key: key.to_owned(),
            value: raw.to_string_lossy().into_owned(),
            message: "not valid unicode".into(),
        }),
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Result<Option<String>, ConfigError>,
{
    let Some(raw) = lookup(key)? else {
        return Ok(default);
    };
    raw.trim().parse::<T>().map_err(|e| ConfigError::Parse { key: key.to_owned(), value: raw.clone(), message: e.to_string() })
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Result<Option<String>, ConfigError>,
{
    let Some(raw) = lookup(key)? else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse { key: key.to_owned(), value: raw, message: "expected a boolean".into() }),
    }
}
