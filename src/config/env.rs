//! Environment based settings

use crate::error::{ConfigError, ConfigResult};
use std::env;

/// Environment variable that disables every run when set to false
pub const KILL_SWITCH: &str = "KARGAR";

/// Settings read from the process environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Whether runs are allowed
    pub enabled: bool,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through a lookup function
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = match lookup(KILL_SWITCH) {
            None => true,
            Some(value) if value.is_empty() => true,
            Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::InvalidKillSwitch {
                var: KILL_SWITCH.to_string(),
                value,
            })?,
        };
        Ok(Settings { enabled })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings { enabled: true }
    }
}

/// Parse a boolean the way build scripts usually spell one
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
