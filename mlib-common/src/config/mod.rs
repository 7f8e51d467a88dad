//! Configuration for the catalog service.
//!
//! Two kinds of configuration live here:
//!
//! - Runtime settings (database location, listen port), resolved from the
//!   environment with an on-disk TOML override and a compiled default.
//! - The trusted static registries describing the catalog schema: lookup
//!   tables ([`tables`]), report column specifications ([`columns`]), and
//!   the printable record layout ([`print`]). These are configuration data,
//!   not user input; table and column identifiers from these registries may
//!   be interpolated into SQL text, values never are.

pub mod columns;
pub mod print;
pub mod tables;

use crate::{Error, Result};
use std::path::PathBuf;

/// Default listen port for the catalog API service.
pub const DEFAULT_PORT: u16 = 5780;

/// Resolve the database file path.
///
/// Priority order:
/// 1. `MLIB_DATABASE` environment variable
/// 2. `database` key in the user TOML config file
/// 3. OS-dependent default data directory
pub fn resolve_database_path() -> PathBuf {
    if let Ok(path) = std::env::var("MLIB_DATABASE") {
        return PathBuf::from(path);
    }

    if let Ok(config_path) = config_file_path() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&content) {
                if let Some(path) = config.get("database").and_then(|v| v.as_str()) {
                    return PathBuf::from(path);
                }
            }
        }
    }

    default_data_dir().join("catalog.db")
}

/// Resolve the listen port (`MLIB_PORT` environment variable, TOML
/// `port` key, then [`DEFAULT_PORT`]).
pub fn resolve_port() -> u16 {
    if let Ok(port) = std::env::var("MLIB_PORT") {
        if let Ok(port) = port.parse() {
            return port;
        }
        tracing::warn!("ignoring unparseable MLIB_PORT value {:?}", port);
    }

    if let Ok(config_path) = config_file_path() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&content) {
                if let Some(port) = config.get("port").and_then(|v| v.as_integer()) {
                    return port as u16;
                }
            }
        }
    }

    DEFAULT_PORT
}

/// Path to the maintenance-mode flag file. When this file exists the
/// front end displays the maintenance banner and blocks edits.
pub fn maintenance_flag_path() -> PathBuf {
    default_data_dir().join("maintenance-mode")
}

/// Per-user config file location (`~/.config/mlib/config.toml`).
fn config_file_path() -> Result<PathBuf> {
    let path = dirs::config_dir()
        .map(|d| d.join("mlib").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default data directory for the catalog.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mlib"))
        .unwrap_or_else(|| PathBuf::from("./mlib_data"))
}
