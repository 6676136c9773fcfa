//! Process settings, layered from an optional `facadex.toml` and `FACADEX_*`
//! environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_FILE: &str = "facadex.toml";

/// What dispatch does when no triplifier matches a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedFormat {
    #[default]
    Fail,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub unsupported_format: UnsupportedFormat,
    /// Directory for SQLite scratch stores, used for every source when set.
    pub ondisk: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unsupported_format: UnsupportedFormat::Fail,
            ondisk: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    /// Reads `path`, which must then exist, or `facadex.toml` in the working
    /// directory if present, and applies the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));
        let settings = Config::builder()
            .add_source(File::from(file).required(path.is_some()))
            .add_source(Environment::with_prefix("FACADEX"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
