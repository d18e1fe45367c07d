//! Runtime configuration
//!
//! Loaded from a YAML file; every field has a default so a partial (or
//! missing) file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub expansion: ExpansionConfig,
    pub search: SearchConfig,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    pub minimap: MinimapConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn db_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_db_path)
    }
}

/// `<data dir>/ideamap/ideamap.db`, or `./ideamap.db` when the platform has no
/// data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("ideamap").join("ideamap.db"))
        .unwrap_or_else(|| PathBuf::from("ideamap.db"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub max_depth: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_depth: crate::query::DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: crate::query::DEFAULT_SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Graphs with more nodes than this use the large tier
    pub large_threshold: usize,
    /// Graphs with at least this many nodes use the medium tier
    pub medium_threshold: usize,
    /// Fixed RNG seed for initial placement
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            large_threshold: 200,
            medium_threshold: 100,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// World units added on each side of the bounds before fitting
    pub fit_padding: f64,
    /// Fit never zooms in past this
    pub fit_max_zoom: f64,
    /// Layout time before the initial fit
    pub fit_delay_ms: u64,
    pub focus_zoom: f64,
    pub focus_duration_ms: u64,
    /// Scheduler frame interval
    pub frame_ms: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            min_zoom: 0.1,
            max_zoom: 8.0,
            fit_padding: 50.0,
            fit_max_zoom: 2.0,
            fit_delay_ms: 500,
            focus_zoom: 1.5,
            focus_duration_ms: 750,
            frame_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 150.0,
            padding: 10.0,
        }
    }
}

impl Config {
    /// Read and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not an empty mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.search.limit == 0 {
            return invalid("search.limit must be at least 1");
        }
        if self.layout.medium_threshold > self.layout.large_threshold {
            return invalid("layout.medium_threshold must not exceed layout.large_threshold");
        }

        let vp = &self.viewport;
        if !(vp.width > 0.0 && vp.height > 0.0) {
            return invalid("viewport size must be positive");
        }
        if !(vp.min_zoom > 0.0 && vp.min_zoom <= vp.max_zoom) {
            return invalid("viewport zoom range must satisfy 0 < min_zoom <= max_zoom");
        }
        if !(vp.fit_max_zoom > 0.0) || vp.fit_padding < 0.0 {
            return invalid("viewport fit settings must be non-negative");
        }
        if vp.frame_ms == 0 {
            return invalid("viewport.frame_ms must be at least 1");
        }

        let mm = &self.minimap;
        if !(mm.width > 2.0 * mm.padding && mm.height > 2.0 * mm.padding) || mm.padding < 0.0 {
            return invalid("minimap must be larger than twice its padding");
        }
        Ok(())
    }
}
