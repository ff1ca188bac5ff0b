//! Configuration system for viewer behavior tuning
//!
//! The zoom thresholds and resolution bounds are fixed inputs to the viewer,
//! never computed. They default to the values in [`crate::core::constants`]
//! and can be overridden from a JSON document.

use crate::core::constants::{
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_URL_TEMPLATE, DEMOTE_BELOW_SCALE, MAX_RESOLUTION, MAX_SCALE,
    MAX_SUPPORTED_RESOLUTION, MIN_RESOLUTION, MIN_SCALE, RESET_SCALE, SCROLL_OFFSET,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub zoom: ZoomConfig,
    pub server: TileServerConfig,
}

impl ViewerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(json).map_err(Error::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(Error::from)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.zoom.validate()?;
        self.server.validate()
    }
}

/// Bounds and thresholds of the resolution/zoom state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_resolution: u32,
    pub max_resolution: u32,
    pub scroll_offset: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub reset_scale: f64,
    pub demote_below: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_resolution: MIN_RESOLUTION,
            max_resolution: MAX_RESOLUTION,
            scroll_offset: SCROLL_OFFSET,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            reset_scale: RESET_SCALE,
            demote_below: DEMOTE_BELOW_SCALE,
        }
    }
}

impl ZoomConfig {
    /// Default thresholds with custom resolution bounds and wheel step
    pub fn with_bounds(min_resolution: u32, max_resolution: u32, scroll_offset: f64) -> Self {
        Self {
            min_resolution,
            max_resolution,
            scroll_offset,
            ..Self::default()
        }
    }

    /// Whether `level` lies within the inclusive resolution bounds
    pub fn contains(&self, level: u32) -> bool {
        (self.min_resolution..=self.max_resolution).contains(&level)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_resolution > self.max_resolution {
            return Err(Error::Config(format!(
                "min_resolution {} exceeds max_resolution {}",
                self.min_resolution, self.max_resolution
            ))
            .into());
        }
        if self.max_resolution > MAX_SUPPORTED_RESOLUTION {
            return Err(Error::Config(format!(
                "max_resolution {} exceeds the supported {}",
                self.max_resolution, MAX_SUPPORTED_RESOLUTION
            ))
            .into());
        }
        if !(self.scroll_offset.is_finite() && self.scroll_offset > 0.0) {
            return Err(Error::Config(format!(
                "scroll_offset must be positive, got {}",
                self.scroll_offset
            ))
            .into());
        }
        if !(self.min_scale > 0.0 && self.min_scale < self.max_scale) {
            return Err(Error::Config(format!(
                "scale bounds [{}, {}] are not ordered",
                self.min_scale, self.max_scale
            ))
            .into());
        }
        if self.reset_scale < self.min_scale || self.reset_scale >= self.max_scale {
            return Err(Error::Config(format!(
                "reset_scale {} lies outside [{}, {})",
                self.reset_scale, self.min_scale, self.max_scale
            ))
            .into());
        }
        if self.demote_below < self.min_scale || self.demote_below > self.reset_scale {
            return Err(Error::Config(format!(
                "demote_below {} lies outside [{}, {}]",
                self.demote_below, self.min_scale, self.reset_scale
            ))
            .into());
        }
        Ok(())
    }
}

/// Where tiles come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileServerConfig {
    /// URL with `{z}`, `{x}`, `{y}` and `{token}` placeholders
    pub url_template: String,
    pub token: Option<String>,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for TileServerConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            token: None,
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            user_agent: concat!("tileview/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TileServerConfig {
    pub fn validate(&self) -> Result<()> {
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.url_template.contains(placeholder) {
                return Err(Error::Config(format!(
                    "url_template is missing the {} placeholder",
                    placeholder
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Fill the token from the environment when the config leaves it unset
    pub fn with_env_token(mut self, var: &str) -> Self {
        if self.token.is_none() {
            self.token = std::env::var(var).ok().filter(|t| !t.is_empty());
        }
        self
    }
}
