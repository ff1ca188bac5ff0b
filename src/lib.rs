//! # tileview
//!
//! A pannable, zoomable viewer core for multi-resolution tiled image pyramids.
//!
//! Pointer drags move the viewport offset, wheel ticks move a continuous
//! display scale, and crossing the scale thresholds steps through discrete
//! resolution levels. Each level's square grid of tiles is fetched
//! concurrently, memoized for the session, and guarded against stale results
//! when the user zooms faster than tiles arrive.

pub mod core;
pub mod input;
pub mod prelude;
pub mod runtime;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{TileServerConfig, ViewerConfig, ZoomConfig},
    geo::{Point, TileCoord},
    viewer::{ViewState, Viewer, ViewerEvent, ViewerUpdate},
    viewport::ViewTransform,
};

pub use crate::input::{
    events::{EventHandled, InputEvent},
    pan::{DragState, PanController},
    zoom::{ResolutionZoomController, ScrollDirection, ZoomState, ZoomTransition},
};

pub use crate::tiles::{
    cache::{GridRequest, Resolution, TileGridCache},
    fetcher::{FetchError, HttpTileFetcher, TileFetcher, TileHandle},
    grid::TileGrid,
};

/// Install an `env_logger` reading `RUST_LOG`, defaulting to `info`.
/// Later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resolution level {level} outside [{min}, {max}]")]
    LevelOutOfRange { level: u32, min: u32, max: u32 },
}

/// Error type alias for convenience
pub type Error = ViewerError;
