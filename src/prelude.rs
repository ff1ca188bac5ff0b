//! Prelude module for common tileview types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tileview::prelude::*;`

pub use crate::core::{
    config::{TileServerConfig, ViewerConfig, ZoomConfig},
    constants::*,
    geo::{grid_dimension, Point, TileCoord},
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

pub use crate::{Error as ViewerError, Result};

pub use std::sync::{Arc, Mutex};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
