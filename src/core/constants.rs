//! Core constants for the resolution/zoom state machine.
//! Keeping them in a single place makes it easier to tweak viewer-wide magic numbers.

/// Lowest resolution level (a single 1x1 tile).
pub const MIN_RESOLUTION: u32 = 0;

/// Highest resolution level served by the tile backend.
pub const MAX_RESOLUTION: u32 = 3;

/// Largest `max_resolution` a configuration may ask for (a 2048x2048 grid).
pub const MAX_SUPPORTED_RESOLUTION: u32 = 1024;

/// Scale delta applied per wheel tick.
pub const SCROLL_OFFSET: f64 = 0.2;

/// Hard lower bound of the continuous display scale.
pub const MIN_SCALE: f64 = 0.4;

/// Hard upper bound of the continuous display scale. Reaching it promotes one level.
pub const MAX_SCALE: f64 = 4.0;

/// Scale a level transition resets to (mid-point of the usable range).
pub const RESET_SCALE: f64 = 2.0;

/// Zooming out below this scale demotes one level.
pub const DEMOTE_BELOW_SCALE: f64 = 1.0;

/// Default tile server URL template. `{z}`, `{x}`, `{y}` and `{token}` are substituted.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://challenge-tiler.services.propelleraero.com/tiles/{z}/{x}/{y}?token={token}";

/// Environment variable the app reads the tile server token from.
pub const TOKEN_ENV_VAR: &str = "TILE_TOKEN";

/// Default HTTP request timeout for a single tile.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;
