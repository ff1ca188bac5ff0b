pub mod cache;
pub mod fetcher;
pub mod grid;

// Re-exports for convenience
pub use cache::{GridRequest, Resolution, TileGridCache};
pub use fetcher::{FetchError, HttpTileFetcher, TileFetcher, TileHandle};
pub use grid::TileGrid;
