//! Tile fetching: the [`TileFetcher`] seam and its HTTP implementation.

use crate::core::config::TileServerConfig;
use crate::core::geo::TileCoord;
use crate::prelude::Arc;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const NOT_FOUND: u16 = 404;
const BAD_TOKEN: u16 = 403;

/// Classified failure of a single tile fetch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{coord} not found")]
    NotFound { coord: TileCoord },

    #[error("Bad token")]
    Unauthorized,

    #[error("Unhandled exception: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, coord: TileCoord) -> Self {
        match status {
            NOT_FOUND => FetchError::NotFound { coord },
            BAD_TOKEN => FetchError::Unauthorized,
            other => FetchError::Unknown(format!("HTTP {}", other)),
        }
    }
}

/// A displayable reference to one fetched tile.
///
/// Cloning is cheap: the image bytes are shared, and released once the last
/// grid holding the handle is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct TileHandle {
    coord: TileCoord,
    data: Arc<Vec<u8>>,
    content_type: Option<String>,
}

impl TileHandle {
    pub fn new(coord: TileCoord, data: Vec<u8>) -> Self {
        Self {
            coord,
            data: Arc::new(data),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the encoded image, for presenters that upload it elsewhere
    pub fn data(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.data)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Anything that can turn a tile address into a displayable tile.
///
/// Completions may arrive in any order; callers must not rely on it.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, coord: TileCoord) -> std::result::Result<TileHandle, FetchError>;
}

/// Fetches tiles from a `{z}/{x}/{y}` tile server over HTTP
pub struct HttpTileFetcher {
    client: reqwest::Client,
    config: TileServerConfig,
}

impl HttpTileFetcher {
    pub fn new(config: TileServerConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(Error::from)?;
        Ok(Self { client, config })
    }

    /// Build the request URL for `coord`
    pub fn url(&self, coord: TileCoord) -> String {
        tile_url(&self.config.url_template, coord, self.config.token.as_deref())
    }
}

impl std::fmt::Debug for HttpTileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTileFetcher")
            .field("url_template", &self.config.url_template)
            .field("has_token", &self.config.token.is_some())
            .finish()
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, coord: TileCoord) -> std::result::Result<TileHandle, FetchError> {
        log::debug!("fetch tile {}", coord);
        let resp = self
            .client
            .get(self.url(coord))
            .send()
            .await
            .map_err(|e| FetchError::Unknown(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), coord));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Unknown(e.to_string()))?;

        log::debug!("downloaded tile {} ({} bytes)", coord, bytes.len());
        Ok(TileHandle::new(coord, bytes.to_vec()).with_content_type(content_type))
    }
}

/// Substitute `{z}`, `{x}`, `{y}` and `{token}` in a URL template.
/// The row goes to `x`, the column to `y`.
pub fn tile_url(template: &str, coord: TileCoord, token: Option<&str>) -> String {
    template
        .replace("{z}", &coord.level.to_string())
        .replace("{x}", &coord.row.to_string())
        .replace("{y}", &coord.col.to_string())
        .replace("{token}", token.unwrap_or_default())
}
