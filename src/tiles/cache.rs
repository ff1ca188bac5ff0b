//! Per-level grid cache and fetch orchestration.
//!
//! [`TileGridCache::resolve`] registers a level request synchronously and
//! hands back a future that fetches the level's whole grid concurrently.
//! Every change of requested level bumps a generation counter; a batch that
//! completes under an older generation is discarded instead of being
//! published or cached.

use crate::core::config::ZoomConfig;
use crate::core::geo::TileCoord;
use crate::core::viewer::ViewerEvent;
use crate::prelude::{Arc, Mutex};
use crate::tiles::fetcher::{FetchError, TileFetcher};
use crate::tiles::grid::TileGrid;
use crate::{Error, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::BTreeMap;
use std::sync::{MutexGuard, PoisonError, Weak};

/// A pending grid resolution. Poll it (or spawn it) to run the batch.
pub type GridRequest = BoxFuture<'static, Resolution>;

/// Outcome of one [`TileGridCache::resolve`] call
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Served from the cache without fetching
    Cached(Arc<TileGrid>),
    /// Fetched and published; cells that failed are left unresolved
    Fetched(Arc<TileGrid>),
    /// Superseded by a later level change before the batch completed
    Stale { level: u32 },
}

impl Resolution {
    pub fn grid(&self) -> Option<&Arc<TileGrid>> {
        match self {
            Resolution::Cached(grid) | Resolution::Fetched(grid) => Some(grid),
            Resolution::Stale { .. } => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Resolution::Stale { .. })
    }
}

/// The batch currently running for the selected level
struct InFlight {
    generation: u64,
    request: Shared<GridRequest>,
}

struct CacheState {
    /// One entry per valid level; `None` until a complete grid lands
    entries: BTreeMap<u32, Option<Arc<TileGrid>>>,
    generation: u64,
    selected: Option<u32>,
    active: Option<Arc<TileGrid>>,
    loading: bool,
    in_flight: Option<InFlight>,
}

impl CacheState {
    fn publish(&mut self, grid: Arc<TileGrid>, events: &Sender<ViewerEvent>) {
        self.loading = false;
        self.active = Some(Arc::clone(&grid));
        let _ = events.send(ViewerEvent::GridReady {
            level: grid.level(),
            grid,
        });
    }

    /// Store `grid` unless the level already holds one. Incomplete grids are never stored.
    fn store(&mut self, grid: TileGrid) -> Arc<TileGrid> {
        match self.entries.get_mut(&grid.level()) {
            Some(Some(existing)) => Arc::clone(existing),
            Some(slot) if grid.is_complete() => {
                let grid = Arc::new(grid);
                *slot = Some(Arc::clone(&grid));
                grid
            }
            _ => Arc::new(grid),
        }
    }
}

fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session-long cache of fully resolved tile grids, keyed by resolution level
#[derive(Clone)]
pub struct TileGridCache {
    fetcher: Arc<dyn TileFetcher>,
    state: Arc<Mutex<CacheState>>,
    zoom: ZoomConfig,
    events_tx: Sender<ViewerEvent>,
    events_rx: Receiver<ViewerEvent>,
}

impl TileGridCache {
    /// Create an empty cache with an absent entry for every level in `zoom`'s bounds
    pub fn new(fetcher: Arc<dyn TileFetcher>, zoom: &ZoomConfig) -> Self {
        let entries = (zoom.min_resolution..=zoom.max_resolution)
            .map(|level| (level, None))
            .collect();
        let (events_tx, events_rx) = unbounded();
        Self {
            fetcher,
            state: Arc::new(Mutex::new(CacheState {
                entries,
                generation: 0,
                selected: None,
                active: None,
                loading: true,
                in_flight: None,
            })),
            zoom: zoom.clone(),
            events_tx,
            events_rx,
        }
    }

    /// Receiver for [`ViewerEvent::GridReady`] announcements. Clones share one queue.
    pub fn subscribe(&self) -> Receiver<ViewerEvent> {
        self.events_rx.clone()
    }

    /// Sender feeding the queue behind [`TileGridCache::subscribe`]
    pub(crate) fn publisher(&self) -> Sender<ViewerEvent> {
        self.events_tx.clone()
    }

    /// Request the grid for `level`.
    ///
    /// The request is registered before this returns, so a later call for a
    /// different level makes the returned future resolve to
    /// [`Resolution::Stale`] even if it has not been polled yet. Repeated
    /// requests for the selected level join the batch already running.
    pub fn resolve(&self, level: u32) -> Result<GridRequest> {
        if !self.zoom.contains(level) {
            return Err(Error::LevelOutOfRange {
                level,
                min: self.zoom.min_resolution,
                max: self.zoom.max_resolution,
            }
            .into());
        }

        let mut state = lock_state(&self.state);
        if state.selected != Some(level) {
            state.generation += 1;
            state.selected = Some(level);
            log::debug!("level {} requested (generation {})", level, state.generation);
        }

        if let Some(grid) = state.entries.get(&level).cloned().flatten() {
            log::debug!("level {} served from cache", level);
            state.publish(Arc::clone(&grid), &self.events_tx);
            return Ok(future::ready(Resolution::Cached(grid)).boxed());
        }

        let generation = state.generation;
        if let Some(in_flight) = &state.in_flight {
            if in_flight.generation == generation {
                log::debug!("level {} joins the running batch", level);
                return Ok(in_flight.request.clone().boxed());
            }
        }

        let request = self.fetch_batch(level, generation).shared();
        state.in_flight = Some(InFlight {
            generation,
            request: request.clone(),
        });
        Ok(request.boxed())
    }

    fn fetch_batch(&self, level: u32, generation: u64) -> GridRequest {
        let fetcher = Arc::clone(&self.fetcher);
        let state: Weak<Mutex<CacheState>> = Arc::downgrade(&self.state);
        let events = self.events_tx.clone();

        async move {
            let (grid, failures) = fetch_grid(fetcher.as_ref(), level).await;

            let Some(shared) = state.upgrade() else {
                return Resolution::Stale { level };
            };
            let mut state = lock_state(&shared);
            if state.generation != generation {
                log::debug!(
                    "discarding stale grid for level {} (generation {} < {})",
                    level,
                    generation,
                    state.generation
                );
                return Resolution::Stale { level };
            }
            state.in_flight = None;

            for (coord, err) in &failures {
                log::warn!("tile {} could not be loaded: {}", coord, err);
            }

            let grid = state.store(grid);
            log::info!(
                "level {} ready: {}/{} tiles",
                level,
                grid.resolved_count(),
                grid.len()
            );
            state.publish(Arc::clone(&grid), &events);
            Resolution::Fetched(grid)
        }
        .boxed()
    }

    pub fn cached(&self, level: u32) -> Option<Arc<TileGrid>> {
        lock_state(&self.state).entries.get(&level).cloned().flatten()
    }

    pub fn is_cached(&self, level: u32) -> bool {
        self.cached(level).is_some()
    }

    /// Levels holding a complete grid, ascending
    pub fn cached_levels(&self) -> Vec<u32> {
        lock_state(&self.state)
            .entries
            .iter()
            .filter(|(_, grid)| grid.is_some())
            .map(|(level, _)| *level)
            .collect()
    }

    /// The most recently published grid; its level is [`TileGrid::level`]
    pub fn active(&self) -> Option<Arc<TileGrid>> {
        lock_state(&self.state).active.clone()
    }

    /// True until the first grid is published
    pub fn is_loading(&self) -> bool {
        lock_state(&self.state).loading
    }

    pub fn generation(&self) -> u64 {
        lock_state(&self.state).generation
    }

    pub fn selected_level(&self) -> Option<u32> {
        lock_state(&self.state).selected
    }
}

impl std::fmt::Debug for TileGridCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock_state(&self.state);
        f.debug_struct("TileGridCache")
            .field("min_resolution", &self.zoom.min_resolution)
            .field("max_resolution", &self.zoom.max_resolution)
            .field("generation", &state.generation)
            .field("selected", &state.selected)
            .field("cached", &state.entries.values().filter(|g| g.is_some()).count())
            .field("loading", &state.loading)
            .finish()
    }
}

/// Fetch every cell of `level` concurrently. Failed cells stay unresolved.
async fn fetch_grid(
    fetcher: &dyn TileFetcher,
    level: u32,
) -> (TileGrid, Vec<(TileCoord, FetchError)>) {
    let mut grid = TileGrid::empty(level);
    let coords: Vec<TileCoord> = grid.coords().collect();

    let results = future::join_all(
        coords
            .into_iter()
            .map(|coord| async move { (coord, fetcher.fetch(coord).await) }),
    )
    .await;

    let mut failures = Vec::new();
    for (coord, result) in results {
        match result {
            Ok(handle) if handle.coord() == coord => {
                grid.set(handle);
            }
            Ok(handle) => failures.push((
                coord,
                FetchError::Unknown(format!("fetcher answered with tile {}", handle.coord())),
            )),
            Err(err) => failures.push((coord, err)),
        }
    }
    (grid, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::HashMap;
    use crate::tiles::fetcher::TileHandle;
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::future::Shared;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Gate = Shared<oneshot::Receiver<()>>;

    #[derive(Default)]
    struct ScriptedFetcher {
        calls: AtomicUsize,
        failing: HashSet<TileCoord>,
        gates: std::sync::Mutex<HashMap<u32, Gate>>,
    }

    impl ScriptedFetcher {
        fn failing(coords: &[TileCoord]) -> Self {
            Self {
                failing: coords.iter().copied().collect(),
                ..Self::default()
            }
        }

        /// Hold every fetch of `level` until the returned sender fires
        fn gate(&self, level: u32) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(level, rx.shared());
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TileFetcher for ScriptedFetcher {
        async fn fetch(&self, coord: TileCoord) -> std::result::Result<TileHandle, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().unwrap().get(&coord.level).cloned();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.failing.contains(&coord) {
                return Err(FetchError::NotFound { coord });
            }
            Ok(TileHandle::new(coord, vec![coord.row as u8, coord.col as u8]))
        }
    }

    fn cache_with(fetcher: Arc<ScriptedFetcher>) -> TileGridCache {
        TileGridCache::new(fetcher, &ZoomConfig::with_bounds(0, 3, 1.0))
    }

    #[tokio::test]
    async fn test_level_zero_is_single_tile() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));

        let resolution = cache.resolve(0).unwrap().await;
        let grid = resolution.grid().unwrap();
        assert_eq!(grid.dimension(), 1);
        assert!(grid.is_complete());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_grid_dimensions_per_level() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));

        for level in 1..=3 {
            let resolution = cache.resolve(level).unwrap().await;
            let grid = resolution.grid().unwrap();
            assert_eq!(grid.dimension(), 2 * level);
            assert_eq!(grid.resolved_count(), (4 * level * level) as usize);
        }
        assert_eq!(fetcher.calls(), 4 + 16 + 36);
    }

    #[tokio::test]
    async fn test_second_resolve_is_served_from_cache() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));

        let first = cache.resolve(2).unwrap().await;
        let calls = fetcher.calls();
        let second = cache.resolve(2).unwrap().await;

        assert!(matches!(first, Resolution::Fetched(_)));
        assert!(matches!(second, Resolution::Cached(_)));
        assert!(Arc::ptr_eq(first.grid().unwrap(), second.grid().unwrap()));
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn test_superseded_batch_is_discarded() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));
        let release = fetcher.gate(1);

        let slow = cache.resolve(1).unwrap();
        let fast = cache.resolve(2).unwrap();

        let (slow_result, fast_result) = futures::join!(slow, async {
            let result = fast.await;
            let _ = release.send(());
            result
        });

        assert!(slow_result.is_stale());
        assert!(matches!(fast_result, Resolution::Fetched(_)));
        assert!(!cache.is_cached(1));
        assert!(cache.is_cached(2));
        assert_eq!(cache.active().unwrap().level(), 2);
    }

    #[tokio::test]
    async fn test_returning_to_a_level_still_invalidates_the_old_batch() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));

        let first = cache.resolve(1).unwrap();
        let _other = cache.resolve(2).unwrap();
        let again = cache.resolve(1).unwrap();

        assert!(first.await.is_stale());
        assert!(matches!(again.await, Resolution::Fetched(_)));
        assert!(cache.is_cached(1));
        assert!(!cache.is_cached(2));
    }

    #[tokio::test]
    async fn test_failed_cell_leaves_gap_without_caching() {
        let broken = TileCoord::new(1, 0, 1);
        let fetcher = Arc::new(ScriptedFetcher::failing(&[broken]));
        let cache = cache_with(Arc::clone(&fetcher));

        let resolution = cache.resolve(1).unwrap().await;
        let grid = resolution.grid().unwrap();
        assert_eq!(grid.resolved_count(), 3);
        assert_eq!(grid.missing(), vec![broken]);
        assert_eq!(cache.active().unwrap().resolved_count(), 3);
        assert!(!cache.is_cached(1));

        // an incomplete level is fetched in full on revisit
        let _ = cache.resolve(0).unwrap().await;
        let _ = cache.resolve(1).unwrap().await;
        assert_eq!(fetcher.calls(), 4 + 1 + 4);
    }

    #[tokio::test]
    async fn test_out_of_range_level_is_rejected() {
        let cache = cache_with(Arc::new(ScriptedFetcher::default()));
        assert!(cache.resolve(4).is_err());
        assert_eq!(cache.generation(), 0);
    }

    #[tokio::test]
    async fn test_loading_clears_on_first_publish() {
        let cache = cache_with(Arc::new(ScriptedFetcher::default()));
        let rx = cache.subscribe();
        assert!(cache.is_loading());
        assert!(cache.cached_levels().is_empty());

        let _ = cache.resolve(0).unwrap().await;
        assert!(!cache.is_loading());
        assert_eq!(cache.cached_levels(), vec![0]);
        match rx.try_recv().unwrap() {
            ViewerEvent::GridReady { level, grid } => {
                assert_eq!(level, 0);
                assert_eq!(grid.len(), 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_batch_publishes_nothing() {
        let fetcher = Arc::new(ScriptedFetcher::failing(&[TileCoord::new(0, 0, 1)]));
        let cache = cache_with(Arc::clone(&fetcher));
        let rx = cache.subscribe();

        let stale = cache.resolve(1).unwrap();
        let _current = cache.resolve(3).unwrap();
        assert!(stale.await.is_stale());
        assert!(rx.try_recv().is_err());
        assert!(cache.active().is_none());
        assert!(cache.is_loading());
    }

    #[tokio::test]
    async fn test_back_to_back_same_level_requests_share_one_grid() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));

        let a = cache.resolve(2).unwrap();
        let b = cache.resolve(2).unwrap();
        let (a, b) = futures::join!(a, b);

        assert!(matches!(a, Resolution::Fetched(_)));
        assert!(matches!(b, Resolution::Fetched(_)));
        let grid = a.grid().unwrap();
        assert!(Arc::ptr_eq(grid, b.grid().unwrap()));
        assert!(Arc::ptr_eq(grid, &cache.cached(2).unwrap()));
        assert_eq!(cache.generation(), 1);
    }

    #[tokio::test]
    async fn test_same_level_request_joins_running_batch() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));
        let release = fetcher.gate(1);

        let first = cache.resolve(1).unwrap();
        let second = cache.resolve(1).unwrap();
        let (first, second, ()) = futures::join!(first, second, async {
            let _ = release.send(());
        });

        assert_eq!(fetcher.calls(), 4);
        assert!(Arc::ptr_eq(first.grid().unwrap(), second.grid().unwrap()));
        assert_eq!(cache.subscribe().try_iter().count(), 1);
    }

    #[test]
    fn test_store_keeps_the_first_complete_grid() {
        let cache = cache_with(Arc::new(ScriptedFetcher::default()));
        let mut state = lock_state(&cache.state);

        let mut first = TileGrid::empty(0);
        first.set(TileHandle::new(TileCoord::new(0, 0, 0), vec![1]));
        let mut second = TileGrid::empty(0);
        second.set(TileHandle::new(TileCoord::new(0, 0, 0), vec![2]));

        let stored = state.store(first);
        let kept = state.store(second);
        assert!(Arc::ptr_eq(&stored, &kept));
        assert!(Arc::ptr_eq(&stored, state.entries[&0].as_ref().unwrap()));

        let partial = state.store(TileGrid::empty(1));
        assert!(state.entries[&1].is_none());
        assert_eq!(partial.resolved_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_sees_cache_hits_too() {
        let cache = cache_with(Arc::new(ScriptedFetcher::default()));
        let events = cache.subscribe();

        let _ = cache.resolve(1).unwrap().await;
        let _ = cache.resolve(0).unwrap().await;
        let _ = cache.resolve(1).unwrap().await;

        let levels: Vec<u32> = events
            .try_iter()
            .map(|event| match event {
                ViewerEvent::GridReady { level, .. } => level,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(levels, vec![1, 0, 1]);
    }
}
