//! The viewer: input in, viewport transform and tile grids out.

use crate::core::config::ViewerConfig;
use crate::core::geo::Point;
use crate::core::viewport::ViewTransform;
use crate::input::events::{EventHandled, InputEvent};
use crate::input::pan::PanController;
use crate::input::zoom::{ResolutionZoomController, ScrollDirection, ZoomTransition};
use crate::prelude::Arc;
use crate::tiles::cache::{GridRequest, TileGridCache};
use crate::tiles::fetcher::TileFetcher;
use crate::tiles::grid::TileGrid;
use crate::Result;
use crossbeam_channel::{Receiver, Sender};

/// Changes published to the presenter
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    OffsetChanged { offset: Point },
    ZoomChanged { scale: f64, level: u32 },
    GridReady { level: u32, grid: Arc<TileGrid> },
}

/// Snapshot of everything a presenter needs to draw a frame
#[derive(Debug, Clone)]
pub struct ViewState {
    pub offset: Point,
    pub scale: f64,
    pub level: u32,
    /// Most recently published grid; may lag `level` while a fetch is in flight
    pub grid: Option<Arc<TileGrid>>,
    /// True until the first grid has been published
    pub loading: bool,
}

/// Result of feeding one input event
pub struct ViewerUpdate {
    pub handled: EventHandled,
    /// Set when the event changed the resolution level. The request is already
    /// registered with the cache; poll or spawn it to run the fetch batch.
    pub request: Option<GridRequest>,
}

impl ViewerUpdate {
    fn handled(request: Option<GridRequest>) -> Self {
        Self {
            handled: EventHandled::Handled,
            request,
        }
    }

    fn not_handled() -> Self {
        Self {
            handled: EventHandled::NotHandled,
            request: None,
        }
    }
}

pub struct Viewer {
    config: ViewerConfig,
    zoom: ResolutionZoomController,
    pan: PanController,
    cache: TileGridCache,
    events_tx: Sender<ViewerEvent>,
    events_rx: Receiver<ViewerEvent>,
}

impl Viewer {
    pub fn new(config: ViewerConfig, fetcher: Arc<dyn TileFetcher>) -> Result<Self> {
        config.zoom.validate()?;
        let cache = TileGridCache::new(fetcher, &config.zoom);
        let events_tx = cache.publisher();
        let events_rx = cache.subscribe();
        Ok(Self {
            zoom: ResolutionZoomController::new(config.zoom.clone()),
            pan: PanController::new(),
            cache,
            events_tx,
            events_rx,
            config,
        })
    }

    /// Request the grid for the initial level
    pub fn start(&self) -> Result<GridRequest> {
        self.cache.resolve(self.zoom.level())
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Result<ViewerUpdate> {
        match event {
            InputEvent::DragStart { position } => {
                self.pan.on_drag_start(position);
                Ok(ViewerUpdate::handled(None))
            }
            InputEvent::DragMove { position } => {
                if !self.pan.is_dragging() {
                    return Ok(ViewerUpdate::not_handled());
                }
                if self.pan.on_drag_move(position) {
                    self.emit(ViewerEvent::OffsetChanged {
                        offset: self.pan.offset(),
                    });
                }
                Ok(ViewerUpdate::handled(None))
            }
            InputEvent::DragEnd => {
                self.pan.on_drag_end();
                Ok(ViewerUpdate::handled(None))
            }
            InputEvent::PointerLeave => {
                self.pan.on_pointer_leave();
                Ok(ViewerUpdate::handled(None))
            }
            InputEvent::Scroll { delta_y } => {
                let request = self.scroll(ScrollDirection::from_wheel_delta(delta_y))?;
                Ok(ViewerUpdate::handled(request))
            }
            InputEvent::ZoomIn => {
                let request = self.increase_level()?;
                Ok(ViewerUpdate::handled(request))
            }
            InputEvent::ZoomOut => {
                let request = self.decrease_level()?;
                Ok(ViewerUpdate::handled(request))
            }
        }
    }

    pub fn scroll(&mut self, direction: ScrollDirection) -> Result<Option<GridRequest>> {
        let transition = self.zoom.on_scroll(direction);
        self.apply(transition)
    }

    pub fn increase_level(&mut self) -> Result<Option<GridRequest>> {
        let transition = self.zoom.increase_level();
        self.apply(transition)
    }

    pub fn decrease_level(&mut self) -> Result<Option<GridRequest>> {
        let transition = self.zoom.decrease_level();
        self.apply(transition)
    }

    fn apply(&mut self, transition: ZoomTransition) -> Result<Option<GridRequest>> {
        if transition.is_noop() {
            return Ok(None);
        }
        self.emit(ViewerEvent::ZoomChanged {
            scale: transition.to.scale,
            level: transition.to.level,
        });
        if !transition.level_changed() {
            return Ok(None);
        }
        log::debug!(
            "resolution level {} -> {}",
            transition.from.level,
            transition.to.level
        );
        self.cache.resolve(transition.to.level).map(Some)
    }

    fn emit(&self, event: ViewerEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn state(&self) -> ViewState {
        ViewState {
            offset: self.pan.offset(),
            scale: self.zoom.scale(),
            level: self.zoom.level(),
            grid: self.cache.active(),
            loading: self.cache.is_loading(),
        }
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform::new(self.pan.offset(), self.zoom.scale())
    }

    /// Receiver for published events. Clones share one queue.
    pub fn events(&self) -> Receiver<ViewerEvent> {
        self.events_rx.clone()
    }

    /// Take every event published since the last drain
    pub fn drain_events(&self) -> Vec<ViewerEvent> {
        self.events_rx.try_iter().collect()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn zoom(&self) -> &ResolutionZoomController {
        &self.zoom
    }

    pub fn pan(&self) -> &PanController {
        &self.pan
    }

    pub fn cache(&self) -> &TileGridCache {
        &self.cache
    }
}
