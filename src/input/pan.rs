//! Pointer-drag panning.

use crate::core::geo::Point;

/// Drag state machine
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { last: Point },
}

/// Owns the unbounded viewport offset and turns drag deltas into offset updates
#[derive(Debug, Clone, Default)]
pub struct PanController {
    offset: Point,
    drag: DragState,
}

impl PanController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn on_drag_start(&mut self, point: Point) {
        self.drag = DragState::Dragging { last: point };
    }

    /// Returns true if the offset changed
    pub fn on_drag_move(&mut self, point: Point) -> bool {
        let DragState::Dragging { last } = self.drag else {
            return false;
        };
        let delta = point.subtract(&last);
        self.offset = self.offset.add(&delta);
        self.drag = DragState::Dragging { last: point };
        delta != Point::default()
    }

    pub fn on_drag_end(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn on_pointer_leave(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Back to the origin, not dragging
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
