use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Input signals the viewer consumes. Platform event plumbing is expected to
/// translate pointer and wheel events into these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Primary button pressed over the image
    DragStart { position: Point },
    /// Pointer moved (only pans while a drag is in progress)
    DragMove { position: Point },
    /// Primary button released
    DragEnd,
    /// Pointer left the image area
    PointerLeave,
    /// Scroll wheel tick; only the sign of `delta_y` matters
    Scroll { delta_y: f64 },
    /// Zoom-in button
    ZoomIn,
    /// Zoom-out button
    ZoomOut,
}

/// Whether an event was handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

impl InputEvent {
    /// Gets the pointer position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::DragStart { position } | InputEvent::DragMove { position } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Checks if this is a pointer (pan) event
    pub fn is_pointer_event(&self) -> bool {
        matches!(
            self,
            InputEvent::DragStart { .. }
                | InputEvent::DragMove { .. }
                | InputEvent::DragEnd
                | InputEvent::PointerLeave
        )
    }

    /// Checks if this event can change scale or resolution level
    pub fn is_zoom_event(&self) -> bool {
        matches!(
            self,
            InputEvent::Scroll { .. } | InputEvent::ZoomIn | InputEvent::ZoomOut
        )
    }
}
