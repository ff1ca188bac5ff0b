pub mod events;
pub mod pan;
pub mod zoom;

// Re-export the essential types
pub use events::{EventHandled, InputEvent};
pub use pan::{DragState, PanController};
pub use zoom::{ResolutionZoomController, ScrollDirection, ZoomState, ZoomTransition};
