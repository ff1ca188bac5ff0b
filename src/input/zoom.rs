//! Resolution/zoom state machine.
//!
//! Wheel ticks move a continuous scale inside `[min_scale, max_scale]`.
//! Reaching `max_scale` while a deeper level exists promotes one level and
//! resets the scale to `reset_scale`; dropping below `demote_below` while a
//! shallower level exists demotes one level the same way. At the extreme
//! levels the scale saturates at the hard bounds instead.

use crate::core::config::ZoomConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    In,
    Out,
}

impl ScrollDirection {
    /// Wheel up (negative delta) zooms in; anything else zooms out
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 {
            ScrollDirection::In
        } else {
            ScrollDirection::Out
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    pub scale: f64,
    pub level: u32,
}

/// One atomic state change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransition {
    pub from: ZoomState,
    pub to: ZoomState,
}

impl ZoomTransition {
    pub fn level_changed(&self) -> bool {
        self.from.level != self.to.level
    }

    pub fn scale_changed(&self) -> bool {
        self.from.scale != self.to.scale
    }

    pub fn is_noop(&self) -> bool {
        !self.level_changed() && !self.scale_changed()
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionZoomController {
    config: ZoomConfig,
    state: ZoomState,
}

impl ResolutionZoomController {
    pub fn new(config: ZoomConfig) -> Self {
        let state = ZoomState {
            scale: config.reset_scale,
            level: config.min_resolution,
        };
        Self { config, state }
    }

    pub fn state(&self) -> ZoomState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Whether the zoom-in button has anything left to do
    pub fn can_increase(&self) -> bool {
        self.state.level < self.config.max_resolution
    }

    pub fn can_decrease(&self) -> bool {
        self.state.level > self.config.min_resolution
    }

    /// One level deeper, scale untouched. No-op at the maximum.
    pub fn increase_level(&mut self) -> ZoomTransition {
        let from = self.state;
        if self.can_increase() {
            self.state.level += 1;
        }
        ZoomTransition { from, to: self.state }
    }

    /// One level shallower, scale untouched. No-op at the minimum.
    pub fn decrease_level(&mut self) -> ZoomTransition {
        let from = self.state;
        if self.can_decrease() {
            self.state.level -= 1;
        }
        ZoomTransition { from, to: self.state }
    }

    pub fn on_scroll(&mut self, direction: ScrollDirection) -> ZoomTransition {
        let from = self.state;
        let cfg = &self.config;

        let stepped = match direction {
            ScrollDirection::In => self.state.scale + cfg.scroll_offset,
            ScrollDirection::Out => self.state.scale - cfg.scroll_offset,
        };
        let mut next = ZoomState {
            scale: stepped.clamp(cfg.min_scale, cfg.max_scale),
            level: self.state.level,
        };

        if next.level != cfg.max_resolution && next.scale >= cfg.max_scale {
            next.level += 1;
            next.scale = cfg.reset_scale;
        } else if next.level != cfg.min_resolution && next.scale < cfg.demote_below {
            next.level -= 1;
            next.scale = cfg.reset_scale;
        }

        self.state = next;
        ZoomTransition { from, to: next }
    }
}

impl Default for ResolutionZoomController {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(step: f64) -> ResolutionZoomController {
        ResolutionZoomController::new(ZoomConfig::with_bounds(0, 3, step))
    }

    #[test]
    fn test_initial_state() {
        let zoom = controller(1.0);
        assert_eq!(zoom.state(), ZoomState { scale: 2.0, level: 0 });
    }

    #[test]
    fn test_five_ticks_in() {
        let mut zoom = controller(1.0);
        let expected = [(3.0, 0), (2.0, 1), (3.0, 1), (2.0, 2), (3.0, 2)];
        for (scale, level) in expected {
            zoom.on_scroll(ScrollDirection::In);
            assert_eq!(zoom.state(), ZoomState { scale, level });
        }
    }

    #[test]
    fn test_promotion_reports_level_change() {
        let mut zoom = controller(1.0);
        assert!(!zoom.on_scroll(ScrollDirection::In).level_changed());
        let transition = zoom.on_scroll(ScrollDirection::In);
        assert!(transition.level_changed());
        assert_eq!(transition.from, ZoomState { scale: 3.0, level: 0 });
        assert_eq!(transition.to, ZoomState { scale: 2.0, level: 1 });
    }

    #[test]
    fn test_saturates_at_max_level() {
        let mut zoom = controller(1.0);
        for _ in 0..20 {
            zoom.on_scroll(ScrollDirection::In);
        }
        assert_eq!(zoom.state(), ZoomState { scale: 4.0, level: 3 });
        let transition = zoom.on_scroll(ScrollDirection::In);
        assert!(transition.is_noop());
    }

    #[test]
    fn test_saturates_at_min_level() {
        let mut zoom = controller(1.0);
        for _ in 0..5 {
            zoom.on_scroll(ScrollDirection::Out);
        }
        assert_eq!(zoom.state(), ZoomState { scale: 0.4, level: 0 });
    }

    #[test]
    fn test_demotion_below_one() {
        let mut zoom = controller(0.5);
        zoom.increase_level();
        zoom.increase_level();
        assert_eq!(zoom.state(), ZoomState { scale: 2.0, level: 2 });

        zoom.on_scroll(ScrollDirection::Out); // 1.5
        zoom.on_scroll(ScrollDirection::Out); // 1.0 stays, threshold is strict
        assert_eq!(zoom.state(), ZoomState { scale: 1.0, level: 2 });
        let transition = zoom.on_scroll(ScrollDirection::Out);
        assert_eq!(transition.to, ZoomState { scale: 2.0, level: 1 });
    }

    #[test]
    fn test_buttons_are_idempotent_at_bounds() {
        let mut zoom = controller(1.0);
        assert!(!zoom.can_decrease());
        assert!(zoom.decrease_level().is_noop());

        for _ in 0..3 {
            assert!(zoom.increase_level().level_changed());
        }
        assert!(!zoom.can_increase());
        assert!(zoom.increase_level().is_noop());
        assert_eq!(zoom.state(), ZoomState { scale: 2.0, level: 3 });
    }

    #[test]
    fn test_buttons_keep_scale() {
        let mut zoom = controller(0.5);
        zoom.on_scroll(ScrollDirection::In);
        let transition = zoom.increase_level();
        assert_eq!(transition.to, ZoomState { scale: 2.5, level: 1 });
    }

    #[test]
    fn test_bounds_hold_for_mixed_sequences() {
        let mut zoom = controller(0.7);
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..2_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let direction = if seed % 2 == 0 {
                ScrollDirection::In
            } else {
                ScrollDirection::Out
            };
            zoom.on_scroll(direction);
            let state = zoom.state();
            assert!(state.level <= 3);
            assert!((0.4..=4.0).contains(&state.scale));
        }
    }

    #[test]
    fn test_wheel_delta_direction() {
        assert_eq!(ScrollDirection::from_wheel_delta(-120.0), ScrollDirection::In);
        assert_eq!(ScrollDirection::from_wheel_delta(120.0), ScrollDirection::Out);
        assert_eq!(ScrollDirection::from_wheel_delta(0.0), ScrollDirection::Out);
    }
}
