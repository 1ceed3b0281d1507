use std::time::Instant;

use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;
use crate::window::RuntimeCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// All callbacks run on the event-loop thread, which also owns every GPU
/// resource; no callback overlaps another.
pub trait App {
    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent, runtime: &mut RuntimeCtx) -> AppControl {
        let _ = (window_id, event, runtime);
        AppControl::Continue
    }

    /// Called once per rendered frame per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Next instant the app wants `on_tick` called, if any.
    ///
    /// The runtime sleeps until the earliest deadline instead of spinning.
    fn next_deadline(&self) -> Option<Instant> {
        None
    }

    /// Called once the deadline from `next_deadline` has passed.
    fn on_tick(&mut self, now: Instant, runtime: &mut RuntimeCtx) -> AppControl {
        let _ = (now, runtime);
        AppControl::Continue
    }

    /// Called after a window and its surface are gone, so per-window state
    /// keyed on it can be released.
    fn on_window_destroyed(&mut self, window_id: WindowId) {
        let _ = window_id;
    }
}
