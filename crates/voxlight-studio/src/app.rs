//! Keyboard-driven viewer wiring the engine session to the window runtime.
//!
//! Keys:
//! - `1`-`4` pick the curve shown while editing
//! - `E` edit (live preview), `Enter` accept, `Escape` cancel
//! - `Up`/`Down` select a table, `Delete` remove it
//! - `[`/`]` rotation speed, `,`/`.` transition speed
//! - `PageUp`/`PageDown` tilt the camera, `=`/`-` zoom
//! - `S` save the stack, `T` export thumbnails, `Q` quit

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use voxlight_engine::animation::SPEED_MAX;
use voxlight_engine::core::{App, AppControl, FrameCtx};
use voxlight_engine::render::TargetId;
use voxlight_engine::transfer::encode_png;
use voxlight_engine::window::RuntimeCtx;
use voxlight_engine::Session;

use crate::presets::{self, PRESET_NAMES};

const CLEAR: wgpu::Color = wgpu::Color::BLACK;
const SPEED_STEP: u32 = 10;
const ELEVATION_STEP: f32 = 10.0;
const DOLLY_STEP: f32 = 1.25;

pub struct Studio {
    session: Session,
    preset: usize,
    selected: usize,
    rotation: u32,
    transition: u32,
    save_path: PathBuf,
    thumbnail_dir: Option<PathBuf>,
}

impl Studio {
    pub fn new(session: Session, rotation: u32, transition: u32, save_path: PathBuf, thumbnail_dir: Option<PathBuf>) -> Self {
        let mut studio = Self {
            session,
            preset: 0,
            selected: 0,
            rotation,
            transition,
            save_path,
            thumbnail_dir,
        };
        studio.apply_speeds();
        studio.show_preset(0);
        studio
    }

    fn apply_speeds(&mut self) {
        self.session.set_rotation_speed(self.rotation);
        self.session.set_transition_speed(self.transition);
        log::info!("rotation speed {}, transition speed {}", self.rotation, self.transition);
    }

    /// Attaches preset `index` to the node as its editable curves.
    fn show_preset(&mut self, index: usize) {
        let Some(name) = PRESET_NAMES.get(index) else {
            return;
        };
        self.preset = index;
        let tf = presets::preset(name);
        if let Some(node) = self.session.node_mut() {
            node.set_transfer_function(tf);
        }
        log::info!("curve: {name}");
    }

    fn save(&self) -> Result<()> {
        let png = self.session.save_transfer_functions()?;
        fs::write(&self.save_path, png).with_context(|| format!("couldn't write to {}", self.save_path.display()))?;
        log::info!("saved {} transfer functions to {}", self.session.bank().len(), self.save_path.display());
        Ok(())
    }

    fn export_thumbnails(&self) -> Result<()> {
        let dir = self.thumbnail_dir.as_ref().context("no thumbnail directory given (--thumbnails)")?;
        fs::create_dir_all(dir).with_context(|| format!("couldn't create {}", dir.display()))?;
        for i in 0..self.session.bank().len() {
            let Some(image) = self.session.bank().thumbnail(i) else {
                continue;
            };
            let path = dir.join(format!("transfer-{i:03}.png"));
            fs::write(&path, encode_png(&image)?).with_context(|| format!("couldn't write to {}", path.display()))?;
        }
        log::info!("exported {} thumbnails to {}", self.session.bank().len(), dir.display());
        Ok(())
    }

    fn select(&mut self, delta: isize) {
        let count = self.session.bank().len();
        if count == 0 {
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(count - 1);
        log::info!("selected table {} of {count}", self.selected);
    }

    fn handle_key(&mut self, key: KeyCode) -> AppControl {
        let now = Instant::now();
        match key {
            KeyCode::Digit1 | KeyCode::Digit2 | KeyCode::Digit3 | KeyCode::Digit4 => {
                let index = match key {
                    KeyCode::Digit1 => 0,
                    KeyCode::Digit2 => 1,
                    KeyCode::Digit3 => 2,
                    _ => 3,
                };
                self.show_preset(index);
            }
            KeyCode::KeyE => {
                if let Err(e) = self.session.begin_edit() {
                    log::warn!("{e}");
                }
            }
            KeyCode::Enter if self.session.is_editing() => match self.session.finish_edit(true, now) {
                Ok(Some(index)) => {
                    self.selected = index;
                    log::info!("added transfer function {index}");
                }
                Ok(None) => {}
                Err(e) => log::warn!("{e}"),
            },
            KeyCode::Escape if self.session.is_editing() => {
                let _ = self.session.finish_edit(false, now);
            }
            KeyCode::ArrowUp => self.select(-1),
            KeyCode::ArrowDown => self.select(1),
            KeyCode::Delete | KeyCode::Backspace => {
                if self.session.remove_transfer_function(self.selected) {
                    log::info!("removed transfer function {}", self.selected);
                    self.selected = self.selected.min(self.session.bank().len().saturating_sub(1));
                }
            }
            KeyCode::BracketLeft => {
                self.rotation = self.rotation.saturating_sub(SPEED_STEP);
                self.apply_speeds();
            }
            KeyCode::BracketRight => {
                self.rotation = (self.rotation + SPEED_STEP).min(SPEED_MAX);
                self.apply_speeds();
            }
            KeyCode::Comma => {
                self.transition = self.transition.saturating_sub(SPEED_STEP);
                self.apply_speeds();
            }
            KeyCode::Period => {
                self.transition = (self.transition + SPEED_STEP).min(SPEED_MAX);
                self.apply_speeds();
            }
            KeyCode::PageUp => self.session.camera_mut().elevation(ELEVATION_STEP),
            KeyCode::PageDown => self.session.camera_mut().elevation(-ELEVATION_STEP),
            KeyCode::Equal => self.session.camera_mut().dolly(DOLLY_STEP),
            KeyCode::Minus => self.session.camera_mut().dolly(1.0 / DOLLY_STEP),
            KeyCode::KeyS => {
                if let Err(e) = self.save() {
                    log::error!("{e:#}");
                }
            }
            KeyCode::KeyT => {
                if let Err(e) = self.export_thumbnails() {
                    log::error!("{e:#}");
                }
            }
            KeyCode::KeyQ => return AppControl::Exit,
            _ => {}
        }
        AppControl::Continue
    }
}

impl App for Studio {
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent, runtime: &mut RuntimeCtx) -> AppControl {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    ..
                },
            ..
        } = event
        else {
            return AppControl::Continue;
        };

        let control = self.handle_key(*code);
        runtime.request_redraw(window_id);
        control
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let session = &mut self.session;
        ctx.render(CLEAR, |rctx, target| session.render(rctx, target))
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.session.next_deadline()
    }

    fn on_tick(&mut self, now: Instant, runtime: &mut RuntimeCtx) -> AppControl {
        if self.session.tick(now) {
            runtime.request_redraw_all();
        }
        AppControl::Continue
    }

    fn on_window_destroyed(&mut self, window_id: WindowId) {
        self.session.release_target(TargetId::from(window_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn studio() -> Studio {
        Studio::new(Session::default(), 20, 20, PathBuf::from("unused.png"), None)
    }

    // ── camera keys ───────────────────────────────────────────────────────

    #[test]
    fn zoom_keys_change_distance() {
        let mut s = studio();
        let start = s.session.camera().distance();

        s.handle_key(KeyCode::Equal);
        assert!(s.session.camera().distance() < start);

        s.handle_key(KeyCode::Minus);
        assert!((s.session.camera().distance() - start).abs() < 1e-3);
    }

    #[test]
    fn tilt_keys_orbit_the_focal_point() {
        let mut s = studio();
        let start = s.session.camera().position();
        let distance = s.session.camera().distance();

        s.handle_key(KeyCode::PageUp);
        assert!(!s.session.camera().position().abs_diff_eq(start, 1e-4));
        assert!((s.session.camera().distance() - distance).abs() < 1e-3);

        s.handle_key(KeyCode::PageDown);
        assert!(s.session.camera().position().abs_diff_eq(start, 1e-3));
    }

    // ── speeds ────────────────────────────────────────────────────────────

    #[test]
    fn speed_keys_clamp_to_slider_range() {
        let mut s = studio();
        for _ in 0..20 {
            s.handle_key(KeyCode::BracketRight);
        }
        assert_eq!(s.rotation, SPEED_MAX);
        for _ in 0..20 {
            s.handle_key(KeyCode::Comma);
        }
        assert_eq!(s.transition, 0);
    }

    #[test]
    fn quit_key_exits() {
        assert!(studio().handle_key(KeyCode::KeyQ) == AppControl::Exit);
    }
}
