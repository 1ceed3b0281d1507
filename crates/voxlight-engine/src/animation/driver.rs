use std::time::{Duration, Instant};

use crate::render::volume::VolumeMapper;
use crate::scene::Camera;
use crate::time::Ticker;
use crate::transfer::TransferFunctionBank;

/// Largest value accepted from a speed control.
pub const SPEED_MAX: u32 = 99;

/// Animation cadence and speed scales.
#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Timer period between refreshes.
    pub interval: Duration,

    /// Degrees of azimuth per refresh at speed 100.
    pub rotation_scale: f64,

    /// Tables advanced per refresh at speed 100.
    pub transition_scale: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(33),
            rotation_scale: 5.0,
            transition_scale: 0.01,
        }
    }
}

/// Advances the camera azimuth and transfer-function index on a fixed timer.
#[derive(Debug)]
pub struct AnimationDriver {
    config: AnimationConfig,
    ticker: Ticker,
    rotate_per_frame: f64,
    blend_per_frame: f64,
}

impl AnimationDriver {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            ticker: Ticker::new(config.interval),
            config,
            rotate_per_frame: 0.0,
            blend_per_frame: 0.0,
        }
    }

    /// Sets rotation from a `0..=SPEED_MAX` control value.
    pub fn set_rotation_speed(&mut self, speed: u32) {
        self.rotate_per_frame = self.config.rotation_scale * scaled(speed);
    }

    /// Sets blending from a `0..=SPEED_MAX` control value.
    pub fn set_transition_speed(&mut self, speed: u32) {
        self.blend_per_frame = self.config.transition_scale * scaled(speed);
    }

    pub fn rotate_per_frame(&self) -> f64 {
        self.rotate_per_frame
    }

    pub fn blend_per_frame(&self) -> f64 {
        self.blend_per_frame
    }

    pub fn start(&mut self, now: Instant) {
        self.ticker.start(now);
    }

    pub fn stop(&mut self) {
        self.ticker.stop();
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_active()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.ticker.deadline()
    }

    /// Whether a refresh is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.ticker.poll(now)
    }

    /// One animation step.
    ///
    /// Stops the timer and returns `false` when the bank is empty. Otherwise
    /// rotates the camera and advances the mapper's index, then returns `true`
    /// so the caller schedules a redraw.
    pub fn refresh(&mut self, bank: &TransferFunctionBank, mapper: &mut VolumeMapper, camera: &mut Camera) -> bool {
        if bank.is_empty() {
            self.ticker.stop();
            return false;
        }

        if self.rotate_per_frame != 0.0 {
            camera.azimuth(self.rotate_per_frame as f32);
        }
        let index = bank.advance_index(mapper.transfer_index(), self.blend_per_frame);
        mapper.set_transfer_index(index);
        true
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}

fn scaled(speed: u32) -> f64 {
    f64::from(speed.min(SPEED_MAX)) / 100.0
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::transfer::{ColorFunction, OpacityFunction};

    fn bank(n: usize) -> TransferFunctionBank {
        let mut bank = TransferFunctionBank::new();
        for _ in 0..n {
            bank.append(
                &ColorFunction::new().with_point(0.0, [1.0, 1.0, 1.0]),
                &OpacityFunction::new().with_point(0.0, 0.5),
            );
        }
        bank
    }

    fn camera() -> Camera {
        let mut cam = Camera::new();
        cam.set_position(Vec3::new(0.0, 0.0, 10.0));
        cam
    }

    // ── speeds ────────────────────────────────────────────────────────────

    #[test]
    fn speeds_scale_from_control_value() {
        let mut anim = AnimationDriver::default();
        anim.set_rotation_speed(50);
        anim.set_transition_speed(50);
        assert!((anim.rotate_per_frame() - 2.5).abs() < 1e-12);
        assert!((anim.blend_per_frame() - 0.005).abs() < 1e-12);
    }

    #[test]
    fn speeds_clamp_to_control_range() {
        let mut anim = AnimationDriver::default();
        anim.set_rotation_speed(500);
        assert!((anim.rotate_per_frame() - 4.95).abs() < 1e-12);
    }

    #[test]
    fn speeds_start_at_zero() {
        let anim = AnimationDriver::default();
        assert_eq!(anim.rotate_per_frame(), 0.0);
        assert_eq!(anim.blend_per_frame(), 0.0);
    }

    // ── refresh ───────────────────────────────────────────────────────────

    #[test]
    fn empty_bank_stops_the_timer() {
        let mut anim = AnimationDriver::default();
        let mut mapper = VolumeMapper::default();
        let mut cam = camera();
        anim.start(Instant::now());

        assert!(!anim.refresh(&TransferFunctionBank::new(), &mut mapper, &mut cam));
        assert!(!anim.is_running());
    }

    #[test]
    fn refresh_advances_index_with_wrap() {
        let mut anim = AnimationDriver::default();
        anim.set_transition_speed(99);
        let mut mapper = VolumeMapper::default();
        mapper.set_transfer_index(1.995);
        let mut cam = camera();

        assert!(anim.refresh(&bank(2), &mut mapper, &mut cam));
        assert!((mapper.transfer_index() - 0.0049).abs() < 1e-9);
    }

    #[test]
    fn single_table_keeps_index() {
        let mut anim = AnimationDriver::default();
        anim.set_transition_speed(99);
        let mut mapper = VolumeMapper::default();
        let mut cam = camera();

        assert!(anim.refresh(&bank(1), &mut mapper, &mut cam));
        assert_eq!(mapper.transfer_index(), 0.0);
    }

    #[test]
    fn refresh_rotates_about_focal_point() {
        let mut anim = AnimationDriver::default();
        anim.set_rotation_speed(50);
        let mut mapper = VolumeMapper::default();
        let mut cam = camera();

        anim.refresh(&bank(1), &mut mapper, &mut cam);
        assert!((cam.distance() - 10.0).abs() < 1e-4);
        assert!(cam.position().x.abs() > 0.1);
    }

    #[test]
    fn poll_follows_interval() {
        let mut anim = AnimationDriver::default();
        let t0 = Instant::now();
        anim.start(t0);
        assert!(!anim.poll(t0));
        assert!(anim.poll(t0 + Duration::from_millis(33)));
    }
}
