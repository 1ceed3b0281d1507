//! Control surface tying the bank, the mapper and the animation together.
//!
//! Every mutation happens between frames and replaces whole buffers; the
//! mapper only ever sees a fully staged bank.

use std::fmt;
use std::time::Instant;

use crate::animation::{AnimationConfig, AnimationDriver};
use crate::render::volume::{DisplayMode, MapperConfig, VolumeMapper};
use crate::render::{RenderCtx, RenderTarget, TargetId};
use crate::scene::{Camera, VolumeNode};
use crate::transfer::{TransferError, TransferFunction, TransferFunctionBank};

#[derive(Debug)]
pub enum SessionError {
    /// Editing needs a volume to attach the curves to.
    NoVolume,
    /// The node carries no transfer-function property.
    NoTransferFunction,
    Transfer(TransferError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoVolume => f.write_str("load a volume first"),
            SessionError::NoTransferFunction => f.write_str("no transfer function property found"),
            SessionError::Transfer(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Transfer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransferError> for SessionError {
    fn from(e: TransferError) -> Self {
        SessionError::Transfer(e)
    }
}

/// One viewer: a volume, its camera, the transfer-function bank and the
/// renderer drawing them.
pub struct Session {
    node: Option<VolumeNode>,
    camera: Camera,
    bank: TransferFunctionBank,
    mapper: VolumeMapper,
    animation: AnimationDriver,
    editing: bool,
}

impl Session {
    pub fn new(mapper: MapperConfig, animation: AnimationConfig) -> Self {
        Self {
            node: None,
            camera: Camera::new(),
            bank: TransferFunctionBank::new(),
            mapper: VolumeMapper::new(mapper),
            animation: AnimationDriver::new(animation),
            editing: false,
        }
    }

    // ── scene ─────────────────────────────────────────────────────────────

    /// Replaces the displayed volume and frames the camera on it.
    pub fn set_volume(&mut self, node: VolumeNode) {
        self.camera.reset(&node.bounds());
        self.node = Some(node);
    }

    pub fn node(&self) -> Option<&VolumeNode> {
        self.node.as_ref()
    }

    pub fn node_mut(&mut self) -> Option<&mut VolumeNode> {
        self.node.as_mut()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn bank(&self) -> &TransferFunctionBank {
        &self.bank
    }

    pub fn mapper(&self) -> &VolumeMapper {
        &self.mapper
    }

    pub fn animation(&self) -> &AnimationDriver {
        &self.animation
    }

    // ── bank ──────────────────────────────────────────────────────────────

    /// Appends a sampled table and restages the bank. Returns its index.
    pub fn add_transfer_function(&mut self, tf: &TransferFunction) -> usize {
        let index = self.bank.append(&tf.color, &tf.opacity);
        self.mapper.set_transfer_texture(&self.bank);
        index
    }

    /// Removes table `index`; out-of-range indices are ignored.
    pub fn remove_transfer_function(&mut self, index: usize) -> bool {
        let removed = self.bank.remove_at(index);
        if removed {
            self.mapper.set_transfer_texture(&self.bank);
        }
        removed
    }

    /// Replaces the bank from PNG bytes and (re)starts the animation.
    pub fn load_transfer_functions(&mut self, png: &[u8], now: Instant) -> Result<usize, SessionError> {
        self.bank.load_png(png)?;
        self.mapper.set_transfer_texture(&self.bank);
        self.animation.start(now);
        log::info!("loaded {} transfer functions", self.bank.len());
        Ok(self.bank.len())
    }

    /// Encodes the bank as PNG; fails on an empty bank.
    pub fn save_transfer_functions(&self) -> Result<Vec<u8>, SessionError> {
        Ok(self.bank.to_png()?)
    }

    // ── controls ──────────────────────────────────────────────────────────

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.mapper.set_display_mode(mode);
    }

    pub fn set_rotation_speed(&mut self, speed: u32) {
        self.animation.set_rotation_speed(speed);
    }

    pub fn set_transition_speed(&mut self, speed: u32) {
        self.animation.set_transition_speed(speed);
    }

    pub fn start_animation(&mut self, now: Instant) {
        self.animation.start(now);
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Shows the node's live curves and pauses the animation.
    pub fn begin_edit(&mut self) -> Result<(), SessionError> {
        if self.node.is_none() {
            return Err(SessionError::NoVolume);
        }
        self.mapper.set_display_mode(DisplayMode::Preview);
        self.animation.stop();
        self.editing = true;
        Ok(())
    }

    /// Returns to the bank and resumes the animation.
    ///
    /// When `accepted`, the node's current curves are appended and the new
    /// table index is returned.
    pub fn finish_edit(&mut self, accepted: bool, now: Instant) -> Result<Option<usize>, SessionError> {
        self.mapper.set_display_mode(DisplayMode::Demo);
        self.animation.start(now);
        self.editing = false;

        if !accepted {
            return Ok(None);
        }

        let tf = self
            .node
            .as_ref()
            .and_then(VolumeNode::transfer_function)
            .cloned()
            .ok_or(SessionError::NoTransferFunction)?;
        Ok(Some(self.add_transfer_function(&tf)))
    }

    // ── frame loop ────────────────────────────────────────────────────────

    pub fn next_deadline(&self) -> Option<Instant> {
        self.animation.deadline()
    }

    /// Runs one animation step if due. Returns whether a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.animation.poll(now) || self.node.is_none() {
            return false;
        }
        self.animation.refresh(&self.bank, &mut self.mapper, &mut self.camera)
    }

    /// Draws the current volume into `target`.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let Some(node) = self.node.as_ref() else {
            return;
        };
        self.camera.reset_clipping_range(&node.bounds());
        self.mapper.paint(ctx, target, node, &self.camera);
    }

    /// Releases render state held for a destroyed target.
    pub fn release_target(&mut self, id: TargetId) {
        self.mapper.release_target(id);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(MapperConfig::default(), AnimationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Vec3;

    use super::*;
    use crate::scene::{ImageVolume, ScalarData};
    use crate::transfer::{ColorFunction, OpacityFunction};

    fn ramp() -> TransferFunction {
        TransferFunction::new(
            ColorFunction::new()
                .with_point(-1024.0, [0.0, 0.0, 0.0])
                .with_point(3071.0, [1.0, 1.0, 1.0]),
            OpacityFunction::new().with_point(0.0, 1.0),
        )
    }

    fn node(tf: Option<TransferFunction>) -> VolumeNode {
        let volume = ImageVolume::new([2, 2, 2], Vec3::ONE, Vec3::ZERO, ScalarData::I16(vec![0; 8])).unwrap();
        let mut node = VolumeNode::new(volume);
        node.set_transfer_function(tf);
        node
    }

    // ── bank ──────────────────────────────────────────────────────────────

    #[test]
    fn adding_stages_the_bank() {
        let mut s = Session::default();
        assert_eq!(s.add_transfer_function(&ramp()), 0);
        assert_eq!(s.add_transfer_function(&ramp()), 1);
        assert_eq!(s.bank().len(), 2);
        assert_eq!(s.mapper().staged_tables(), 2);
    }

    #[test]
    fn removing_out_of_range_keeps_staging() {
        let mut s = Session::default();
        s.add_transfer_function(&ramp());
        assert!(!s.remove_transfer_function(5));
        assert!(s.remove_transfer_function(0));
        assert_eq!(s.mapper().staged_tables(), 0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut s = Session::default();
        s.add_transfer_function(&ramp());
        let png = s.save_transfer_functions().unwrap();

        let mut other = Session::default();
        let now = Instant::now();
        assert_eq!(other.load_transfer_functions(&png, now).unwrap(), 1);
        assert_eq!(other.bank().as_bytes(), s.bank().as_bytes());
        assert!(other.animation().is_running());
    }

    #[test]
    fn saving_empty_bank_fails() {
        let s = Session::default();
        let err = s.save_transfer_functions().unwrap_err();
        assert!(matches!(err, SessionError::Transfer(TransferError::EmptyBank)));
    }

    #[test]
    fn bad_png_leaves_bank_alone() {
        let mut s = Session::default();
        s.add_transfer_function(&ramp());
        let before = s.bank().as_bytes().to_vec();
        assert!(s.load_transfer_functions(b"not a png", Instant::now()).is_err());
        assert_eq!(s.bank().as_bytes(), &before[..]);
    }

    // ── editing ───────────────────────────────────────────────────────────

    #[test]
    fn edit_requires_a_volume() {
        let mut s = Session::default();
        assert!(matches!(s.begin_edit(), Err(SessionError::NoVolume)));
        assert!(!s.is_editing());
    }

    #[test]
    fn edit_switches_to_preview_and_pauses() {
        let mut s = Session::default();
        s.set_volume(node(Some(ramp())));
        s.start_animation(Instant::now());

        s.begin_edit().unwrap();
        assert_eq!(s.mapper().display_mode(), DisplayMode::Preview);
        assert!(!s.animation().is_running());
    }

    #[test]
    fn accepted_edit_appends_node_curves() {
        let mut s = Session::default();
        s.set_volume(node(Some(ramp())));
        s.begin_edit().unwrap();

        assert_eq!(s.finish_edit(true, Instant::now()).unwrap(), Some(0));
        assert_eq!(s.mapper().display_mode(), DisplayMode::Demo);
        assert!(s.animation().is_running());
        assert_eq!(s.bank().len(), 1);
    }

    #[test]
    fn cancelled_edit_adds_nothing() {
        let mut s = Session::default();
        s.set_volume(node(Some(ramp())));
        s.begin_edit().unwrap();

        assert_eq!(s.finish_edit(false, Instant::now()).unwrap(), None);
        assert!(s.bank().is_empty());
        assert_eq!(s.mapper().display_mode(), DisplayMode::Demo);
    }

    #[test]
    fn accepted_edit_without_curves_fails() {
        let mut s = Session::default();
        s.set_volume(node(None));
        s.begin_edit().unwrap();

        let err = s.finish_edit(true, Instant::now()).unwrap_err();
        assert!(matches!(err, SessionError::NoTransferFunction));
        assert!(s.bank().is_empty());
    }

    // ── frame loop ────────────────────────────────────────────────────────

    #[test]
    fn tick_waits_for_interval() {
        let mut s = Session::default();
        s.set_volume(node(None));
        s.add_transfer_function(&ramp());
        let t0 = Instant::now();
        s.start_animation(t0);

        assert!(!s.tick(t0));
        assert!(s.tick(t0 + Duration::from_millis(40)));
    }

    #[test]
    fn tick_with_empty_bank_stops_animation() {
        let mut s = Session::default();
        s.set_volume(node(None));
        let t0 = Instant::now();
        s.start_animation(t0);

        assert!(!s.tick(t0 + Duration::from_millis(40)));
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn set_volume_frames_the_camera() {
        let mut s = Session::default();
        s.set_volume(node(None));
        let center = s.node().unwrap().bounds().center();
        assert!(s.camera().focal_point().abs_diff_eq(center, 1e-5));
    }
}
