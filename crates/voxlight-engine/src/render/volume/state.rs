use std::collections::HashMap;
use std::path::Path;

use wgpu::util::DeviceExt;

use super::geometry::{self, BoundsVertex, QuadVertex, BOUNDS_INDICES, QUAD_VERTICES};
use super::program::{PipelineDesc, ShaderProgram};
use super::source;
use super::texture::{self, FaceTargets, TransferTexture, VolumeTexture, FACE_FORMAT};
use crate::render::{RenderCtx, TargetId, Viewport};
use crate::scene::{Bounds, ImageVolume};

// ── framebuffer stack ─────────────────────────────────────────────────────

/// Color attachments a volume pass can render into or read from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttachmentId {
    /// The host's own target (surface view).
    Host,
    FrontFaces,
    BackFaces,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FramebufferBinding {
    pub draw: AttachmentId,
    pub read: AttachmentId,
}

impl FramebufferBinding {
    pub const HOST: Self = Self::both(AttachmentId::Host);

    pub const fn both(id: AttachmentId) -> Self {
        Self { draw: id, read: id }
    }
}

/// LIFO of saved draw/read bindings.
///
/// Every internal draw sequence saves the current binding first and restores
/// it afterwards, so nesting inside a host render never leaks state.
#[derive(Debug, Clone)]
pub struct FramebufferStack {
    current: FramebufferBinding,
    saved: Vec<FramebufferBinding>,
}

impl Default for FramebufferStack {
    fn default() -> Self {
        Self {
            current: FramebufferBinding::HOST,
            saved: Vec::new(),
        }
    }
}

impl FramebufferStack {
    pub fn current(&self) -> FramebufferBinding {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    pub fn bind(&mut self, binding: FramebufferBinding) {
        self.current = binding;
    }

    pub fn restore(&mut self) {
        match self.saved.pop() {
            Some(binding) => self.current = binding,
            None => log::warn!("framebuffer restore without matching save"),
        }
    }
}

/// View a pass renders into for `attachment`.
pub(super) fn attachment_view<'a>(
    attachment: AttachmentId,
    faces: &'a FaceTargets,
    host: &'a wgpu::TextureView,
) -> &'a wgpu::TextureView {
    match attachment {
        AttachmentId::Host => host,
        AttachmentId::FrontFaces => faces.front(),
        AttachmentId::BackFaces => faces.back(),
    }
}

// ── programs ──────────────────────────────────────────────────────────────

/// Build state of one of the target's programs.
///
/// A failed build is not retried for this target.
#[derive(Default)]
pub enum ProgramSlot {
    #[default]
    Unbuilt,
    Ready(ShaderProgram),
    Failed,
}

impl ProgramSlot {
    pub fn program(&self) -> Option<&ShaderProgram> {
        match self {
            ProgramSlot::Ready(p) => Some(p),
            _ => None,
        }
    }

    pub fn program_mut(&mut self) -> Option<&mut ShaderProgram> {
        match self {
            ProgramSlot::Ready(p) => Some(p),
            _ => None,
        }
    }
}

pub(super) const SETUP_SHADERS: (&str, &str) = ("vertex-setup.wgsl", "fragment-setup.wgsl");
pub(super) const RAYCAST_SHADERS: (&str, &str) = ("vertex-raycast.wgsl", "fragment-raycast.wgsl");

/// Setup pipeline variants: culling back faces keeps the near faces.
pub(super) const FRONT_FACE_PASS: usize = 0;
pub(super) const BACK_FACE_PASS: usize = 1;
const SETUP_CULL_MODES: &[Option<wgpu::Face>] = &[Some(wgpu::Face::Back), Some(wgpu::Face::Front)];

// ── per-target state ──────────────────────────────────────────────────────

/// GPU resources cached for one render target.
///
/// Everything starts absent and is created on first use. The target binding is
/// recorded at most once; a state that was never bound was never used.
#[derive(Default)]
pub struct TargetState {
    target: Option<TargetId>,

    pub(super) setup: ProgramSlot,
    pub(super) raycast: ProgramSlot,

    pub(super) bounds_vertices: Option<wgpu::Buffer>,
    pub(super) bounds_indices: Option<wgpu::Buffer>,
    pub(super) quad_vertices: Option<wgpu::Buffer>,

    pub(super) faces: Option<FaceTargets>,
    pub(super) volume: Option<VolumeTexture>,
    pub(super) transfer: Option<TransferTexture>,
    /// Staging generation last uploaded; `None` after a preview upload.
    pub(super) transfer_generation: Option<u64>,
    pub(super) samplers: Option<(wgpu::Sampler, wgpu::Sampler)>,

    pub(super) framebuffers: FramebufferStack,
}

impl TargetState {
    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    /// Records the owning target; later calls keep the first value.
    pub fn bind_target(&mut self, id: TargetId) {
        if self.target.is_none() {
            self.target = Some(id);
        }
    }

    /// Re-uploads the volume when its content stamp changed.
    pub fn update_volume_texture(&mut self, ctx: &RenderCtx<'_>, volume: &ImageVolume) {
        if self.volume.as_ref().is_some_and(|t| t.is_current(volume)) {
            return;
        }
        self.volume = Some(VolumeTexture::upload(ctx.device(), ctx.queue(), volume));
        ctx.context.check_error();
    }

    /// Uploads packed transfer-function rows.
    pub fn upload_transfer_rows(&mut self, ctx: &RenderCtx<'_>, bytes: &[u8]) {
        self.transfer = TransferTexture::upload(self.transfer.take(), ctx.device(), ctx.queue(), bytes);
        ctx.context.check_error();
    }

    /// Builds missing programs from `shader_dir` (or the bundled sources).
    pub fn update_programs(&mut self, ctx: &RenderCtx<'_>, shader_dir: Option<&Path>) {
        if matches!(self.setup, ProgramSlot::Unbuilt) {
            let desc = PipelineDesc {
                label: "voxlight ray setup",
                vertex: BoundsVertex::LAYOUT,
                topology: wgpu::PrimitiveTopology::TriangleList,
                target_format: FACE_FORMAT,
                blend: None,
                cull_modes: SETUP_CULL_MODES,
            };
            self.setup = build_program(ctx, shader_dir, SETUP_SHADERS, &desc);
        }

        if matches!(self.raycast, ProgramSlot::Unbuilt) {
            let desc = PipelineDesc {
                label: "voxlight raycast",
                vertex: QuadVertex::LAYOUT,
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                target_format: ctx.surface_format,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                cull_modes: &[None],
            };
            self.raycast = build_program(ctx, shader_dir, RAYCAST_SHADERS, &desc);
        }
    }

    /// Rewrites the box corners; the index buffer is created once.
    pub fn update_bounds_buffer(&mut self, ctx: &RenderCtx<'_>, bounds: &Bounds) {
        let vertices = geometry::bounds_vertices(bounds);
        match self.bounds_vertices.as_ref() {
            Some(buffer) => ctx.queue().write_buffer(buffer, 0, bytemuck::cast_slice(&vertices)),
            None => {
                self.bounds_vertices = Some(ctx.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("voxlight bounds vertices"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                }));
            }
        }

        if self.bounds_indices.is_none() {
            self.bounds_indices = Some(ctx.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("voxlight bounds indices"),
                contents: bytemuck::cast_slice(&BOUNDS_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            }));
        }
    }

    pub fn update_quad_buffer(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vertices.is_some() {
            return;
        }
        self.quad_vertices = Some(ctx.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxlight quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
    }

    /// (Re)allocates the face targets when the viewport size changed.
    pub fn update_framebuffers(&mut self, ctx: &RenderCtx<'_>) {
        self.framebuffers.save();
        if !self.faces.as_ref().is_some_and(|f| f.viewport() == ctx.viewport) {
            self.faces = Some(FaceTargets::allocate(ctx.device(), ctx.viewport));
            ctx.context.check_error();
        }
        self.framebuffers.restore();
    }

    pub fn update_samplers(&mut self, ctx: &RenderCtx<'_>) {
        if self.samplers.is_none() {
            self.samplers = Some((texture::volume_sampler(ctx.device()), texture::transfer_sampler(ctx.device())));
        }
    }

    pub(super) fn viewport(&self) -> Option<Viewport> {
        self.faces.as_ref().map(FaceTargets::viewport)
    }
}

impl Drop for TargetState {
    fn drop(&mut self) {
        if let Some(id) = self.target {
            log::debug!("releasing volume render state for target {id:?}");
        }
    }
}

fn build_program(
    ctx: &RenderCtx<'_>,
    shader_dir: Option<&Path>,
    (vertex, fragment): (&str, &str),
    desc: &PipelineDesc<'_>,
) -> ProgramSlot {
    let sources = match source::load_pair(shader_dir, source::BUNDLED, vertex, fragment) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return ProgramSlot::Failed;
        }
    };

    let mut program = ShaderProgram::new();
    if program.build(ctx.context, &sources.vertex, &sources.fragment, desc) {
        log::debug!("built {} program from {:?}", desc.label, sources.origin);
        ProgramSlot::Ready(program)
    } else {
        log::error!(
            "can't build shader program {}, log follows:\n{}",
            desc.label,
            program.build_log().unwrap_or_default()
        );
        ProgramSlot::Failed
    }
}

// ── registry ──────────────────────────────────────────────────────────────

/// Per-target states keyed by target identity.
///
/// States are created on first lookup and dropped only when the owning target
/// reports teardown.
#[derive(Default)]
pub struct TargetRegistry {
    states: HashMap<TargetId, TargetState>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, id: TargetId) -> &mut TargetState {
        self.states.entry(id).or_default()
    }

    pub fn get(&self, id: TargetId) -> Option<&TargetState> {
        self.states.get(&id)
    }

    /// Drops the state of a destroyed target. Returns whether one existed.
    pub fn teardown(&mut self, id: TargetId) -> bool {
        self.states.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
