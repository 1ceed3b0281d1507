use std::borrow::Cow;
use std::ffi::OsString;
use std::path::PathBuf;

use super::matrices;
use super::state::{
    self, AttachmentId, FramebufferBinding, TargetRegistry, TargetState, BACK_FACE_PASS, FRONT_FACE_PASS,
};
use crate::render::{RenderCtx, RenderTarget, TargetId};
use crate::scene::{Camera, VolumeNode};
use crate::transfer::{TransferFunction, TransferFunctionBank, TransferFunctionTable};

/// Environment variable overriding the shader lookup directory.
pub const SHADER_DIR_ENV: &str = "VOXLIGHT_SHADER_DIR";

/// Volume mapper configuration.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Directory searched for shader files before the bundled copies.
    pub shader_dir: Option<PathBuf>,

    /// Minimum GPU feature level, in OpenGL terms.
    pub required_version: (u32, u32),

    /// Ray-march step length, in voxels.
    pub step_scale: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            shader_dir: Some(shader_dir_from(std::env::var_os(SHADER_DIR_ENV))),
            required_version: (3, 3),
            step_scale: 1.0,
        }
    }
}

fn shader_dir_from(env: Option<OsString>) -> PathBuf {
    match env {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/src/render/volume/shaders")),
    }
}

/// Source of the transfer texture.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Resample the node's live curve pair every frame.
    Preview,
    /// Animate across the staged bank.
    #[default]
    Demo,
}

/// Bank contents waiting to reach each target's transfer texture.
#[derive(Debug, Default)]
struct Staging {
    bytes: Vec<u8>,
    generation: u64,
}

/// GPU ray-casting volume mapper.
///
/// Holds per-target GPU state, the staged transfer-function bank and the
/// animation index. `paint` runs the whole draw sequence for one target.
pub struct VolumeMapper {
    config: MapperConfig,
    registry: TargetRegistry,
    mode: DisplayMode,
    staging: Staging,
    transfer_index: f64,
    /// Cached hardware check; `None` until the first paint.
    supported: Option<bool>,
}

impl VolumeMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            registry: TargetRegistry::new(),
            mode: DisplayMode::default(),
            staging: Staging::default(),
            transfer_index: 0.0,
            supported: None,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.mode != mode {
            log::debug!("volume display mode: {mode:?}");
            self.mode = mode;
        }
    }

    /// Stages the whole bank for upload and rewinds the animation index.
    pub fn set_transfer_texture(&mut self, bank: &TransferFunctionBank) {
        self.staging.bytes.clear();
        self.staging.bytes.extend_from_slice(bank.as_bytes());
        self.staging.generation += 1;
        self.transfer_index = 0.0;
    }

    /// Number of tables currently staged.
    pub fn staged_tables(&self) -> usize {
        self.staging.bytes.len() / crate::transfer::TABLE_BYTES
    }

    pub fn transfer_index(&self) -> f64 {
        self.transfer_index
    }

    pub fn set_transfer_index(&mut self, index: f64) {
        self.transfer_index = index;
    }

    /// Number of targets holding GPU state.
    pub fn target_count(&self) -> usize {
        self.registry.len()
    }

    /// Drops the GPU state of a destroyed target.
    pub fn release_target(&mut self, id: TargetId) {
        if self.registry.teardown(id) {
            log::debug!("released volume state of target {id:?}");
        }
    }

    /// Draws `node` as seen by `camera` into `target`.
    ///
    /// Runs bind, resource refresh, the bounding pass, the ray-march pass and
    /// the framebuffer restore, in that order. Missing programs or resources
    /// skip the affected pass; nothing here aborts the host frame.
    pub fn paint(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, node: &VolumeNode, camera: &Camera) {
        if !self.check_support(ctx) || ctx.viewport.is_empty() {
            return;
        }

        let state = self.registry.get_or_create(target.id);
        state.bind_target(target.id);

        state.update_volume_texture(ctx, node.volume());
        update_transfer_texture(state, ctx, self.mode, &self.staging, node);
        state.update_programs(ctx, self.config.shader_dir.as_deref());
        state.update_bounds_buffer(ctx, &node.bounds());
        state.update_quad_buffer(ctx);
        state.update_framebuffers(ctx);
        state.update_samplers(ctx);

        let index = match self.mode {
            DisplayMode::Demo => self.transfer_index as f32,
            DisplayMode::Preview => 0.0,
        };

        state.framebuffers.save();
        draw_bounds(state, ctx, target, camera);
        draw_rays(state, ctx, target, node, camera, index, self.config.step_scale);
        state.framebuffers.restore();

        ctx.context.check_error();
    }

    fn check_support(&mut self, ctx: &RenderCtx<'_>) -> bool {
        *self.supported.get_or_insert_with(|| {
            let (major, minor) = self.config.required_version;
            let ok = ctx.context.version_supported(major, minor);
            if !ok {
                log::error!("GPU feature level {major}.{minor} is not supported; volume rendering disabled");
            }
            ok
        })
    }
}

impl Default for VolumeMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

/// What a target's transfer texture needs this frame.
#[derive(Debug, PartialEq)]
enum TransferUpdate<'a> {
    Keep,
    /// The staged bank is empty; drop the texture so the ray pass is skipped.
    Clear { generation: u64 },
    /// Replace the texture rows. `generation` is `None` for preview tables.
    Upload { rows: Cow<'a, [u8]>, generation: Option<u64> },
}

fn plan_transfer_update<'a>(
    mode: DisplayMode,
    uploaded: Option<u64>,
    staging: &'a Staging,
    preview: Option<&TransferFunction>,
) -> TransferUpdate<'a> {
    match mode {
        DisplayMode::Demo if uploaded == Some(staging.generation) => TransferUpdate::Keep,
        DisplayMode::Demo if staging.bytes.is_empty() => TransferUpdate::Clear {
            generation: staging.generation,
        },
        DisplayMode::Demo => TransferUpdate::Upload {
            rows: Cow::Borrowed(&staging.bytes),
            generation: Some(staging.generation),
        },
        DisplayMode::Preview => match preview {
            Some(tf) => TransferUpdate::Upload {
                rows: Cow::Owned(TransferFunctionTable::sample(&tf.color, &tf.opacity).as_bytes().to_vec()),
                generation: None,
            },
            None => TransferUpdate::Keep,
        },
    }
}

fn update_transfer_texture(
    state: &mut TargetState,
    ctx: &RenderCtx<'_>,
    mode: DisplayMode,
    staging: &Staging,
    node: &VolumeNode,
) {
    match plan_transfer_update(mode, state.transfer_generation, staging, node.transfer_function()) {
        TransferUpdate::Keep => {}
        TransferUpdate::Clear { generation } => {
            state.transfer = None;
            state.transfer_generation = Some(generation);
        }
        TransferUpdate::Upload { rows, generation } => {
            state.upload_transfer_rows(ctx, &rows);
            state.transfer_generation = generation;
        }
    }
}

fn draw_bounds(state: &mut TargetState, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, camera: &Camera) {
    let TargetState {
        setup,
        bounds_vertices,
        bounds_indices,
        faces,
        framebuffers,
        ..
    } = state;
    let (Some(program), Some(vertices), Some(indices), Some(faces)) =
        (setup.program_mut(), bounds_vertices.as_ref(), bounds_indices.as_ref(), faces.as_ref())
    else {
        return;
    };

    let queue = ctx.queue();
    program.set_mat4(queue, program.uniform_location("view"), &matrices::view_matrix(camera));
    program.set_mat4(
        queue,
        program.uniform_location("projection"),
        &matrices::projection_matrix(camera, ctx.viewport),
    );
    if !program.bind_resources(ctx.device(), &[], &[]) {
        return;
    }

    for (attachment, variant) in [
        (AttachmentId::FrontFaces, FRONT_FACE_PASS),
        (AttachmentId::BackFaces, BACK_FACE_PASS),
    ] {
        framebuffers.bind(FramebufferBinding::both(attachment));
        let view = state::attachment_view(framebuffers.current().draw, faces, target.color_view);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("voxlight bounds"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if program.enable(&mut rpass, variant) {
            rpass.set_vertex_buffer(0, vertices.slice(..));
            rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..super::geometry::BOUNDS_INDICES.len() as u32, 0, 0..1);
        }
        program.disable(rpass);
    }
}

fn draw_rays(
    state: &mut TargetState,
    ctx: &RenderCtx<'_>,
    target: &mut RenderTarget<'_>,
    node: &VolumeNode,
    camera: &Camera,
    index: f32,
    step_scale: f32,
) {
    let TargetState {
        raycast,
        quad_vertices,
        faces,
        volume,
        transfer,
        samplers,
        framebuffers,
        ..
    } = state;
    let (Some(program), Some(quad), Some(faces), Some(volume), Some(transfer), Some((volume_sampler, transfer_sampler))) = (
        raycast.program_mut(),
        quad_vertices.as_ref(),
        faces.as_ref(),
        volume.as_ref(),
        transfer.as_ref(),
        samplers.as_ref(),
    ) else {
        return;
    };

    let queue = ctx.queue();
    program.set_mat4(queue, program.uniform_location("invertedmodel"), &node.inverse_model_matrix());
    program.set_vec3(queue, program.uniform_location("camerapos"), camera.position());
    program.set_f32(queue, program.uniform_location("transferindex"), index);
    program.set_f32(queue, program.uniform_location("stepscale"), step_scale);

    let textures = [
        (program.uniform_location("volume"), volume.view()),
        (program.uniform_location("frontfaces"), faces.front()),
        (program.uniform_location("backfaces"), faces.back()),
        (program.uniform_location("transfer"), transfer.view()),
    ];
    let samplers = [
        (program.uniform_location("volume_sampler"), volume_sampler),
        (program.uniform_location("transfer_sampler"), transfer_sampler),
    ];
    if !program.bind_resources(ctx.device(), &textures, &samplers) {
        return;
    }

    framebuffers.bind(FramebufferBinding::HOST);
    let view = state::attachment_view(framebuffers.current().draw, faces, target.color_view);

    // The host owns clearing its target.
    let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("voxlight raycast"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    if program.enable(&mut rpass, 0) {
        rpass.set_vertex_buffer(0, quad.slice(..));
        rpass.draw(0..super::geometry::QUAD_VERTICES.len() as u32, 0..1);
    }
    program.disable(rpass);
}
