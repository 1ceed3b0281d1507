use std::collections::HashMap;
use std::fmt::Write as _;
use std::num::NonZeroU64;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::geometry::VertexLayout;
use super::interface::{BindingKind, ShaderInterface};
use crate::device::{GpuContext, GpuError};

/// Fixed-function state a program is linked against.
///
/// One pipeline is created per entry of `cull_modes`; `enable` selects it by
/// position.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub vertex: VertexLayout,
    pub topology: wgpu::PrimitiveTopology,
    pub target_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub cull_modes: &'a [Option<wgpu::Face>],
}

struct Linked {
    interface: ShaderInterface,
    bind_group_layout: wgpu::BindGroupLayout,
    pipelines: Vec<wgpu::RenderPipeline>,
    /// Uniform buffers keyed by binding index.
    uniforms: HashMap<u32, wgpu::Buffer>,
}

/// A vertex + fragment shader pair linked into render pipelines.
///
/// Uniforms and attributes are addressed by name through their binding index
/// or vertex location; unknown names resolve to `-1`, which every setter
/// ignores.
#[derive(Default)]
pub struct ShaderProgram {
    linked: Option<Linked>,
    bind_group: Option<wgpu::BindGroup>,
    log: Option<String>,
}

impl ShaderProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles both stages, then links them into pipelines.
    ///
    /// On failure the captured compiler or linker diagnostics are kept in
    /// `build_log` and no GPU objects are retained. Shader modules are always
    /// released once pipelines exist.
    pub fn build(&mut self, context: &GpuContext, vertex: &str, fragment: &str, desc: &PipelineDesc<'_>) -> bool {
        self.linked = None;
        self.bind_group = None;
        self.log = None;

        // Errors from earlier calls must not be attributed to this build.
        context.check_error();

        let vs = compile(context, desc.label, "vertex", vertex);
        let fs = compile(context, desc.label, "fragment", fragment);
        let (vs, fs) = match (vs, fs) {
            (Ok(vs), Ok(fs)) => (vs, fs),
            (vs, fs) => {
                let log = [vs.err(), fs.err()].into_iter().flatten().collect::<String>();
                self.log = Some(log);
                return false;
            }
        };

        match link(context, &vs, &fs, vertex, fragment, desc) {
            Ok(linked) => {
                self.linked = Some(linked);
                true
            }
            Err(log) => {
                self.log = Some(log);
                false
            }
        }
    }

    /// Diagnostics of the most recent failed build.
    pub fn build_log(&self) -> Option<&str> {
        self.log.as_deref()
    }

    /// Binding index of a named resource, or `-1` (logged) if unknown.
    pub fn uniform_location(&self, name: &str) -> i32 {
        let found = self
            .linked
            .as_ref()
            .and_then(|l| l.interface.binding(name))
            .map(|b| b.index as i32);
        found.unwrap_or_else(|| {
            log::warn!("can't find uniform `{name}`");
            -1
        })
    }

    /// Vertex input location of a named attribute, or `-1` (logged) if unknown.
    pub fn attribute_location(&self, name: &str) -> i32 {
        let found = self
            .linked
            .as_ref()
            .and_then(|l| l.interface.attribute(name))
            .map(|a| a.location as i32);
        found.unwrap_or_else(|| {
            log::warn!("can't find attribute `{name}`");
            -1
        })
    }

    /// Writes raw bytes into the uniform buffer at `location`.
    pub fn set_uniform(&self, queue: &wgpu::Queue, location: i32, bytes: &[u8]) {
        let Some(buffer) = self.uniform_buffer(location) else {
            return;
        };
        if bytes.len() as u64 > buffer.size() {
            log::warn!("uniform data for binding {location} is larger than its buffer");
            return;
        }
        queue.write_buffer(buffer, 0, bytes);
    }

    pub fn set_mat4(&self, queue: &wgpu::Queue, location: i32, m: &Mat4) {
        self.set_uniform(queue, location, bytemuck::bytes_of(&m.to_cols_array()));
    }

    pub fn set_vec3(&self, queue: &wgpu::Queue, location: i32, v: Vec3) {
        self.set_uniform(queue, location, bytemuck::bytes_of(&v.extend(0.0).to_array()));
    }

    pub fn set_f32(&self, queue: &wgpu::Queue, location: i32, v: f32) {
        self.set_uniform(queue, location, bytemuck::bytes_of(&v));
    }

    /// Creates the bind group from the program's uniforms and the given
    /// textures and samplers.
    ///
    /// Every texture and sampler the shaders declare must be supplied.
    pub fn bind_resources(
        &mut self,
        device: &wgpu::Device,
        textures: &[(i32, &wgpu::TextureView)],
        samplers: &[(i32, &wgpu::Sampler)],
    ) -> bool {
        self.bind_group = None;
        let Some(linked) = self.linked.as_ref() else {
            return false;
        };

        let mut entries = Vec::with_capacity(linked.interface.bindings().len());
        for binding in linked.interface.bindings() {
            let index = binding.index as i32;
            let resource = match binding.kind {
                BindingKind::Uniform { .. } => linked.uniforms.get(&binding.index).map(|b| b.as_entire_binding()),
                BindingKind::Texture { .. } => textures
                    .iter()
                    .find(|(loc, _)| *loc == index)
                    .map(|(_, view)| wgpu::BindingResource::TextureView(view)),
                BindingKind::Sampler => samplers
                    .iter()
                    .find(|(loc, _)| *loc == index)
                    .map(|(_, sampler)| wgpu::BindingResource::Sampler(sampler)),
            };
            let Some(resource) = resource else {
                log::warn!("no resource bound to `{}` (binding {})", binding.name, binding.index);
                return false;
            };
            entries.push(wgpu::BindGroupEntry {
                binding: binding.index,
                resource,
            });
        }

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("voxlight program bind group"),
            layout: &linked.bind_group_layout,
            entries: &entries,
        }));
        true
    }

    /// Makes this program current on `rpass` using pipeline `variant`.
    ///
    /// No-op returning `false` if the program was never built.
    pub fn enable(&self, rpass: &mut wgpu::RenderPass<'_>, variant: usize) -> bool {
        let Some(linked) = self.linked.as_ref() else {
            return false;
        };
        let Some(pipeline) = linked.pipelines.get(variant) else {
            return false;
        };
        rpass.set_pipeline(pipeline);
        if let Some(bind_group) = self.bind_group.as_ref() {
            rpass.set_bind_group(0, bind_group, &[]);
        }
        true
    }

    /// Ends the pass the program was enabled on; later passes start unbound.
    pub fn disable(&self, rpass: wgpu::RenderPass<'_>) {
        drop(rpass);
    }

    fn uniform_buffer(&self, location: i32) -> Option<&wgpu::Buffer> {
        let index = u32::try_from(location).ok()?;
        self.linked.as_ref()?.uniforms.get(&index)
    }
}

fn compile(context: &GpuContext, label: &str, stage: &str, source: &str) -> Result<wgpu::ShaderModule, String> {
    let (module, scoped) = context.capture_validation(|device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} {stage}")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    });

    let mut log = String::new();
    let info = pollster::block_on(module.get_compilation_info());
    for msg in &info.messages {
        if !matches!(msg.message_type, wgpu::CompilationMessageType::Error) {
            continue;
        }
        match &msg.location {
            Some(loc) => {
                let _ = writeln!(log, "{stage}:{}:{}: {}", loc.line_number, loc.line_position, msg.message);
            }
            None => {
                let _ = writeln!(log, "{stage}: {}", msg.message);
            }
        }
    }
    // The scope sees the same failure as the compilation info; report it once.
    if log.is_empty() {
        append_errors(&mut log, stage, scoped);
    }

    if log.is_empty() { Ok(module) } else { Err(log) }
}

fn link(
    context: &GpuContext,
    vs: &wgpu::ShaderModule,
    fs: &wgpu::ShaderModule,
    vertex_src: &str,
    fragment_src: &str,
    desc: &PipelineDesc<'_>,
) -> Result<Linked, String> {
    let device = context.device();
    let interface = ShaderInterface::parse(vertex_src, fragment_src).map_err(|e| format!("link: {e}\n"))?;

    let mut attributes = Vec::with_capacity(desc.vertex.attributes.len());
    for &(name, format, offset) in desc.vertex.attributes {
        let attr = interface
            .attribute(name)
            .ok_or_else(|| format!("link: vertex attribute `{name}` is not declared\n"))?;
        attributes.push(wgpu::VertexAttribute {
            format,
            offset,
            shader_location: attr.location,
        });
    }

    let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = interface
        .bindings()
        .iter()
        .map(|b| wgpu::BindGroupLayoutEntry {
            binding: b.index,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: match b.kind {
                BindingKind::Uniform { size } => wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(size),
                },
                BindingKind::Texture { dimension } => wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: dimension,
                    multisampled: false,
                },
                BindingKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
            },
            count: None,
        })
        .collect();

    let ((bind_group_layout, pipelines), scoped) = context.capture_validation(|device| {
        create_pipelines(device, vs, fs, &attributes, &layout_entries, desc)
    });

    let mut log = String::new();
    append_errors(&mut log, "link", scoped);
    if !log.is_empty() {
        return Err(log);
    }

    let uniforms = interface
        .bindings()
        .iter()
        .filter_map(|b| match b.kind {
            BindingKind::Uniform { size } => Some((b.index, size)),
            _ => None,
        })
        .map(|(index, size)| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("voxlight uniform"),
                contents: &vec![0u8; size as usize],
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            (index, buffer)
        })
        .collect();

    Ok(Linked {
        interface,
        bind_group_layout,
        pipelines,
        uniforms,
    })
}

fn create_pipelines(
    device: &wgpu::Device,
    vs: &wgpu::ShaderModule,
    fs: &wgpu::ShaderModule,
    attributes: &[wgpu::VertexAttribute],
    layout_entries: &[wgpu::BindGroupLayoutEntry],
    desc: &PipelineDesc<'_>,
) -> (wgpu::BindGroupLayout, Vec<wgpu::RenderPipeline>) {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} bind group layout", desc.label)),
        entries: layout_entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} pipeline layout", desc.label)),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let buffers = [wgpu::VertexBufferLayout {
        array_stride: desc.vertex.stride,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }];

    let pipelines: Vec<wgpu::RenderPipeline> = desc
        .cull_modes
        .iter()
        .map(|&cull_mode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vs,
                    entry_point: None,
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: fs,
                    entry_point: None,
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.target_format,
                        blend: desc.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })
        .collect();
    (bind_group_layout, pipelines)
}

/// Folds scoped validation errors into a build log, one line per error.
fn append_errors(log: &mut String, stage: &str, errors: impl IntoIterator<Item = GpuError>) {
    for err in errors {
        let _ = writeln!(log, "{stage}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::GpuErrorClass;

    fn validation(message: &str) -> GpuError {
        GpuError {
            class: GpuErrorClass::Validation,
            message: message.to_string(),
        }
    }

    // ── build log ─────────────────────────────────────────────────────────

    #[test]
    fn scoped_error_is_tagged_with_its_stage() {
        let mut log = String::new();
        append_errors(&mut log, "link", Some(validation("bind group layout mismatch")));
        assert_eq!(log, "link: Validation error: bind group layout mismatch\n");
    }

    #[test]
    fn clean_scope_leaves_log_empty() {
        let mut log = String::new();
        append_errors(&mut log, "vertex", None);
        assert!(log.is_empty());
    }

    #[test]
    fn each_build_keeps_its_own_errors() {
        let mut setup = String::new();
        let mut raycast = String::new();
        append_errors(&mut setup, "fragment", Some(validation("setup failure")));
        append_errors(&mut raycast, "fragment", None);
        assert!(setup.contains("setup failure"));
        assert!(raycast.is_empty());
    }

    #[test]
    fn unbuilt_program_has_no_locations() {
        let program = ShaderProgram::new();
        assert_eq!(program.uniform_location("view"), -1);
        assert_eq!(program.attribute_location("position"), -1);
        assert!(program.build_log().is_none());
    }
}
