//! GPU ray-casting of scalar volumes.
//!
//! Each frame, per render target:
//! - bind the target's cached state (created on first use)
//! - refresh the volume texture, transfer texture, programs, buffers and face targets
//! - draw the bounding box twice into offscreen targets (ray entry and exit)
//! - march every pixel's ray through the volume into the host target
//! - restore the framebuffer binding saved before drawing

mod geometry;
mod interface;
mod mapper;
mod matrices;
mod program;
mod source;
mod state;
mod texture;

pub use geometry::{BoundsVertex, QuadVertex, VertexLayout, BOUNDS_INDICES, QUAD_VERTICES};
pub use interface::{Attribute, Binding, BindingKind, ShaderInterface};
pub use mapper::{DisplayMode, MapperConfig, VolumeMapper, SHADER_DIR_ENV};
pub use matrices::{fix_depth_range, projection_matrix, view_matrix};
pub use program::{PipelineDesc, ShaderProgram};
pub use source::{load_pair, ShaderOrigin, ShaderSourceError, ShaderSources, BUNDLED};
pub use state::{AttachmentId, FramebufferBinding, FramebufferStack, ProgramSlot, TargetRegistry, TargetState};
