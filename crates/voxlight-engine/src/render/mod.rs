//! GPU rendering subsystem.
//!
//! Renderers record into the host's frame encoder and own their GPU resources
//! (pipelines, buffers, textures), cached per render target.
//!
//! Convention:
//! - viewports are in physical pixels
//! - the host clears its target; renderers load and blend over it

mod ctx;
pub mod volume;

pub use ctx::{RenderCtx, RenderTarget, TargetId, Viewport};
