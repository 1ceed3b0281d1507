use winit::window::WindowId;

use crate::device::GpuContext;

/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; `1.0` for an empty viewport.
    #[inline]
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Opaque identity of a drawing surface, used only as a key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<WindowId> for TargetId {
    fn from(id: WindowId) -> Self {
        Self(u64::from(id))
    }
}

/// Renderer-facing context (GPU context + surface format + viewport).
///
/// This is intentionally small and stable.
pub struct RenderCtx<'a> {
    pub context: &'a GpuContext,
    pub surface_format: wgpu::TextureFormat,
    pub viewport: Viewport,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(context: &'a GpuContext, surface_format: wgpu::TextureFormat, viewport: Viewport) -> Self {
        Self {
            context,
            surface_format,
            viewport,
        }
    }

    #[inline]
    pub fn device(&self) -> &'a wgpu::Device {
        self.context.device()
    }

    #[inline]
    pub fn queue(&self) -> &'a wgpu::Queue {
        self.context.queue()
    }
}

/// Target for drawing (encoder + color view + surface identity).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub id: TargetId,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView, id: TargetId) -> Self {
        Self {
            encoder,
            color_view,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_empty_viewport_is_one() {
        assert_eq!(Viewport::new(0, 0).aspect(), 1.0);
        assert!(Viewport::new(640, 0).is_empty());
    }

    #[test]
    fn aspect_is_width_over_height() {
        assert_eq!(Viewport::new(800, 400).aspect(), 2.0);
        assert!(!Viewport::new(1, 1).is_empty());
    }

    #[test]
    fn target_ids_compare_by_value() {
        assert_eq!(TargetId::new(3), TargetId::new(3));
        assert_ne!(TargetId::new(3), TargetId::new(4));
    }
}
