//! GPU textures owned by one render target's state.

use crate::render::Viewport;
use crate::scene::ImageVolume;
use crate::transfer::{TABLE_BYTES, TABLE_WIDTH};

/// Format of the front/back-face proxy targets (world positions).
pub const FACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Normalized single-channel volume, re-uploaded when the source stamp changes.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    stamp: u64,
}

impl VolumeTexture {
    /// Normalizes and uploads `volume`.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, volume: &ImageVolume) -> Self {
        let [w, h, d] = volume.dimensions();
        let size = wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: d,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voxlight volume texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let normalized = volume.scalars().normalized();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&normalized),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w * 4),
                rows_per_image: Some(h),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("uploaded {w}x{h}x{d} volume texture (stamp {})", volume.modified());

        Self {
            texture,
            view,
            stamp: volume.modified(),
        }
    }

    pub fn is_current(&self, volume: &ImageVolume) -> bool {
        self.stamp == volume.modified() && self.dimensions() == volume.dimensions()
    }

    pub fn dimensions(&self) -> [u32; 3] {
        let size = self.texture.size();
        [size.width, size.height, size.depth_or_array_layers]
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Transfer-function rows: `TABLE_WIDTH x rows` premultiplied RGBA8.
pub struct TransferTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    rows: u32,
}

impl TransferTexture {
    /// Uploads `bytes`, reusing the texture when the row count is unchanged.
    ///
    /// `bytes` must hold whole tables; a partial trailing table is ignored.
    pub fn upload(
        existing: Option<Self>,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
    ) -> Option<Self> {
        let rows = (bytes.len() / TABLE_BYTES) as u32;
        if rows == 0 {
            return existing;
        }

        let this = match existing {
            Some(t) if t.rows == rows => t,
            _ => Self::allocate(device, rows),
        };

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &this.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes[..rows as usize * TABLE_BYTES],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(TABLE_BYTES as u32),
                rows_per_image: Some(rows),
            },
            this.texture.size(),
        );

        Some(this)
    }

    fn allocate(device: &wgpu::Device, rows: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voxlight transfer texture"),
            size: wgpu::Extent3d {
                width: TABLE_WIDTH as u32,
                height: rows,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view, rows }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Offscreen front/back-face proxy targets sized to the viewport.
pub struct FaceTargets {
    // Owns the attachments behind the views.
    _textures: [wgpu::Texture; 2],
    front: wgpu::TextureView,
    back: wgpu::TextureView,
    viewport: Viewport,
}

impl FaceTargets {
    pub fn allocate(device: &wgpu::Device, viewport: Viewport) -> Self {
        let make = |label: &'static str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: viewport.width,
                    height: viewport.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FACE_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };

        log::debug!("allocating {}x{} face targets", viewport.width, viewport.height);
        let textures = [make("voxlight front faces"), make("voxlight back faces")];
        let [front, back] = [&textures[0], &textures[1]]
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
        Self {
            _textures: textures,
            front,
            back,
            viewport,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn front(&self) -> &wgpu::TextureView {
        &self.front
    }

    pub fn back(&self) -> &wgpu::TextureView {
        &self.back
    }
}

/// Nearest, edge-clamped sampling for the volume.
pub fn volume_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("voxlight volume sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Nearest sampling, clamped along intensity and repeating across tables.
pub fn transfer_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("voxlight transfer sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
