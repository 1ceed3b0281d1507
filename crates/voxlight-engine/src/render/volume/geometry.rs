//! Static proxy geometry: the volume's bounding box and the screen quad.

use bytemuck::{Pod, Zeroable};

use crate::scene::Bounds;

/// Named vertex attributes of one interleaved buffer.
///
/// Shader locations are resolved by name when the program is built.
#[derive(Debug, Copy, Clone)]
pub struct VertexLayout {
    pub stride: u64,
    /// `(attribute name, format, byte offset)`
    pub attributes: &'static [(&'static str, wgpu::VertexFormat, u64)],
}

// ── bounding box ──────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BoundsVertex {
    pub vertex: [f32; 3],
}

impl BoundsVertex {
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<BoundsVertex>() as u64,
        attributes: &[("vertex", wgpu::VertexFormat::Float32x3, 0)],
    };
}

/// Two triangles per face, counter-clockwise seen from outside the box.
pub const BOUNDS_INDICES: [u16; 36] = [
    6, 5, 4, //
    7, 6, 4, // back
    4, 0, 3, //
    4, 3, 7, // left
    2, 1, 5, //
    6, 2, 5, // right
    4, 5, 0, //
    5, 1, 0, // bottom
    3, 6, 7, //
    3, 2, 6, // top
    0, 1, 2, //
    0, 2, 3, // front
];

/// Box corners in index-buffer order: the front (max z) face counter-clockwise
/// from the bottom left, then the back (min z) face in the same order.
pub fn bounds_vertices(b: &Bounds) -> [BoundsVertex; 8] {
    let (lo, hi) = (b.min, b.max);
    [
        [lo.x, lo.y, hi.z],
        [hi.x, lo.y, hi.z],
        [hi.x, hi.y, hi.z],
        [lo.x, hi.y, hi.z],
        [lo.x, lo.y, lo.z],
        [hi.x, lo.y, lo.z],
        [hi.x, hi.y, lo.z],
        [lo.x, hi.y, lo.z],
    ]
    .map(|vertex| BoundsVertex { vertex })
}

// ── screen quad ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub vertex: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<QuadVertex>() as u64,
        attributes: &[
            ("vertex", wgpu::VertexFormat::Float32x2, 0),
            ("uv", wgpu::VertexFormat::Float32x2, 8),
        ],
    };
}

/// Full-screen triangle strip.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { vertex: [1.0, 1.0], uv: [1.0, 1.0] },
    QuadVertex { vertex: [-1.0, 1.0], uv: [0.0, 1.0] },
    QuadVertex { vertex: [1.0, -1.0], uv: [1.0, 0.0] },
    QuadVertex { vertex: [-1.0, -1.0], uv: [0.0, 0.0] },
];
