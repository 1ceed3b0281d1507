use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3};

/// Intensity that maps to 0.0 in the normalized volume texture.
pub const NORMALIZE_OFFSET: f32 = 1024.0;

/// Intensity span mapped onto `[0, 1]`.
pub const NORMALIZE_RANGE: f32 = 4096.0;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Returns a process-wide, strictly increasing modification stamp.
pub fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Voxel storage in the source precision.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarData {
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ScalarData {
    pub fn len(&self) -> usize {
        match self {
            ScalarData::U8(v) => v.len(),
            ScalarData::I16(v) => v.len(),
            ScalarData::U16(v) => v.len(),
            ScalarData::I32(v) => v.len(),
            ScalarData::F32(v) => v.len(),
            ScalarData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Casts every sample to `f32`, then maps `[-1024, 3072]` onto `[0, 1]`.
    ///
    /// Samples outside that window are clamped.
    pub fn normalized(&self) -> Vec<f32> {
        match self {
            ScalarData::U8(v) => v.iter().map(|&s| normalize(f32::from(s))).collect(),
            ScalarData::I16(v) => v.iter().map(|&s| normalize(f32::from(s))).collect(),
            ScalarData::U16(v) => v.iter().map(|&s| normalize(f32::from(s))).collect(),
            ScalarData::I32(v) => v.iter().map(|&s| normalize(s as f32)).collect(),
            ScalarData::F32(v) => v.iter().map(|&s| normalize(s)).collect(),
            ScalarData::F64(v) => v.iter().map(|&s| normalize(s as f32)).collect(),
        }
    }
}

/// Normalizes one intensity sample for the volume texture.
pub fn normalize(sample: f32) -> f32 {
    ((sample + NORMALIZE_OFFSET) / NORMALIZE_RANGE).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    ZeroExtent { dimensions: [u32; 3] },
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeError::ZeroExtent { dimensions } => {
                write!(f, "volume dimensions {dimensions:?} have a zero extent")
            }
            VolumeError::LengthMismatch { expected, actual } => {
                write!(f, "volume holds {actual} samples, dimensions require {expected}")
            }
        }
    }
}

impl std::error::Error for VolumeError {}

/// Axis-aligned world-space box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }

    /// Corner `i`, bit 0 selecting max x, bit 1 max y, bit 2 max z.
    pub fn corner(&self, i: usize) -> Vec3 {
        Vec3::new(
            if i & 1 != 0 { self.max.x } else { self.min.x },
            if i & 2 != 0 { self.max.y } else { self.min.y },
            if i & 4 != 0 { self.max.z } else { self.min.z },
        )
    }
}

/// A scalar 3-D grid with world placement and a content stamp.
///
/// Voxel `(i, j, k)` occupies index space `[i, i + 1] x [j, j + 1] x [k, k + 1]`;
/// `index_to_world` maps that space into world coordinates.
#[derive(Debug, Clone)]
pub struct ImageVolume {
    dimensions: [u32; 3],
    spacing: Vec3,
    origin: Vec3,
    scalars: ScalarData,
    modified: u64,
}

impl ImageVolume {
    /// Creates a volume with samples stored x-fastest, then y, then z.
    pub fn new(dimensions: [u32; 3], spacing: Vec3, origin: Vec3, scalars: ScalarData) -> Result<Self, VolumeError> {
        check_len(dimensions, &scalars)?;
        Ok(Self {
            dimensions,
            spacing,
            origin,
            scalars,
            modified: next_stamp(),
        })
    }

    pub fn dimensions(&self) -> [u32; 3] {
        self.dimensions
    }

    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn scalars(&self) -> &ScalarData {
        &self.scalars
    }

    /// Stamp of the last content change.
    pub fn modified(&self) -> u64 {
        self.modified
    }

    /// Replaces the samples, keeping the geometry.
    pub fn set_scalars(&mut self, scalars: ScalarData) -> Result<(), VolumeError> {
        check_len(self.dimensions, &scalars)?;
        self.scalars = scalars;
        self.touch();
        Ok(())
    }

    /// Marks the content as changed.
    pub fn touch(&mut self) {
        self.modified = next_stamp();
    }

    pub fn index_to_world(&self) -> Mat4 {
        Mat4::from_translation(self.origin) * Mat4::from_scale(self.spacing)
    }

    /// World bounds of the transformed index box.
    pub fn bounds(&self) -> Bounds {
        let model = self.index_to_world();
        let extent = Vec3::new(
            self.dimensions[0] as f32,
            self.dimensions[1] as f32,
            self.dimensions[2] as f32,
        );
        let index_box = Bounds {
            min: Vec3::ZERO,
            max: extent,
        };

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let p = model.transform_point3(index_box.corner(i));
            min = min.min(p);
            max = max.max(p);
        }
        Bounds { min, max }
    }
}

fn check_len(dimensions: [u32; 3], scalars: &ScalarData) -> Result<(), VolumeError> {
    if dimensions.contains(&0) {
        return Err(VolumeError::ZeroExtent { dimensions });
    }
    let expected = dimensions.iter().map(|&d| d as usize).product::<usize>();
    if scalars.len() != expected {
        return Err(VolumeError::LengthMismatch {
            expected,
            actual: scalars.len(),
        });
    }
    Ok(())
}
