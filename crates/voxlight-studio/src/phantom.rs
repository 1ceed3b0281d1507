//! Synthetic CT phantom.
//!
//! A torso-like ellipsoid in air: a fat layer under the skin, soft tissue, a
//! bone ring with a spine, and a contrast-filled vessel. Values are in
//! Hounsfield units.

use glam::Vec3;
use voxlight_engine::scene::{ImageVolume, ScalarData, VolumeError};

pub const AIR: i16 = -1000;
pub const FAT: i16 = -100;
pub const SOFT_TISSUE: i16 = 40;
pub const CONTRAST: i16 = 300;
pub const BONE: i16 = 1000;

/// Generates an `n`³ phantom centered on the world origin, one unit per voxel.
pub fn ct_phantom(n: u32) -> Result<ImageVolume, VolumeError> {
    let len = n as usize * n as usize * n as usize;
    let mut samples = Vec::with_capacity(len);

    let half = n as f32 * 0.5;
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                // Voxel center in [-1, 1]^3.
                let p = (Vec3::new(i as f32, j as f32, k as f32) + 0.5 - half) / half;
                samples.push(sample_at(p));
            }
        }
    }

    ImageVolume::new([n; 3], Vec3::ONE, Vec3::splat(-half), ScalarData::I16(samples))
}

fn sample_at(p: Vec3) -> i16 {
    let body = (p / Vec3::new(0.85, 0.7, 0.95)).length();
    if body > 1.0 {
        return AIR;
    }
    if body > 0.92 {
        return FAT;
    }
    if p.z.abs() < 0.8 {
        let radial = (p.x / 0.85).hypot(p.y / 0.7);
        if (0.62..0.7).contains(&radial) {
            return BONE;
        }
        if (p - Vec3::new(0.0, -0.45, p.z)).length() < 0.12 {
            return BONE;
        }
    }
    if (p.x - 0.2).hypot(p.y) < 0.08 {
        return CONTRAST;
    }
    SOFT_TISSUE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(v: &ImageVolume, [i, j, k]: [u32; 3]) -> i16 {
        let [w, h, _] = v.dimensions();
        let ScalarData::I16(s) = v.scalars() else {
            panic!("phantom is i16");
        };
        s[(k * w * h + j * w + i) as usize]
    }

    #[test]
    fn cube_of_requested_size() {
        let v = ct_phantom(16).unwrap();
        assert_eq!(v.dimensions(), [16, 16, 16]);
        assert_eq!(v.scalars().len(), 16 * 16 * 16);
    }

    #[test]
    fn centered_on_origin() {
        let v = ct_phantom(32).unwrap();
        assert!(v.bounds().center().abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn corners_are_air_center_is_tissue() {
        let v = ct_phantom(32).unwrap();
        assert_eq!(at(&v, [0, 0, 0]), AIR);
        assert_eq!(at(&v, [31, 31, 31]), AIR);
        assert_eq!(at(&v, [16, 16, 16]), SOFT_TISSUE);
    }

    #[test]
    fn contains_bone_and_contrast() {
        let v = ct_phantom(64).unwrap();
        let ScalarData::I16(s) = v.scalars() else {
            panic!("phantom is i16");
        };
        assert!(s.contains(&BONE));
        assert!(s.contains(&CONTRAST));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(ct_phantom(0).is_err());
    }
}
