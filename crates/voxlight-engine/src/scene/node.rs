use glam::Mat4;

use super::volume::{Bounds, ImageVolume};
use crate::transfer::TransferFunction;

/// A volume placed in the scene, with its optional editable transfer function.
#[derive(Debug, Clone)]
pub struct VolumeNode {
    volume: ImageVolume,
    /// Extra placement applied after the volume's own index-to-world mapping.
    transform: Mat4,
    transfer_function: Option<TransferFunction>,
}

impl VolumeNode {
    pub fn new(volume: ImageVolume) -> Self {
        Self {
            volume,
            transform: Mat4::IDENTITY,
            transfer_function: None,
        }
    }

    pub fn volume(&self) -> &ImageVolume {
        &self.volume
    }

    pub fn volume_mut(&mut self) -> &mut ImageVolume {
        &mut self.volume
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Maps voxel index space to world space.
    pub fn model_matrix(&self) -> Mat4 {
        self.transform * self.volume.index_to_world()
    }

    /// Maps world space back to voxel index space.
    pub fn inverse_model_matrix(&self) -> Mat4 {
        self.model_matrix().inverse()
    }

    /// World-space bounds of the whole volume.
    pub fn bounds(&self) -> Bounds {
        let local = self.volume.bounds();
        let mut min = glam::Vec3::splat(f32::INFINITY);
        let mut max = glam::Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let p = self.transform.transform_point3(local.corner(i));
            min = min.min(p);
            max = max.max(p);
        }
        Bounds { min, max }
    }

    /// The curve pair currently attached to the node, if any.
    pub fn transfer_function(&self) -> Option<&TransferFunction> {
        self.transfer_function.as_ref()
    }

    pub fn set_transfer_function(&mut self, tf: Option<TransferFunction>) {
        self.transfer_function = tf;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene::ScalarData;

    fn node() -> VolumeNode {
        let volume = ImageVolume::new(
            [2, 4, 8],
            Vec3::new(1.0, 0.5, 0.25),
            Vec3::new(10.0, 0.0, 0.0),
            ScalarData::I16(vec![0; 64]),
        )
        .unwrap();
        VolumeNode::new(volume)
    }

    #[test]
    fn inverse_model_maps_world_to_index() {
        let n = node();
        let inv = n.inverse_model_matrix();
        let far_corner = inv.transform_point3(Vec3::new(12.0, 2.0, 2.0));
        assert!(far_corner.abs_diff_eq(Vec3::new(2.0, 4.0, 8.0), 1e-5));
        let origin = inv.transform_point3(Vec3::new(10.0, 0.0, 0.0));
        assert!(origin.abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn transform_moves_bounds() {
        let mut n = node();
        n.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        let b = n.bounds();
        assert!(b.min.abs_diff_eq(Vec3::new(10.0, 0.0, -5.0), 1e-5));
        assert!(b.max.abs_diff_eq(Vec3::new(12.0, 2.0, -3.0), 1e-5));
    }

    #[test]
    fn transfer_function_property_is_optional() {
        let mut n = node();
        assert!(n.transfer_function().is_none());
        n.set_transfer_function(Some(TransferFunction::default()));
        assert!(n.transfer_function().is_some());
    }
}
