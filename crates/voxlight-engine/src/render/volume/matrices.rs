use glam::Mat4;

use crate::render::Viewport;
use crate::scene::Camera;

/// World-to-eye transform of the active camera.
pub fn view_matrix(camera: &Camera) -> Mat4 {
    camera.view_matrix()
}

/// Projection for the bounding pass.
///
/// The camera is asked for a projection whose depth spans its clip distances,
/// which scales the z row by `(far - near) / 2` and shifts it. The two
/// z-row terms are then rescaled back so the shaders see the standard
/// `[-1, 1]` depth mapping.
pub fn projection_matrix(camera: &Camera, viewport: Viewport) -> Mat4 {
    let (near, far) = camera.clipping_range();
    let projection = camera.projection_transform(viewport.aspect(), near, far);
    fix_depth_range(projection, near, far)
}

/// Rescales `[2][2]` and `[3][2]` (column-major) by the clip span.
pub fn fix_depth_range(mut m: Mat4, near: f32, far: f32) -> Mat4 {
    let div = far - near;
    m.z_axis.z /= div;
    m.w_axis.z = (2.0 * m.w_axis.z) / div;
    m
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;

    fn camera(near: f32, far: f32) -> Camera {
        let mut cam = Camera::new();
        cam.set_position(Vec3::new(0.0, 0.0, 50.0));
        cam.set_clipping_range(near, far);
        cam
    }

    #[test]
    fn fixed_projection_is_standard_gl() {
        let cam = camera(2.0, 80.0);
        let viewport = Viewport::new(800, 600);
        let expected = Mat4::perspective_rh_gl(30f32.to_radians(), 800.0 / 600.0, 2.0, 80.0);
        assert!(projection_matrix(&cam, viewport).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn clip_planes_land_on_ndc_edges() {
        let cam = camera(1.0, 100.0);
        let p = projection_matrix(&cam, Viewport::new(512, 512));
        let near = p * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn fix_leaves_other_entries_alone() {
        let m = Mat4::from_cols_array(&[
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        ]);
        let fixed = fix_depth_range(m, 1.0, 3.0);
        let a = fixed.to_cols_array();
        assert_eq!(a[10], 11.0 / 2.0);
        assert_eq!(a[14], 15.0);
        for i in (0..16).filter(|i| *i != 10 && *i != 14) {
            assert_eq!(a[i], m.to_cols_array()[i]);
        }
    }

    #[test]
    fn view_looks_down_negative_z() {
        let cam = camera(1.0, 100.0);
        let eye = view_matrix(&cam).transform_point3(Vec3::ZERO);
        assert!(eye.abs_diff_eq(Vec3::new(0.0, 0.0, -50.0), 1e-5));
    }
}
